pub mod context;
pub mod question;
pub mod topic;
