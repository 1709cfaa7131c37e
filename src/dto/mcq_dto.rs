use crate::models::question::QuestionSet;
use crate::models::topic::TopicSpec;
use crate::services::pagination_service::Page;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Topic rows are checked by the generation pipeline itself, so an empty or
/// malformed batch comes back as an `InvalidInput` failure.
#[derive(Debug, Deserialize)]
pub struct GenerateMcqPayload {
    #[serde(default)]
    pub topics: Vec<TopicSpec>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PageQuestionsPayload {
    pub questions: QuestionSet,
    #[serde(default = "first_page")]
    #[validate(range(min = 1, message = "Page numbers start at 1"))]
    pub page: usize,
    #[validate(range(min = 1, max = 100))]
    pub page_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuestionsPayload {
    pub questions: QuestionSet,
}

/// Body of a successful generation. Borrows the set so ids keep their generated order.
#[derive(Debug, Serialize)]
pub struct GenerateMcqResponse<'a> {
    pub questions: &'a QuestionSet,
    pub total: usize,
    pub page: Page<'a>,
}

fn first_page() -> usize {
    1
}
