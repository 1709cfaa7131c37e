use crate::models::question::{QuestionRecord, QuestionSet};
use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: usize = 5;

/// One page of questions. `page` is the page actually shown after clamping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<'a> {
    pub items: Vec<&'a QuestionRecord>,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total: usize,
    /// 1-based position of the first item shown; 0 when there is nothing to show.
    pub from: usize,
    pub to: usize,
}

/// Stateless pagination over the generated questions. Out-of-range pages are
/// clamped into `1..=total_pages`; a zero page size is treated as 1.
pub fn paginate(records: &QuestionSet, page: usize, page_size: usize) -> Page<'_> {
    let page_size = page_size.max(1);
    let total = records.len();
    let total_pages = total.div_ceil(page_size);
    let page = page.clamp(1, total_pages.max(1));

    let start = (page - 1) * page_size;
    let items: Vec<&QuestionRecord> = records.records().skip(start).take(page_size).collect();
    let (from, to) = if items.is_empty() {
        (0, 0)
    } else {
        (start + 1, start + items.len())
    };

    Page {
        items,
        page,
        page_size,
        total_pages,
        total,
        from,
        to,
    }
}
