use crate::filter::StatusFilter;

/// Local mode means "page" refers to a slice of the client-side
/// filtered/sorted view; otherwise it is the server's page.
pub fn is_local_mode(search_text: &str, status: StatusFilter) -> bool {
    !search_text.trim().is_empty() || status != StatusFilter::All
}

/// Slice of `records` for a one-based `page`. Pages past the end come back
/// empty rather than panicking.
pub fn page_slice<T: Clone>(records: &[T], page: u32, page_size: u32) -> Vec<T> {
    let page = page.max(1) as usize;
    let page_size = page_size as usize;
    let start = (page - 1) * page_size;
    if start >= records.len() {
        return Vec::new();
    }
    let end = (start + page_size).min(records.len());
    records[start..end].to_vec()
}

/// Page count of the filtered view; an empty view paginates to zero pages.
pub fn local_total_pages(filtered_len: usize, page_size: u32) -> u32 {
    filtered_len.div_ceil(page_size.max(1) as usize) as u32
}

/// One-based record range shown in the "Показывать X-Y из Z" line,
/// clamped to never exceed the active total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordRange {
    pub start: usize,
    pub end: usize,
    pub total: usize,
}

pub fn record_range(display_page: u32, page_size: u32, total: usize) -> RecordRange {
    let page = display_page.max(1) as usize;
    let page_size = page_size as usize;
    RecordRange {
        start: ((page - 1) * page_size + 1).min(total),
        end: (page * page_size).min(total),
        total,
    }
}
