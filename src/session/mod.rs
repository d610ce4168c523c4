mod debounce;

pub use debounce::{Debounce, SEARCH_DEBOUNCE};

use crate::api::{ApiError, RecordSource, Region, SchoolsPage};
use crate::filter::{self, StatusFilter};
use crate::output;
use crate::paging::{self, RecordRange};
use crate::record::{self, SchoolRecord};
use crate::selection::SelectionSet;
use crate::sort::{self, SortDirection, SortKey};

/// The registry caps pagination at 100 pages regardless of what
/// `pages_count` claims.
pub const MAX_SERVER_PAGES: u32 = 100;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Parameters of the most recent fetch, kept so a retry re-issues exactly
/// the same request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchParams {
    pub page: u32,
    pub count: u32,
    pub region_id: Option<String>,
    pub append: bool,
}

/// One table session: fetch coordination, the two record buffers, the
/// client-side view state and the selection overlay. Created once per UI
/// session and mutated only through the handlers below; never persisted.
pub struct Session<S> {
    source: S,

    page_buffer: Vec<SchoolRecord>,
    search_buffer: Vec<SchoolRecord>,
    regions: Vec<Region>,

    loading: bool,
    error: Option<String>,
    error_page: u32,

    total_server_pages: u32,
    current_server_page: u32,
    current_region: Option<String>,

    page_size: u32,
    status_filter: StatusFilter,
    search_text: String,
    sort_by: Option<SortKey>,
    sort_direction: Option<SortDirection>,
    local_page: u32,

    selection: SelectionSet,
    last_fetch: Option<FetchParams>,
    debounce: Debounce,
    search_epoch: u64,
}

impl<S> Session<S> {
    pub fn new(source: S, page_size: u32) -> Self {
        Self {
            source,
            page_buffer: Vec::new(),
            search_buffer: Vec::new(),
            regions: Vec::new(),
            loading: false,
            error: None,
            error_page: 1,
            total_server_pages: 1,
            current_server_page: 1,
            current_region: None,
            page_size: page_size.max(1),
            status_filter: StatusFilter::All,
            search_text: String::new(),
            sort_by: None,
            sort_direction: None,
            local_page: 1,
            selection: SelectionSet::new(),
            last_fetch: None,
            debounce: Debounce::default(),
            search_epoch: 0,
        }
    }

    // ---- read accessors -------------------------------------------------

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn error_page(&self) -> u32 {
        self.error_page
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn page_buffer(&self) -> &[SchoolRecord] {
        &self.page_buffer
    }

    pub fn search_buffer(&self) -> &[SchoolRecord] {
        &self.search_buffer
    }

    pub fn current_server_page(&self) -> u32 {
        self.current_server_page
    }

    pub fn total_server_pages(&self) -> u32 {
        self.total_server_pages
    }

    pub fn current_region(&self) -> Option<&str> {
        self.current_region.as_deref()
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn status_filter(&self) -> StatusFilter {
        self.status_filter
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn sort(&self) -> (Option<SortKey>, Option<SortDirection>) {
        (self.sort_by, self.sort_direction)
    }

    pub fn local_page(&self) -> u32 {
        self.local_page
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn last_fetch(&self) -> Option<&FetchParams> {
        self.last_fetch.as_ref()
    }

    /// How many times a debounced search has been applied; diagnostics.
    pub fn search_epoch(&self) -> u64 {
        self.search_epoch
    }

    pub fn is_local_mode(&self) -> bool {
        paging::is_local_mode(&self.search_text, self.status_filter)
    }

    pub fn filtered_view(&self) -> Vec<SchoolRecord> {
        filter::filtered_view(
            &self.page_buffer,
            &self.search_buffer,
            &self.search_text,
            self.status_filter,
        )
    }

    /// Records for the current display page: filter, then sort, then
    /// slice. Both modes slice by the local page (in server mode the local
    /// page is pinned to 1, so the slice is the whole server page).
    pub fn displayed_records(&self) -> Vec<SchoolRecord> {
        let sorted = sort::sorted_view(&self.filtered_view(), self.sort_by, self.sort_direction);
        paging::page_slice(&sorted, self.local_page, self.page_size)
    }

    pub fn total_pages(&self) -> u32 {
        if self.is_local_mode() {
            paging::local_total_pages(self.filtered_view().len(), self.page_size)
        } else {
            self.total_server_pages
        }
    }

    pub fn current_display_page(&self) -> u32 {
        if self.is_local_mode() {
            self.local_page
        } else {
            self.current_server_page
        }
    }

    pub fn record_range(&self) -> RecordRange {
        let total = if self.is_local_mode() {
            self.filtered_view().len()
        } else {
            self.page_buffer.len()
        };
        paging::record_range(self.current_display_page(), self.page_size, total)
    }

    pub fn is_indeterminate(&self) -> bool {
        self.selection.is_indeterminate(&self.displayed_records())
    }

    pub fn is_all_selected(&self) -> bool {
        self.selection.is_all_selected(&self.displayed_records())
    }

    // ---- selection ------------------------------------------------------

    pub fn select_one(&mut self, id: &str, checked: bool) {
        self.selection.select_one(id, checked);
    }

    pub fn select_all(&mut self, checked: bool) {
        let displayed = self.displayed_records();
        self.selection.select_all(&displayed, checked);
    }

    /// Text export of the selected records; ids are resolved against the
    /// page buffer, so selections parked on other pages are not written.
    /// `None` when nothing is selected (caller shows a notice instead of
    /// writing a file).
    pub fn export_txt(&self) -> Option<String> {
        output::render_txt(&self.page_buffer, &self.selection)
    }

    // ---- sort and search ------------------------------------------------

    /// Column-header click: tri-state cycle on the same column, ascending
    /// on a new one.
    pub fn sort_toggle(&mut self, column: SortKey) {
        self.sort_direction = sort::next_direction(self.sort_by, column, self.sort_direction);
        self.sort_by = Some(column);
    }

    pub fn set_sort(&mut self, column: Option<SortKey>, direction: Option<SortDirection>) {
        self.sort_by = column;
        self.sort_direction = direction;
    }

    /// Keystroke handler: updates the text and restarts the quiet period.
    /// The filtered view reflects the new text immediately; the page reset
    /// waits for [`Session::settle_search`].
    pub fn search_input(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
        self.debounce.restart();
    }

    /// Waits out the debounce and applies the pending search (local page
    /// back to 1). Returns false when no search was pending.
    pub async fn settle_search(&mut self) -> bool {
        if self.debounce.settle().await {
            self.local_page = 1;
            self.search_epoch += 1;
            true
        } else {
            false
        }
    }

    pub fn clear_search(&mut self) {
        self.debounce.cancel();
        self.search_text.clear();
        self.local_page = 1;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

impl<S: RecordSource> Session<S> {
    /// Initial load: page 1 and the region list are fetched concurrently
    /// and the session is ready only when both have completed. A failed
    /// region fetch degrades to an empty region list; the table itself
    /// still renders.
    pub async fn init(&mut self) {
        self.loading = true;
        self.error = None;
        self.last_fetch = Some(FetchParams {
            page: 1,
            count: self.page_size,
            region_id: None,
            append: false,
        });

        let page_fut = self.source.fetch_page(1, self.page_size, None, None);
        let regions_fut = self.source.fetch_regions();
        let (page_result, regions_result) = tokio::join!(page_fut, regions_fut);

        self.apply_page_result(1, false, page_result);
        self.regions = regions_result.unwrap_or_default();
        self.loading = false;
    }

    /// Fetch coordinator. The requested page is clamped to [1,100]; the
    /// buffers follow the append/page-1 rule; `loading` ends false on
    /// every path and no error escapes (callers observe `error()`).
    pub async fn fetch(
        &mut self,
        page: u32,
        count: u32,
        region_id: Option<String>,
        append: bool,
    ) {
        if !append && page == 1 {
            self.page_buffer.clear();
        }
        self.loading = true;
        self.error = None;
        self.current_region = region_id.clone();
        self.last_fetch = Some(FetchParams {
            page,
            count,
            region_id: region_id.clone(),
            append,
        });

        let safe_page = page.clamp(1, MAX_SERVER_PAGES);
        // The status filter stays client-side; the request never carries it.
        let result = self
            .source
            .fetch_page(safe_page, count, region_id.as_deref(), None)
            .await;
        self.apply_page_result(page, append, result);
        self.loading = false;
    }

    fn apply_page_result(
        &mut self,
        requested_page: u32,
        append: bool,
        result: Result<SchoolsPage, ApiError>,
    ) {
        match result {
            Ok(response) => {
                let new_records = record::normalize(response.list);
                if append {
                    self.search_buffer.extend(new_records.iter().cloned());
                    self.page_buffer.extend(new_records);
                } else if requested_page == 1 {
                    // Fresh query: the accumulation restarts from this page.
                    self.search_buffer = new_records.clone();
                    self.page_buffer = new_records;
                } else {
                    // Forward navigation keeps the search history growing
                    // without duplicating page 1.
                    self.search_buffer.extend(new_records.iter().cloned());
                    self.page_buffer = new_records;
                }
                self.total_server_pages =
                    response.pages_count.max(1).min(MAX_SERVER_PAGES);
                self.current_server_page = requested_page.clamp(1, MAX_SERVER_PAGES);
            }
            Err(_) => {
                self.error = Some(format!(
                    "Страница {requested_page} временно недоступна. Попробуйте другую страницу."
                ));
                // Stale search data beats an empty search set, so only the
                // page buffer is dropped, and only for a fresh page-1 query.
                if !append && requested_page == 1 {
                    self.page_buffer.clear();
                }
            }
        }
    }

    /// Page navigation. Out-of-range pages are rejected silently. In local
    /// mode this is a pure slice move; in server mode it re-fetches.
    pub async fn page_change(&mut self, page: u32) {
        if page < 1 || page > self.total_pages() {
            return;
        }
        self.error_page = page;
        self.error = None;
        if self.is_local_mode() {
            self.local_page = page;
        } else {
            self.fetch(page, self.page_size, self.current_region.clone(), false)
                .await;
        }
    }

    /// Page-size changes always restart from page 1 through the network:
    /// the server-side page size determines the buffer contents.
    pub async fn page_size_change(&mut self, new_size: u32) {
        if new_size == 0 {
            return;
        }
        self.page_size = new_size;
        self.local_page = 1;
        self.fetch(1, new_size, self.current_region.clone(), false).await;
    }

    /// A new region invalidates any in-progress search and restarts both
    /// paginations from page 1. An empty id means "all regions".
    pub async fn region_change(&mut self, region_id: Option<String>) {
        let region_id = region_id.filter(|id| !id.is_empty());
        self.current_server_page = 1;
        self.local_page = 1;
        self.search_text.clear();
        self.debounce.cancel();
        self.fetch(1, self.page_size, region_id, false).await;
    }

    /// Status switches are client-side (local page back to 1); only the
    /// switch back to "all" re-synchronizes with server pagination.
    pub async fn status_change(&mut self, new_status: StatusFilter) {
        let old_status = self.status_filter;
        self.status_filter = new_status;
        self.local_page = 1;
        if new_status == StatusFilter::All && old_status != StatusFilter::All {
            self.current_server_page = 1;
            self.fetch(1, self.page_size, self.current_region.clone(), false)
                .await;
        }
    }

    /// Manual recovery: re-issues the last fetch with identical
    /// parameters. No automatic retry, no backoff.
    pub async fn retry(&mut self) {
        self.error = None;
        if let Some(params) = self.last_fetch.clone() {
            self.fetch(params.page, params.count, params.region_id, params.append)
                .await;
        }
    }

    /// Manual recovery: back to page 1 with the current region.
    pub async fn first_page(&mut self) {
        self.error = None;
        self.fetch(1, self.page_size, self.current_region.clone(), false)
            .await;
    }
}
