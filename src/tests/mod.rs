use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::time::{advance, Duration};

use crate::api::{ApiError, FederalDistrict, RecordSource, Region, SchoolsPage};
use crate::filter::StatusFilter;
use crate::record::{EduOrg, Named, RawSchool, Supplement, STATUS_ACTIVE};
use crate::session::{Session, MAX_SERVER_PAGES};
use crate::sort::{SortDirection, SortKey};

#[derive(Clone, Debug, PartialEq, Eq)]
struct FetchCall {
    page: u32,
    count: u32,
    region: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Default)]
struct FakeState {
    pages: Vec<Vec<RawSchool>>,
    pages_count: u32,
    fail_pages: HashSet<u32>,
    fail_regions: bool,
    regions: Vec<Region>,
    calls: Vec<FetchCall>,
}

/// In-memory record source; clones share state so tests can inspect the
/// call log and inject failures while the session owns the source.
#[derive(Clone, Default)]
struct FakeSource {
    state: Arc<Mutex<FakeState>>,
}

impl FakeSource {
    fn with_pages(pages: Vec<Vec<RawSchool>>, pages_count: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                pages,
                pages_count,
                ..FakeState::default()
            })),
        }
    }

    fn set_regions(&self, regions: Vec<Region>) {
        self.state.lock().unwrap().regions = regions;
    }

    fn set_fail_regions(&self) {
        self.state.lock().unwrap().fail_regions = true;
    }

    fn set_fail_page(&self, page: u32) {
        self.state.lock().unwrap().fail_pages.insert(page);
    }

    fn clear_failures(&self) {
        self.state.lock().unwrap().fail_pages.clear();
    }

    fn calls(&self) -> Vec<FetchCall> {
        self.state.lock().unwrap().calls.clone()
    }

    fn last_call(&self) -> FetchCall {
        self.calls().last().cloned().expect("no fetch was issued")
    }
}

impl RecordSource for FakeSource {
    async fn fetch_page(
        &self,
        page: u32,
        count: u32,
        region_id: Option<&str>,
        status: Option<&str>,
    ) -> Result<SchoolsPage, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(FetchCall {
            page,
            count,
            region: region_id.map(str::to_string),
            status: status.map(str::to_string),
        });
        if state.fail_pages.contains(&page) {
            return Err(ApiError::Api {
                message: "временный сбой".to_string(),
            });
        }
        let list = state
            .pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default();
        Ok(SchoolsPage {
            list,
            pages_count: state.pages_count,
        })
    }

    async fn fetch_regions(&self) -> Result<Vec<Region>, ApiError> {
        let state = self.state.lock().unwrap();
        if state.fail_regions {
            return Err(ApiError::Http { status: 500 });
        }
        Ok(state.regions.clone())
    }

    async fn fetch_federal_districts(&self) -> Result<Vec<FederalDistrict>, ApiError> {
        Ok(Vec::new())
    }
}

fn raw(uuid: &str, name: &str, status: &str) -> RawSchool {
    RawSchool {
        uuid: uuid.to_string(),
        edu_org: Some(EduOrg {
            full_name: Some(name.to_string()),
            region: Some(Named {
                name: Some("Москва".to_string()),
            }),
            contact_info: None,
        }),
        supplements: Some(vec![Supplement {
            status: Some(Named {
                name: Some(status.to_string()),
            }),
            educational_programs: None,
        }]),
    }
}

fn numbered_page(from: u32, to: u32, status: &str) -> Vec<RawSchool> {
    (from..=to)
        .map(|i| raw(&format!("u-{i}"), &format!("Школа №{i}"), status))
        .collect()
}

fn region(id: u64, name: &str) -> Region {
    Region {
        id,
        name: name.to_string(),
    }
}

async fn started_session(source: &FakeSource, page_size: u32) -> Session<FakeSource> {
    let mut session = Session::new(source.clone(), page_size);
    session.init().await;
    session
}

#[tokio::test]
async fn init_fetches_first_page_and_regions_together() {
    let source = FakeSource::with_pages(vec![numbered_page(1, 3, STATUS_ACTIVE)], 4);
    source.set_regions(vec![region(77, "Москва"), region(78, "Санкт-Петербург")]);

    let session = started_session(&source, 10).await;

    assert!(!session.loading());
    assert!(session.error().is_none());
    assert_eq!(session.page_buffer().len(), 3);
    assert_eq!(session.search_buffer().len(), 3);
    assert_eq!(session.regions().len(), 2);
    assert_eq!(session.total_server_pages(), 4);
    assert_eq!(session.current_server_page(), 1);
    assert_eq!(
        source.calls(),
        vec![FetchCall {
            page: 1,
            count: 10,
            region: None,
            status: None,
        }]
    );
}

#[tokio::test]
async fn init_degrades_gracefully_when_regions_fail() {
    let source = FakeSource::with_pages(vec![numbered_page(1, 2, STATUS_ACTIVE)], 1);
    source.set_fail_regions();

    let session = started_session(&source, 10).await;

    assert!(session.error().is_none());
    assert!(session.regions().is_empty());
    assert_eq!(session.page_buffer().len(), 2);
}

#[tokio::test]
async fn fetch_clamps_the_requested_page_to_the_cap() {
    let source = FakeSource::with_pages(vec![numbered_page(1, 2, STATUS_ACTIVE)], 150);
    let mut session = started_session(&source, 10).await;

    session.fetch(150, 10, None, false).await;

    assert_eq!(source.last_call().page, MAX_SERVER_PAGES);
    assert_eq!(session.current_server_page(), MAX_SERVER_PAGES);
    // the server's inflated pages_count is clamped as well
    assert_eq!(session.total_server_pages(), MAX_SERVER_PAGES);
}

#[tokio::test]
async fn forward_navigation_replaces_page_buffer_and_grows_search_buffer() {
    let source = FakeSource::with_pages(
        vec![
            numbered_page(1, 2, STATUS_ACTIVE),
            numbered_page(3, 4, STATUS_ACTIVE),
        ],
        2,
    );
    let mut session = started_session(&source, 10).await;

    session.fetch(2, 10, None, false).await;
    assert_eq!(session.page_buffer().len(), 2);
    assert_eq!(session.page_buffer()[0].uuid, "u-3");
    assert_eq!(session.search_buffer().len(), 4);

    // a fresh page-1 query discards the accumulation instead of duplicating it
    session.fetch(1, 10, None, false).await;
    assert_eq!(session.page_buffer().len(), 2);
    assert_eq!(session.search_buffer().len(), 2);
    assert_eq!(session.search_buffer()[0].uuid, "u-1");
}

#[tokio::test]
async fn append_fetch_extends_both_buffers() {
    let source = FakeSource::with_pages(
        vec![
            numbered_page(1, 2, STATUS_ACTIVE),
            numbered_page(3, 4, STATUS_ACTIVE),
        ],
        2,
    );
    let mut session = started_session(&source, 10).await;

    session.fetch(2, 10, None, true).await;

    assert_eq!(session.page_buffer().len(), 4);
    assert_eq!(session.search_buffer().len(), 4);
}

#[tokio::test]
async fn failed_page_one_fetch_clears_page_buffer_but_keeps_search_buffer() {
    let source = FakeSource::with_pages(
        vec![
            numbered_page(1, 2, STATUS_ACTIVE),
            numbered_page(3, 4, STATUS_ACTIVE),
        ],
        2,
    );
    let mut session = started_session(&source, 10).await;
    session.fetch(2, 10, None, false).await;
    assert_eq!(session.search_buffer().len(), 4);

    source.set_fail_page(1);
    session.fetch(1, 10, None, false).await;

    assert!(!session.loading());
    assert_eq!(session.error(), Some("Страница 1 временно недоступна. Попробуйте другую страницу."));
    assert!(session.page_buffer().is_empty());
    assert_eq!(session.search_buffer().len(), 4);
}

#[tokio::test]
async fn failed_later_page_keeps_the_current_page_buffer() {
    let source = FakeSource::with_pages(vec![numbered_page(1, 2, STATUS_ACTIVE)], 5);
    let mut session = started_session(&source, 10).await;

    source.set_fail_page(3);
    session.fetch(3, 10, None, false).await;

    assert!(session.error().unwrap().contains("Страница 3"));
    assert_eq!(session.page_buffer().len(), 2);
    // the failed navigation does not move the server page
    assert_eq!(session.current_server_page(), 1);
}

#[tokio::test]
async fn retry_reissues_the_exact_last_parameters() {
    let source = FakeSource::with_pages(vec![numbered_page(1, 2, STATUS_ACTIVE)], 5);
    let mut session = started_session(&source, 10).await;

    source.set_fail_page(4);
    session.page_change(4).await;
    assert!(session.error().is_some());

    source.clear_failures();
    session.retry().await;

    assert!(session.error().is_none());
    let calls = source.calls();
    let failed = &calls[calls.len() - 2];
    let retried = &calls[calls.len() - 1];
    assert_eq!(failed, retried);
    assert_eq!(retried.page, 4);
}

#[tokio::test]
async fn server_mode_total_pages_come_from_the_server() {
    // an oversized server page: 25 records at page size 10
    let source = FakeSource::with_pages(vec![numbered_page(1, 25, STATUS_ACTIVE)], 7);
    let session = started_session(&source, 10).await;

    assert!(!session.is_local_mode());
    assert_eq!(session.total_pages(), 7);
    assert_eq!(session.displayed_records().len(), 10);
    let range = session.record_range();
    assert_eq!((range.start, range.end, range.total), (1, 10, 25));
}

#[tokio::test]
async fn status_filter_with_no_matches_yields_empty_view_and_zero_pages() {
    let source = FakeSource::with_pages(vec![numbered_page(1, 5, STATUS_ACTIVE)], 1);
    let mut session = started_session(&source, 10).await;
    let calls_before = source.calls().len();

    session.status_change(StatusFilter::Inactive).await;

    assert!(session.is_local_mode());
    assert!(session.displayed_records().is_empty());
    assert_eq!(session.total_pages(), 0);
    let range = session.record_range();
    assert_eq!((range.start, range.end, range.total), (0, 0, 0));
    // switching into a non-"all" status never touches the network
    assert_eq!(source.calls().len(), calls_before);
}

#[tokio::test]
async fn switching_back_to_all_statuses_refetches_page_one() {
    let source = FakeSource::with_pages(vec![numbered_page(1, 5, STATUS_ACTIVE)], 3);
    let mut session = started_session(&source, 10).await;
    session.fetch(2, 10, None, false).await;

    session.status_change(StatusFilter::Active).await;
    let calls_before = source.calls().len();

    session.status_change(StatusFilter::All).await;

    assert_eq!(source.calls().len(), calls_before + 1);
    assert_eq!(source.last_call().page, 1);
    assert_eq!(session.local_page(), 1);
    assert_eq!(session.current_server_page(), 1);
}

#[tokio::test]
async fn page_size_change_always_refetches_page_one_at_the_new_size() {
    let source = FakeSource::with_pages(vec![numbered_page(1, 5, STATUS_ACTIVE)], 3);
    let mut session = started_session(&source, 10).await;
    session.search_input("Школа");
    session.settle_search().await;

    session.page_size_change(25).await;

    let call = source.last_call();
    assert_eq!((call.page, call.count), (1, 25));
    assert_eq!(session.page_size(), 25);
    assert_eq!(session.local_page(), 1);
}

#[tokio::test]
async fn local_page_change_slices_without_network() {
    let source = FakeSource::with_pages(vec![numbered_page(1, 15, STATUS_ACTIVE)], 1);
    let mut session = started_session(&source, 10).await;
    session.search_input("Школа");
    session.settle_search().await;
    let calls_before = source.calls().len();

    session.page_change(2).await;

    assert_eq!(source.calls().len(), calls_before);
    assert_eq!(session.current_display_page(), 2);
    let displayed = session.displayed_records();
    assert_eq!(displayed.len(), 5);
    assert_eq!(displayed[0].uuid, "u-11");
}

#[tokio::test]
async fn out_of_range_pages_are_rejected_silently() {
    let source = FakeSource::with_pages(vec![numbered_page(1, 15, STATUS_ACTIVE)], 3);
    let mut session = started_session(&source, 10).await;
    let calls_before = source.calls().len();

    session.page_change(0).await;
    session.page_change(4).await;
    assert_eq!(source.calls().len(), calls_before);
    assert_eq!(session.current_display_page(), 1);

    // local mode has its own, tighter bound
    session.search_input("Школа");
    session.settle_search().await;
    session.page_change(3).await;
    assert_eq!(session.current_display_page(), 1);
    assert_eq!(source.calls().len(), calls_before);
}

#[tokio::test]
async fn server_page_change_goes_through_the_network() {
    let source = FakeSource::with_pages(
        vec![
            numbered_page(1, 10, STATUS_ACTIVE),
            numbered_page(11, 20, STATUS_ACTIVE),
        ],
        2,
    );
    let mut session = started_session(&source, 10).await;

    session.page_change(2).await;

    assert_eq!(source.last_call().page, 2);
    assert_eq!(session.current_display_page(), 2);
    assert_eq!(session.displayed_records()[0].uuid, "u-11");
}

#[tokio::test(start_paused = true)]
async fn search_is_debounced_to_one_apply_per_quiet_period() {
    let source = FakeSource::with_pages(vec![numbered_page(1, 15, STATUS_ACTIVE)], 1);
    let mut session = started_session(&source, 10).await;
    session.search_input("Школа");
    session.settle_search().await;
    session.page_change(2).await;
    assert_eq!(session.local_page(), 2);

    // five keystrokes inside one quiet period
    for prefix in ["Ш", "Шк", "Шко", "Школ", "Школа №1"] {
        session.search_input(prefix);
        advance(Duration::from_millis(50)).await;
    }
    assert_eq!(session.search_epoch(), 1);
    assert_eq!(session.local_page(), 2);

    assert!(session.settle_search().await);
    assert_eq!(session.search_epoch(), 2);
    assert_eq!(session.local_page(), 1);

    // nothing pending once the period was consumed
    assert!(!session.settle_search().await);
    assert_eq!(session.search_epoch(), 2);
}

#[tokio::test]
async fn search_spans_every_fetched_page() {
    let source = FakeSource::with_pages(
        vec![
            vec![
                raw("a", "Школа №1", STATUS_ACTIVE),
                raw("b", "Лицей №1", STATUS_ACTIVE),
            ],
            vec![raw("c", "Лицей №2", STATUS_ACTIVE)],
        ],
        2,
    );
    let mut session = started_session(&source, 10).await;
    session.fetch(2, 10, None, false).await;

    session.search_input("лицей");
    session.settle_search().await;

    let found = session.filtered_view();
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|r| r.name.contains("Лицей")));
}

#[tokio::test]
async fn region_change_resets_pages_and_clears_search() {
    let source = FakeSource::with_pages(vec![numbered_page(1, 15, STATUS_ACTIVE)], 4);
    let mut session = started_session(&source, 10).await;
    session.fetch(2, 10, None, false).await;
    session.search_input("Школа");
    session.settle_search().await;
    session.page_change(2).await;

    session.region_change(Some("77".to_string())).await;

    assert_eq!(session.search_text(), "");
    assert_eq!(session.local_page(), 1);
    assert_eq!(session.current_server_page(), 1);
    assert_eq!(session.current_region(), Some("77"));
    let call = source.last_call();
    assert_eq!(call.page, 1);
    assert_eq!(call.region.as_deref(), Some("77"));
    // the status parameter is never forwarded
    assert_eq!(call.status, None);
}

#[tokio::test]
async fn empty_region_id_means_all_regions() {
    let source = FakeSource::with_pages(vec![numbered_page(1, 5, STATUS_ACTIVE)], 1);
    let mut session = started_session(&source, 10).await;

    session.region_change(Some(String::new())).await;

    assert_eq!(session.current_region(), None);
    assert_eq!(source.last_call().region, None);
}

#[tokio::test]
async fn selection_survives_refetch_and_filtering() {
    let source = FakeSource::with_pages(
        vec![
            numbered_page(1, 10, STATUS_ACTIVE),
            numbered_page(11, 20, STATUS_ACTIVE),
        ],
        2,
    );
    let mut session = started_session(&source, 10).await;

    session.select_one("u-1", true);
    session.page_change(2).await;
    session.page_change(1).await;
    assert!(session.selection().contains("u-1"));

    session.search_input("Школа №1");
    session.settle_search().await;
    assert!(session.selection().contains("u-1"));
}

#[tokio::test]
async fn select_all_targets_only_the_displayed_page() {
    let source = FakeSource::with_pages(
        vec![
            numbered_page(1, 10, STATUS_ACTIVE),
            numbered_page(11, 20, STATUS_ACTIVE),
        ],
        2,
    );
    let mut session = started_session(&source, 10).await;
    session.select_one("u-15", true);

    session.select_all(true);
    assert_eq!(session.selection().len(), 11);
    assert!(session.is_all_selected());
    assert!(!session.is_indeterminate());

    session.select_all(false);
    assert_eq!(session.selection().len(), 1);
    assert!(session.selection().contains("u-15"));
}

#[tokio::test]
async fn indeterminate_reflects_a_partially_selected_page() {
    let source = FakeSource::with_pages(vec![numbered_page(1, 10, STATUS_ACTIVE)], 1);
    let mut session = started_session(&source, 10).await;

    assert!(!session.is_indeterminate());
    session.select_one("u-1", true);
    assert!(session.is_indeterminate());
    session.select_all(true);
    assert!(!session.is_indeterminate());
}

#[tokio::test]
async fn export_resolves_ids_against_the_page_buffer() {
    let source = FakeSource::with_pages(
        vec![
            numbered_page(1, 2, STATUS_ACTIVE),
            numbered_page(3, 4, STATUS_ACTIVE),
        ],
        2,
    );
    let mut session = started_session(&source, 10).await;
    session.select_one("u-1", true);

    let text = session.export_txt().unwrap();
    assert!(text.contains("Школа №1"));
    assert!(text.ends_with("Всего экспортировано: 1 школ"));

    // after navigating away, the selected record is no longer in the page
    // buffer and the export has nothing to resolve
    session.page_change(2).await;
    assert!(session.export_txt().is_none());
}

#[tokio::test]
async fn sort_toggle_cycles_and_applies_to_the_displayed_page() {
    let source = FakeSource::with_pages(
        vec![vec![
            raw("a", "Школа №7", STATUS_ACTIVE),
            raw("b", "Гимназия №3", STATUS_ACTIVE),
            raw("c", "Лицей №1", STATUS_ACTIVE),
        ]],
        1,
    );
    let mut session = started_session(&source, 10).await;

    session.sort_toggle(SortKey::Name);
    assert_eq!(session.sort(), (Some(SortKey::Name), Some(SortDirection::Asc)));
    assert_eq!(session.displayed_records()[0].name, "Гимназия №3");

    session.sort_toggle(SortKey::Name);
    assert_eq!(session.sort(), (Some(SortKey::Name), Some(SortDirection::Desc)));
    assert_eq!(session.displayed_records()[0].name, "Школа №7");

    session.sort_toggle(SortKey::Name);
    assert_eq!(session.sort(), (Some(SortKey::Name), None));
    // cleared sort falls back to server order
    assert_eq!(session.displayed_records()[0].uuid, "a");

    session.sort_toggle(SortKey::Region);
    assert_eq!(session.sort(), (Some(SortKey::Region), Some(SortDirection::Asc)));
}

#[tokio::test]
async fn clear_search_restores_page_buffer_view() {
    let source = FakeSource::with_pages(vec![numbered_page(1, 15, STATUS_ACTIVE)], 1);
    let mut session = started_session(&source, 10).await;
    session.search_input("№1");
    session.settle_search().await;
    session.page_change(2).await;
    assert!(session.is_local_mode());

    session.clear_search();

    assert!(!session.is_local_mode());
    assert_eq!(session.local_page(), 1);
    assert_eq!(session.displayed_records().len(), 10);
}
