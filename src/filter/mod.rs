use crate::record::{SchoolRecord, STATUS_ACTIVE, STATUS_INACTIVE};

/// Client-side status filter. `Active`/`Inactive` match the registry's
/// status labels exactly; a record whose status matches neither label is
/// excluded from both.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl StatusFilter {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "all" => Some(Self::All),
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    fn matches(self, status: &str) -> bool {
        match self {
            Self::All => true,
            Self::Active => status == STATUS_ACTIVE,
            Self::Inactive => status == STATUS_INACTIVE,
        }
    }
}

/// Derives the filtered view. A non-empty (trimmed) search runs over the
/// accumulation buffer so it spans every page fetched so far; otherwise
/// only the current page buffer is considered. Status is applied before
/// the text predicate. Pure: inputs are never mutated.
pub fn filtered_view(
    page_buffer: &[SchoolRecord],
    search_buffer: &[SchoolRecord],
    search_text: &str,
    status: StatusFilter,
) -> Vec<SchoolRecord> {
    let search_term = search_text.trim();
    let source = if search_term.is_empty() {
        page_buffer
    } else {
        search_buffer
    };

    let mut filtered: Vec<SchoolRecord> = source
        .iter()
        .filter(|r| status.matches(&r.status))
        .cloned()
        .collect();

    if !search_term.is_empty() {
        let needle = search_term.to_lowercase();
        filtered.retain(|r| r.name.to_lowercase().contains(&needle));
    }

    filtered
}
