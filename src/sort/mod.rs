use std::cmp::Ordering;

use crate::record::SchoolRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Region,
    Address,
    EducationLevel,
}

impl SortKey {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "name" => Some(Self::Name),
            "region" => Some(Self::Region),
            "address" => Some(Self::Address),
            "education_level" | "education-level" => Some(Self::EducationLevel),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Region => "region",
            Self::Address => "address",
            Self::EducationLevel => "education_level",
        }
    }

    fn field(self, record: &SchoolRecord) -> &str {
        match self {
            Self::Name => &record.name,
            Self::Region => &record.region,
            Self::Address => &record.address,
            Self::EducationLevel => &record.education_level,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Tri-state direction cycle for a column header click: a new column
/// starts ascending; the same column cycles asc -> desc -> cleared -> asc.
pub fn next_direction(
    current_column: Option<SortKey>,
    clicked: SortKey,
    current: Option<SortDirection>,
) -> Option<SortDirection> {
    if current_column != Some(clicked) {
        return Some(SortDirection::Asc);
    }
    match current {
        Some(SortDirection::Asc) => Some(SortDirection::Desc),
        Some(SortDirection::Desc) => None,
        None => Some(SortDirection::Asc),
    }
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

// Primary collation weight: ё shares е's slot, everything else keeps its
// case-folded code point order (which matches the Russian alphabet).
fn primary(c: char) -> char {
    let c = fold(c);
    if c == 'ё' {
        'е'
    } else {
        c
    }
}

/// Russian-collation-aware comparison: primary pass folds case and treats
/// ё as е; ties fall back to the case-folded form (placing е before ё),
/// then to the raw strings.
pub fn compare_ru(a: &str, b: &str) -> Ordering {
    a.chars()
        .map(primary)
        .cmp(b.chars().map(primary))
        .then_with(|| a.chars().map(fold).cmp(b.chars().map(fold)))
        .then_with(|| a.cmp(b))
}

/// Stable-sorts a copy of `records` by `column`; with no column or no
/// direction the input order (server/accumulation order) is preserved.
pub fn sorted_view(
    records: &[SchoolRecord],
    column: Option<SortKey>,
    direction: Option<SortDirection>,
) -> Vec<SchoolRecord> {
    let mut out = records.to_vec();
    let (Some(column), Some(direction)) = (column, direction) else {
        return out;
    };
    out.sort_by(|a, b| {
        let ord = compare_ru(column.field(a), column.field(b));
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    out
}
