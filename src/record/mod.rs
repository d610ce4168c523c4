use serde::Deserialize;

// Fixed localized fallbacks used when the registry payload omits a field
// (or carries an empty string, which counts as missing).
pub const NAME_FALLBACK: &str = "Нет названия";
pub const REGION_FALLBACK: &str = "Не указан";
pub const ADDRESS_FALLBACK: &str = "Адрес не указан";
pub const EDU_LEVEL_FALLBACK: &str = "Не указан";
pub const STATUS_FALLBACK: &str = "Неизвестно";

// Status labels as the registry spells them; the status filter matches
// these exactly and excludes everything else.
pub const STATUS_ACTIVE: &str = "Действующее";
pub const STATUS_INACTIVE: &str = "Недействующее";

/// Flat display record produced by [`normalize`]. Identified by `uuid`,
/// immutable once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchoolRecord {
    pub uuid: String,
    pub name: String,
    pub region: String,
    pub address: String,
    pub education_level: String,
    pub status: String,
}

// Raw nested payload as the /schools endpoint returns it. Every level may
// be missing or null.

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Named {
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ContactInfo {
    pub post_address: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct EduOrg {
    pub full_name: Option<String>,
    pub region: Option<Named>,
    pub contact_info: Option<ContactInfo>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct EducationalProgram {
    pub edu_level: Option<Named>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Supplement {
    pub status: Option<Named>,
    pub educational_programs: Option<Vec<EducationalProgram>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawSchool {
    #[serde(default)]
    pub uuid: String,
    pub edu_org: Option<EduOrg>,
    pub supplements: Option<Vec<Supplement>>,
}

fn or_fallback(value: Option<String>, fallback: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => fallback.to_string(),
    }
}

fn normalize_one(raw: RawSchool) -> SchoolRecord {
    let edu_org = raw.edu_org.unwrap_or_default();
    // Only the first supplement (and its first program) feeds the table.
    let supplement = raw
        .supplements
        .unwrap_or_default()
        .into_iter()
        .next()
        .unwrap_or_default();
    let edu_level = supplement
        .educational_programs
        .unwrap_or_default()
        .into_iter()
        .next()
        .unwrap_or_default()
        .edu_level
        .and_then(|n| n.name);

    SchoolRecord {
        uuid: raw.uuid,
        name: or_fallback(edu_org.full_name, NAME_FALLBACK),
        region: or_fallback(edu_org.region.and_then(|n| n.name), REGION_FALLBACK),
        address: or_fallback(
            edu_org.contact_info.and_then(|c| c.post_address),
            ADDRESS_FALLBACK,
        ),
        education_level: or_fallback(edu_level, EDU_LEVEL_FALLBACK),
        status: or_fallback(
            supplement.status.and_then(|n| n.name),
            STATUS_FALLBACK,
        ),
    }
}

/// Maps raw registry payloads into flat display records.
pub fn normalize(raw: Vec<RawSchool>) -> Vec<SchoolRecord> {
    raw.into_iter().map(normalize_one).collect()
}
