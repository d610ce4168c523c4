use chrono::Local;
use colored::Colorize;

use crate::paging::RecordRange;
use crate::record::SchoolRecord;
use crate::selection::SelectionSet;

const EXPORT_RULE_WIDTH: usize = 50;

/// Plain-text export of the selected records, in buffer order. `None`
/// when the selection is empty; the export never clears the selection.
pub fn render_txt(records: &[SchoolRecord], selection: &SelectionSet) -> Option<String> {
    let selected: Vec<&SchoolRecord> = records
        .iter()
        .filter(|r| selection.contains(&r.uuid))
        .collect();
    if selected.is_empty() {
        return None;
    }

    let mut out = String::from("Экспорт школ\n\n");
    for (index, school) in selected.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", index + 1, school.name));
        out.push_str(&format!("   Регион: {}\n", school.region));
        out.push_str(&format!("   Адрес: {}\n", school.address));
        out.push_str(&format!(
            "   Уровень образования: {}\n",
            school.education_level
        ));
        out.push_str(&format!("   Статус: {}\n", school.status));
        out.push_str(&"─".repeat(EXPORT_RULE_WIDTH));
        out.push('\n');
    }
    out.push_str(&format!("\nВсего экспортировано: {} школ", selected.len()));
    Some(out)
}

pub fn default_export_filename() -> String {
    format!("schools_export_{}.txt", Local::now().format("%Y-%m-%d"))
}

fn clip(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Console table for the displayed page: a selection marker plus the four
/// visible columns.
pub fn render_table(records: &[SchoolRecord], selection: &SelectionSet) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "    {:<40} {:<24} {:<28} {}\n",
        "Название".bold(),
        "Регион".bold(),
        "Уровень образования".bold(),
        "Статус".bold()
    ));
    for record in records {
        let marker = if selection.contains(&record.uuid) {
            "[x]".green().to_string()
        } else {
            "[ ]".to_string()
        };
        out.push_str(&format!(
            "{} {:<40} {:<24} {:<28} {}\n",
            marker,
            clip(&record.name, 40),
            clip(&record.region, 24),
            clip(&record.education_level, 28),
            record.status
        ));
    }
    out
}

pub fn format_record_range(range: RecordRange) -> String {
    format!(
        "Показывать {}-{} из {} записей",
        range.start, range.end, range.total
    )
}
