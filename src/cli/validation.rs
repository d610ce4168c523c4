use crate::cli::args::CliArgs;
use crate::filter::StatusFilter;
use crate::sort::{SortDirection, SortKey};

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(page) = args.page {
        if page == 0 {
            return Err("invalid --page, expected 1-100".to_string());
        }
    }
    if let Some(page_size) = args.page_size {
        if page_size == 0 {
            return Err("invalid --page-size, expected positive integer".to_string());
        }
    }
    if let Some(scan_pages) = args.scan_pages {
        if scan_pages == 0 {
            return Err("invalid --scan-pages, expected positive integer".to_string());
        }
    }
    if let Some(local_page) = args.local_page {
        if local_page == 0 {
            return Err("invalid --local-page, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.status.as_deref() {
        StatusFilter::parse(raw)
            .ok_or_else(|| format!("invalid --status '{raw}', expected all, active or inactive"))?;
    }
    if let Some(raw) = args.sort.as_deref() {
        SortKey::parse(raw).ok_or_else(|| {
            format!("invalid --sort '{raw}', expected name, region, address or education_level")
        })?;
    }
    if let Some(raw) = args.order.as_deref() {
        SortDirection::parse(raw)
            .ok_or_else(|| format!("invalid --order '{raw}', expected asc or desc"))?;
        if args.sort.is_none() {
            return Err("--order requires --sort".to_string());
        }
    }
    Ok(())
}
