use std::time::Duration;

use clap::error::ErrorKind;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::api::{SchoolsApi, DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT_SECONDS};
use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::filter::StatusFilter;
use crate::output;
use crate::session::{Session, DEFAULT_PAGE_SIZE};
use crate::sort::{SortDirection, SortKey};

fn print_banner() {
    const BANNER: &str = r#"
      _                 _     _ _
  ___| |__   ___   ___ | | __| | |__
 / __| '_ \ / _ \ / _ \| |/ _` | '_ \
 \__ \ | | | (_) | (_) | | (_| | |_) |
 |___/_| |_|\___/ \___/|_|\__,_|_.__/

      v0.3.2 - school registry browser
    "#;
    println!("{}", BANNER);
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn loading_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Загрузка данных...");
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum ExportTarget {
    DatedDefault,
    Path(String),
}

#[derive(Clone, Debug)]
struct RunConfig {
    api_base_url: String,
    timeout: u64,
    page: u32,
    page_size: u32,
    region: Option<String>,
    scan_pages: u32,
    status: StatusFilter,
    search: Option<String>,
    sort: Option<SortKey>,
    order: Option<SortDirection>,
    local_page: Option<u32>,
    select: Vec<String>,
    select_all: bool,
    export: Option<ExportTarget>,
    list_regions: bool,
    no_color: bool,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);

    let api_base_url = args
        .api
        .or(cfg.api_base_url)
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
    let timeout = args
        .timeout
        .or(cfg.timeout)
        .unwrap_or(DEFAULT_TIMEOUT_SECONDS);

    let page = args.page.unwrap_or(1);
    let page_size = args
        .page_size
        .or(cfg.page_size)
        .unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size == 0 {
        return Err("invalid page_size, expected positive integer".to_string());
    }

    let region = args.region.or(cfg.region).filter(|r| !r.trim().is_empty());
    let scan_pages = args.scan_pages.or(cfg.scan_pages).unwrap_or(1).max(1);

    let status = match args.status.or(cfg.status).as_deref() {
        Some(raw) => StatusFilter::parse(raw)
            .ok_or_else(|| format!("invalid status '{raw}', expected all, active or inactive"))?,
        None => StatusFilter::All,
    };

    let sort = match args.sort.or(cfg.sort).as_deref() {
        Some(raw) => Some(SortKey::parse(raw).ok_or_else(|| {
            format!("invalid sort '{raw}', expected name, region, address or education_level")
        })?),
        None => None,
    };
    let order = match args.order.or(cfg.order).as_deref() {
        Some(raw) => Some(
            SortDirection::parse(raw)
                .ok_or_else(|| format!("invalid order '{raw}', expected asc or desc"))?,
        ),
        // a sort column without an explicit order starts ascending, like
        // the first click on a column header
        None => sort.map(|_| SortDirection::Asc),
    };
    if order.is_some() && sort.is_none() {
        return Err("order requires sort".to_string());
    }

    let select: Vec<String> = args
        .select
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let export = match args.export {
        Some(path) if path.trim().is_empty() => Some(ExportTarget::DatedDefault),
        Some(path) => Some(ExportTarget::Path(config::expand_tilde_string(&path))),
        None => cfg
            .export
            .map(|path| ExportTarget::Path(config::expand_tilde_string(&path))),
    };

    Ok(RunConfig {
        api_base_url,
        timeout,
        page,
        page_size,
        region,
        scan_pages,
        status,
        search: args.search,
        sort,
        order,
        local_page: args.local_page,
        select,
        select_all: args.select_all,
        export,
        list_regions: args.list_regions,
        no_color,
    })
}

fn fetch_failure_message<S>(session: &Session<S>) -> String {
    format!(
        "{}\nПовторите запуск или вернитесь на первую страницу (--page 1).",
        session.error().unwrap_or("Временная проблема")
    )
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    print_banner();

    format_kv_line("Target", &run.api_base_url);
    format_kv_line(
        "Query",
        &format!(
            "page={} size={} region={} scan={}",
            run.page,
            run.page_size,
            run.region.as_deref().unwrap_or("all"),
            run.scan_pages
        ),
    );
    format_kv_line(
        "View",
        &format!(
            "status={} search={} sort={}",
            run.status.as_str(),
            run.search.as_deref().unwrap_or("-"),
            match (run.sort, run.order) {
                (Some(column), Some(direction)) =>
                    format!("{}:{}", column.as_str(), direction.as_str()),
                _ => "-".to_string(),
            }
        ),
    );
    println!();

    let api = SchoolsApi::new(run.api_base_url.clone(), Duration::from_secs(run.timeout))
        .map_err(|e| format!("failed to build http client: {e}"))?;
    let mut session = Session::new(api, run.page_size);

    let spinner = loading_spinner();
    session.init().await;
    spinner.finish_and_clear();
    if session.error().is_some() {
        return Err(fetch_failure_message(&session));
    }

    if run.list_regions {
        if session.regions().is_empty() {
            println!("{}", "Список регионов недоступен".yellow());
            return Ok(());
        }
        for region in session.regions() {
            println!("{:>6}  {}", region.id, region.name);
        }
        return Ok(());
    }

    if run.region.is_some() {
        let spinner = loading_spinner();
        session.region_change(run.region.clone()).await;
        spinner.finish_and_clear();
        if session.error().is_some() {
            return Err(fetch_failure_message(&session));
        }
    }

    // Walk forward through the registry the way a user pages through it;
    // every visited page lands in the accumulation buffer for search.
    if run.scan_pages > 1 {
        let spinner = loading_spinner();
        let last = run.scan_pages.min(session.total_server_pages());
        for page in 2..=last {
            session
                .fetch(page, run.page_size, run.region.clone(), false)
                .await;
            if session.error().is_some() {
                let warning = session.error().unwrap_or_default().to_string();
                spinner.suspend(|| println!(":: {}", warning.yellow()));
                session.clear_error();
                break;
            }
        }
        spinner.finish_and_clear();
    }

    if run.page > 1 && run.page != session.current_server_page() {
        let spinner = loading_spinner();
        session.page_change(run.page).await;
        spinner.finish_and_clear();
        if session.error().is_some() {
            return Err(fetch_failure_message(&session));
        }
    }

    if run.status != StatusFilter::All {
        session.status_change(run.status).await;
    }

    if let Some(search) = run.search.as_deref() {
        session.search_input(search);
        session.settle_search().await;
        format_kv_line(
            "Найдено",
            &format!(
                "{} школ по запросу \"{search}\"",
                session.filtered_view().len()
            ),
        );
    }

    session.set_sort(run.sort, run.order);

    if let Some(local_page) = run.local_page {
        if session.is_local_mode() {
            session.page_change(local_page).await;
        }
    }

    for id in &run.select {
        session.select_one(id, true);
    }
    if run.select_all {
        session.select_all(true);
    }

    let displayed = session.displayed_records();
    format_kv_line(
        "Режим",
        if session.is_local_mode() {
            "локальная фильтрация"
        } else {
            "серверная пагинация"
        },
    );
    format_kv_line(
        "Записи",
        &output::format_record_range(session.record_range()),
    );
    if session.total_pages() > 1 {
        format_kv_line(
            "Страница",
            &format!(
                "{} из {}",
                session.current_display_page(),
                session.total_pages()
            ),
        );
    }
    if !session.selection().is_empty() {
        format_kv_line(
            "Выбрано",
            &format!(
                "{}{}",
                session.selection().len(),
                if session.is_indeterminate() {
                    " (частично на странице)"
                } else {
                    ""
                }
            ),
        );
    }
    println!();
    print!("{}", output::render_table(&displayed, session.selection()));

    if let Some(target) = run.export {
        match session.export_txt() {
            Some(contents) => {
                let path = match target {
                    ExportTarget::DatedDefault => output::default_export_filename(),
                    ExportTarget::Path(path) => path,
                };
                tokio::fs::write(&path, contents)
                    .await
                    .map_err(|e| format!("failed to write export file '{path}': {e}"))?;
                println!();
                format_kv_line(
                    "Экспорт",
                    &format!("{} школ -> {}", session.selection().len(), path.cyan()),
                );
            }
            None => {
                println!();
                println!("{}", "Не выбрано ни одной школы для экспорта".yellow());
            }
        }
    }

    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{e}");
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let cfg = match args.config.as_deref() {
        Some(path) => {
            let path = config::expand_tilde(path);
            config::load_config(&path, false)?
        }
        None => match config::default_config_path() {
            Some(path) => {
                config::ensure_default_config_file(&path)?;
                config::load_config(&path, false)?
            }
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;
    rt.block_on(run_async(run))
}
