use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "schooldb",
    version,
    about = "paginated school-registry browser",
    long_about = "Schooldb fetches pages of educational institutions from the schooldb registry and runs a table session over them: client-side status filtering, text search across the fetched pages, column sorting, row selection and plain-text export.\n\nExamples:\n  schooldb --page 2 --page-size 25\n  schooldb --scan-pages 5 --search \"Лицей\" --sort name --order asc\n  schooldb --region 77 --status active --select-all --export schools.txt\n\nTip: Use --config to persist connection and view defaults."
)]
pub struct CliArgs {
    #[arg(
        short = 'a',
        long = "api",
        value_name = "URL",
        help_heading = "Connection",
        help = "Base API URL (defaults to the public registry)."
    )]
    pub api: Option<String>,

    #[arg(
        long = "timeout",
        value_name = "SECONDS",
        help_heading = "Connection",
        help = "Request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'C',
        long = "config",
        value_name = "FILE",
        help_heading = "Connection",
        help = "Path to config file (defaults to ~/.schooldb/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'p',
        long = "page",
        value_name = "N",
        help_heading = "Query",
        help = "Server page to fetch (clamped to 1-100)."
    )]
    pub page: Option<u32>,

    #[arg(
        short = 'n',
        long = "page-size",
        value_name = "N",
        help_heading = "Query",
        help = "Records per page."
    )]
    pub page_size: Option<u32>,

    #[arg(
        short = 'r',
        long = "region",
        value_name = "ID",
        help_heading = "Query",
        help = "Region id filter (server-side)."
    )]
    pub region: Option<String>,

    #[arg(
        long = "scan-pages",
        value_name = "N",
        help_heading = "Query",
        help = "Accumulate server pages 1..N so text search spans all of them."
    )]
    pub scan_pages: Option<u32>,

    #[arg(
        short = 's',
        long = "search",
        value_name = "TEXT",
        help_heading = "View",
        help = "Search school names (case-insensitive substring)."
    )]
    pub search: Option<String>,

    #[arg(
        long = "status",
        value_name = "FILTER",
        help_heading = "View",
        help = "Status filter: all, active or inactive (client-side)."
    )]
    pub status: Option<String>,

    #[arg(
        long = "sort",
        value_name = "COLUMN",
        help_heading = "View",
        help = "Sort column: name, region, address or education_level."
    )]
    pub sort: Option<String>,

    #[arg(
        long = "order",
        value_name = "DIR",
        help_heading = "View",
        help = "Sort direction: asc or desc (requires --sort)."
    )]
    pub order: Option<String>,

    #[arg(
        long = "local-page",
        value_name = "N",
        help_heading = "View",
        help = "Page of the filtered view (meaningful with --search/--status)."
    )]
    pub local_page: Option<u32>,

    #[arg(
        long = "select",
        value_name = "UUID,UUID",
        help_heading = "Selection",
        help = "Select specific records by uuid (comma-separated)."
    )]
    pub select: Option<String>,

    #[arg(
        long = "select-all",
        help_heading = "Selection",
        help = "Select every record on the displayed page."
    )]
    pub select_all: bool,

    #[arg(
        short = 'o',
        long = "export",
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = "",
        help_heading = "Output",
        help = "Export the selected records to a text file (dated default name when FILE is omitted)."
    )]
    pub export: Option<String>,

    #[arg(
        long = "list-regions",
        help_heading = "Output",
        help = "Print the region list and exit."
    )]
    pub list_regions: bool,

    #[arg(
        long = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,
}
