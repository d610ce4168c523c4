use std::process::exit;

fn main() {
    if let Err(e) = schooldb::app::run_cli() {
        eprintln!("{e}");
        exit(1);
    }
}
