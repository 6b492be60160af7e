use anyhow::Result;
use shroud_cli::{build_command, run, CliOptions};
use shroud_core::init_tracing;

fn main() -> Result<()> {
    // Logs go to stderr so the generated source can be piped
    init_tracing();

    let matches = build_command().get_matches();
    run(&CliOptions::from_matches(&matches))
}
