use std::process::ExitCode;

use commonplace::error::{Chainable, Result};
use commonplace::{Layout, Report};
use tracing_subscriber::EnvFilter;

mod flags;

fn main() -> ExitCode {
    let flags = flags::Garden::from_env_or_exit();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match run(&flags) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprint!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(flags: &flags::Garden) -> Result<()> {
    let layout = Layout::discover(flags.root())?;
    tracing::debug!(?layout, "resolved site layout");
    if flags.clean {
        if commonplace::clean(&layout)? {
            println!("Cleaned {}", layout.output.display());
        }

        return Ok(());
    }

    let report = commonplace::build(&layout, flags.mode()?, flags.keep_cache)?;
    print_report(&report, flags.json)
}

fn print_report(report: &Report, json: bool) -> Result<()> {
    if json {
        let paths = serde_json::to_string(&report.paths())
            .chain_with(|| commonplace::error!("failed to serialize report"))?;

        println!("{paths}");
    } else {
        for change in report.changes() {
            println!("{change}");
        }
    }

    Ok(())
}
