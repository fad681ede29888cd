use std::process::ExitCode;

use commonplace::error::Result;
use tracing_subscriber::EnvFilter;

mod flags;
mod heatmap;
mod journal;
mod range;

use heatmap::Heatmap;
use journal::Journal;
use range::Range;

fn main() -> ExitCode {
    let flags = flags::Habits::from_env_or_exit();
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

fn run(flags: &flags::Habits) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let range = Range::resolve(flags.from, flags.to, flags.weeks(), today)?;
    let journal = Journal::open(&flags.vault(), flags.tag())?;
    tracing::debug!(?range, "rendering habits");

    let heatmap = Heatmap::collect(range, |date| journal.day(date));
    print!("{}", heatmap.render(today));
    Ok(())
}
