mod cli;
mod logging;
mod materialize;
mod payload;
mod report;
mod runner;
#[cfg(test)]
mod test_support;

use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    let app = cli::parse();
    logging::init(app.verbose);
    runner::run(app)
}
