use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{error, info, warn};

use crate::cli::{Cli, Command};
use crate::materialize::ConfigMaterializer;
use crate::payload::ConfigPayload;
use crate::report::{self, TreeOptions};

pub fn run(cli: Cli) -> Result<ExitCode> {
    let ctx = CliContext::from(&cli);
    let base = ctx.base_dir()?;
    let payload = ConfigPayload::streamlit()?;
    let materializer = ConfigMaterializer::new(&base, payload);

    match cli.command.unwrap_or(Command::Write) {
        Command::Write => handle_write(&ctx, &base, &materializer),
        Command::Show => {
            print!("{}", payload.as_str());
            Ok(ExitCode::SUCCESS)
        }
        Command::Path => {
            println!("{}", materializer.target());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn handle_write(
    ctx: &CliContext,
    base: &Utf8Path,
    materializer: &ConfigMaterializer<'_>,
) -> Result<ExitCode> {
    print!("{}", report::banner());

    match report::detect_python_project(base) {
        Ok(is_python) => println!("{}", report::project_detection(is_python)),
        Err(err) => warn!(error = %err, "could not inspect project directory"),
    }

    if ctx.dry_run {
        print!("{}", report::dry_run(&materializer.preview()));
        return Ok(ExitCode::SUCCESS);
    }

    match materializer.materialize() {
        Ok(done) => {
            if done.size_on_disk != done.bytes_written as u64 {
                warn!(
                    path = %done.path,
                    written = done.bytes_written,
                    on_disk = done.size_on_disk,
                    "file size differs from bytes written"
                );
            }
            print!("{}", report::success(&done));
            if !ctx.no_tree {
                match report::project_tree(base, &TreeOptions::default()) {
                    Ok(tree) => print!("{}", tree),
                    Err(err) => warn!(error = %err, "could not list project structure"),
                }
            }
            print!("{}", report::next_steps(materializer.payload()));
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!(error = %err, path = %err.path(), "config materialization failed");
            print!("{}", report::failure(&err));
            Ok(ExitCode::from(failure_status(ctx.strict)))
        }
    }
}

/// Failures keep a zero exit status unless `--strict` asked otherwise.
fn failure_status(strict: bool) -> u8 {
    if strict { 1 } else { 0 }
}

#[derive(Clone, Debug)]
struct CliContext {
    chdir: Option<PathBuf>,
    dry_run: bool,
    strict: bool,
    no_tree: bool,
}

impl CliContext {
    fn base_dir(&self) -> Result<Utf8PathBuf> {
        let Some(path) = &self.chdir else {
            return Ok(Utf8PathBuf::from("."));
        };
        let path = Utf8PathBuf::from_path_buf(path.clone())
            .map_err(|_| anyhow!("project directory must be valid UTF-8"))?;
        let meta = std::fs::metadata(&path)
            .with_context(|| format!("reading project directory {}", path))?;
        if !meta.is_dir() {
            bail!("{} is not a directory", path);
        }
        info!(path = %path, "using project directory");
        Ok(path)
    }
}

impl From<&Cli> for CliContext {
    fn from(cli: &Cli) -> Self {
        Self {
            chdir: cli.chdir.clone(),
            dry_run: cli.dry_run,
            strict: cli.strict,
            no_tree: cli.no_tree,
        }
    }
}
