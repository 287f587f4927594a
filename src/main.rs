use crate::artifacts::summarize;
use crate::interrupt::InterruptFlag;
use crate::output::Palette;
use crate::runner::{Runner, RunnerConfig};
use std::path::{Path, PathBuf};
use structopt::StructOpt;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod artifacts;
mod config;
mod interrupt;
mod models;
mod output;
mod runner;
mod shell;

type Result<T> = std::result::Result<T, failure::Error>;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "step-runner",
    about = "Run a pipeline of build commands, stopping at the first failure"
)]
struct Opt {
    #[structopt(parse(from_os_str))]
    config_file: PathBuf,

    #[structopt(required_unless = "list")]
    pipeline: Option<String>,

    /// List the pipelines defined in the config file
    #[structopt(short, long)]
    list: bool,

    /// Directory the steps run in (default: the config file's directory)
    #[structopt(short = "C", long, parse(from_os_str))]
    project_dir: Option<PathBuf>,

    /// Shell used for string commands (default: /bin/sh or cmd.exe)
    #[structopt(long)]
    shell: Option<String>,

    /// Disable colored output
    #[structopt(long)]
    no_color: bool,

    /// Print debug diagnostics to stderr
    #[structopt(short, long)]
    verbose: bool,
}

fn main() {
    let opt = Opt::from_args();
    init_logging(opt.verbose);

    let palette = if opt.no_color {
        Palette::plain()
    } else {
        Palette::ansi()
    };

    match run(&opt, palette) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}", palette.error(&e.to_string()));
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(opt: &Opt, palette: Palette) -> Result<i32> {
    let config = config::load_config(&opt.config_file)
        .map_err(|e| failure::format_err!("{}: {}", opt.config_file.display(), e))?;

    if opt.list {
        for pipeline in &config.pipelines {
            println!("{}\t{}", pipeline.name, pipeline.title());
        }
        return Ok(0);
    }

    let name = match &opt.pipeline {
        Some(name) => name,
        None => return Err(failure::err_msg("No pipeline given")),
    };
    let pipeline = match config.pipeline(name) {
        Some(pipeline) => pipeline,
        None => return Err(failure::format_err!("No pipeline named '{}'", name)),
    };

    let working_dir = opt
        .project_dir
        .clone()
        .unwrap_or_else(|| default_project_dir(&opt.config_file));
    info!(pipeline = %pipeline.name, working_dir = %working_dir.display(), "starting pipeline");

    let interrupt = InterruptFlag::install()?;

    println!();
    println!("{}", palette.info_banner(pipeline.title()));
    println!(
        "{}",
        palette.step(&format!(
            "{} step(s), started {}",
            pipeline.steps.len(),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ))
    );
    println!();

    let runner_config = RunnerConfig {
        palette,
        working_dir: working_dir.clone(),
        shell: opt.shell.clone(),
    };
    let report = Runner::new(runner_config, interrupt, std::io::stdout()).run(&pipeline.steps);

    if report.interrupted() {
        return Ok(0);
    }

    let artifact_dir = pipeline.artifact_dir.as_ref().map(|dir| working_dir.join(dir));
    let summary = summarize(
        &report,
        artifact_dir.as_deref(),
        &pipeline.artifact_extensions,
        &palette,
    );
    println!("{}", summary.text);
    debug!(artifacts = ?summary.artifacts, "summary rendered");

    Ok(if report.succeeded() { 0 } else { 1 })
}

/// Steps run next to their config file unless told otherwise.
fn default_project_dir(config_file: &Path) -> PathBuf {
    match config_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
