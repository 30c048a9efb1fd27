use anyhow::{Context, Result};
use auraprobe_core::dump::{DEFAULT_MAX_PAGES, DumpProgressCallback};
use auraprobe_core::{
    Auditor, DumpOptions, OutputDir, dump_all, partition_objects, pull_objects, render_summary,
};
use auraprobe_scanner::{Target, TransportConfig};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Map, Value};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

pub const UNEXPECTED_ERROR_EXIT_CODE: i32 = 1;

/// How a run ended, short of an unexpected error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    Success,
    NoEndpoint,
    BootstrapFailed,
}

impl AuditOutcome {
    pub fn exit_code(self) -> i32 {
        match self {
            AuditOutcome::Success => 0,
            AuditOutcome::NoEndpoint => 2,
            AuditOutcome::BootstrapFailed => 3,
        }
    }
}

/// Log level for the number of `-v` flags.
pub fn verbosity_level(count: u8) -> Level {
    match count {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    }
}

/// Logs go to stderr so stdout only carries results.
pub fn init_tracing(verbosity: u8) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(verbosity_level(verbosity))
        .with_target(false)
        .init();
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Run directory for `dump`: `-o` if given, else `./<target slug>`.
pub fn resolve_output_dir(explicit: Option<&String>, target: &Target) -> OutputDir {
    match explicit {
        Some(path) => OutputDir::new(expand_path(path)),
        None => OutputDir::for_target(Path::new("."), target),
    }
}

/// Document folder for `pull`: `Downloaded_Files` under `-o` or the current
/// directory.
pub fn resolve_download_dir(explicit: Option<&String>) -> Result<PathBuf> {
    let root = match explicit {
        Some(path) => expand_path(path),
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };
    Ok(OutputDir::new(root).downloads_dir())
}

/// `{ "<object>": [records...] }` in the order the objects were requested.
pub fn pulled_to_json(pulled: Vec<(String, Vec<Value>)>) -> Value {
    let mut by_object = Map::new();
    for (object_name, records) in pulled {
        by_object.insert(object_name, Value::Array(records));
    }
    Value::Object(by_object)
}

pub fn transport_from_args(args: &ArgMatches) -> TransportConfig {
    let mut transport = TransportConfig::default().with_proxy(args.get_one::<String>("proxy").cloned());
    if let Ok(Some(seconds)) = args.try_get_one::<u64>("download-timeout") {
        transport = transport.with_download_timeout(Duration::from_secs(*seconds));
    }
    transport
}

pub fn dump_options_from_args(args: &ArgMatches) -> DumpOptions {
    DumpOptions {
        full_dump: args.get_flag("full"),
        skip_existing: args.get_flag("skip"),
        max_pages: args
            .get_one::<u32>("max-pages")
            .copied()
            .unwrap_or(DEFAULT_MAX_PAGES),
    }
}

struct Console {
    quiet: bool,
}

impl Console {
    fn from_args(args: &ArgMatches) -> Self {
        Self {
            quiet: args.get_flag("quiet"),
        }
    }

    fn step(&self, msg: impl Display) {
        if !self.quiet {
            eprintln!("{} {}", "→".blue(), msg);
        }
    }

    fn ok(&self, msg: impl Display) {
        if !self.quiet {
            eprintln!("{} {}", "✓".green().bold(), msg);
        }
    }

    fn fail(&self, msg: impl Display) {
        eprintln!("{} {}", "✗".red().bold(), msg);
    }
}

/// Build an auditor for `-u`/`-p`, find the endpoint and, when asked,
/// bootstrap the context. `Err` carries the outcome to exit with.
async fn connect(
    args: &ArgMatches,
    console: &Console,
    load_context: bool,
) -> Result<std::result::Result<Auditor, AuditOutcome>> {
    let raw_url = args
        .get_one::<String>("url")
        .context("--url is required")?;
    let target = Target::parse(raw_url).with_context(|| format!("Invalid URL '{}'", raw_url))?;
    let target_label = target.to_string();

    let mut auditor = Auditor::new(target, &transport_from_args(args))
        .context("Failed to build the HTTP client")?;

    console.step(format!(
        "Looking for an Aura endpoint on {}",
        target_label.bright_white()
    ));
    match auditor.find_endpoint().await {
        Some(endpoint) => console.ok(format!("Found Aura endpoint: {}", endpoint)),
        None => {
            console.fail(format!("No Aura endpoint found on {}", target_label));
            return Ok(Err(AuditOutcome::NoEndpoint));
        }
    }

    if load_context {
        console.step("Loading Aura context");
        match auditor.load_context().await {
            Some(context) => console.ok(format!("Aura context loaded (fwuid {})", context.fwuid)),
            None => {
                console.fail(format!("Could not load the Aura context from {}", target_label));
                return Ok(Err(AuditOutcome::BootstrapFailed));
            }
        }
    }

    Ok(Ok(auditor))
}

pub async fn dispatch(matches: &ArgMatches) -> Result<AuditOutcome> {
    match matches.subcommand() {
        Some(("check", sub_matches)) => handle_check(sub_matches).await,
        Some(("objects", sub_matches)) => handle_objects(sub_matches).await,
        Some(("dump", sub_matches)) => handle_dump(sub_matches).await,
        Some(("record", sub_matches)) => handle_record(sub_matches).await,
        Some(("pull", sub_matches)) => handle_pull(sub_matches).await,
        _ => unreachable!("clap should ensure we don't get here"),
    }
}

pub async fn handle_check(args: &ArgMatches) -> Result<AuditOutcome> {
    let console = Console::from_args(args);
    Ok(match connect(args, &console, false).await? {
        Ok(_) => AuditOutcome::Success,
        Err(outcome) => outcome,
    })
}

pub async fn handle_objects(args: &ArgMatches) -> Result<AuditOutcome> {
    let console = Console::from_args(args);
    let auditor = match connect(args, &console, true).await? {
        Ok(auditor) => auditor,
        Err(outcome) => return Ok(outcome),
    };

    let objects = auditor.pull_object_list().await;
    if objects.is_empty() {
        console.fail("No accessible objects found");
        return Ok(AuditOutcome::Success);
    }

    let partition = partition_objects(&objects);
    console.ok(format!(
        "{} objects: {} standard, {} custom",
        objects.len().to_string().cyan(),
        partition.standard.len(),
        partition.custom.len()
    ));
    for name in partition.standard.iter().chain(&partition.custom) {
        println!("{}", name);
    }

    Ok(AuditOutcome::Success)
}

pub async fn handle_dump(args: &ArgMatches) -> Result<AuditOutcome> {
    let console = Console::from_args(args);
    let auditor = match connect(args, &console, true).await? {
        Ok(auditor) => auditor,
        Err(outcome) => return Ok(outcome),
    };

    let options = dump_options_from_args(args);
    let output = resolve_output_dir(args.get_one::<String>("output"), auditor.target());
    console.step(format!(
        "Dumping objects to {}{}",
        output.root().display().to_string().bright_white(),
        if options.full_dump { " (all pages)" } else { "" }
    ));

    let progress_bar = if console.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(0)
    };
    progress_bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );
    progress_bar.enable_steady_tick(Duration::from_millis(100));

    let bar = progress_bar.clone();
    let progress_callback: DumpProgressCallback =
        Arc::new(move |idx: usize, total: usize, object_name: String| {
            bar.set_length(total as u64);
            bar.set_position(idx as u64);
            bar.set_message(object_name);
        });

    let summary = dump_all(&auditor, &output, &options, Some(progress_callback)).await;
    progress_bar.finish_and_clear();
    let summary = summary
        .with_context(|| format!("Failed to write dump to {}", output.root().display()))?;

    if summary.objects_total == 0 {
        console.fail("No accessible objects found");
        return Ok(AuditOutcome::Success);
    }

    // The dump itself is on disk; the report is status output.
    eprintln!("{}", render_summary(&summary));
    Ok(AuditOutcome::Success)
}

pub async fn handle_record(args: &ArgMatches) -> Result<AuditOutcome> {
    let console = Console::from_args(args);
    let record_id = args
        .get_one::<String>("RECORD_ID")
        .context("A record id is required")?;
    let auditor = match connect(args, &console, true).await? {
        Ok(auditor) => auditor,
        Err(outcome) => return Ok(outcome),
    };

    match auditor.dump_record(record_id).await {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => console.fail(format!("Could not read record {}", record_id)),
    }

    Ok(AuditOutcome::Success)
}

pub async fn handle_pull(args: &ArgMatches) -> Result<AuditOutcome> {
    let console = Console::from_args(args);
    let object_names: Vec<String> = args
        .get_many::<String>("OBJECT")
        .into_iter()
        .flatten()
        .cloned()
        .collect();
    let download_dir = resolve_download_dir(args.get_one::<String>("output"))?;
    let auditor = match connect(args, &console, true).await? {
        Ok(auditor) => auditor,
        Err(outcome) => return Ok(outcome),
    };

    let pulled = pull_objects(&auditor, &object_names, Some(&download_dir)).await;
    if pulled.is_empty() {
        console.fail("None of the requested objects returned records");
        return Ok(AuditOutcome::Success);
    }

    for (object_name, records) in &pulled {
        console.ok(format!("{}: {} records", object_name, records.len()));
    }
    println!("{}", serde_json::to_string_pretty(&pulled_to_json(pulled))?);

    Ok(AuditOutcome::Success)
}
