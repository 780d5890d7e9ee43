use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use search_admissions::aggregator::{CancelToken, Progress, Researcher};
use search_admissions::config::{ResearchConfig, ResearchPlan, RunRequest, SourceMode};
use search_admissions::fetcher::HttpFetcher;
use search_admissions::pacer::ThreadPacer;
use search_admissions::scrapers::resolver_for;
use search_admissions::search::DuckDuckGoProvider;
use search_admissions::{storage, Entity, Record, Report};

#[derive(Parser, Debug)]
#[command(name = "search_admissions", version, about = "Collect prerequisites, admission criteria and career outcomes per university into a CSV report")]
struct Cli {
    /// Degree to research, e.g. "Computer Science BSc" (prompted for if missing)
    #[arg(short, long)]
    degree: Option<String>,

    /// Restrict the run to these universities, in this order (repeatable)
    #[arg(short = 'u', long = "university")]
    universities: Vec<String>,

    /// Course profile id from the config's `courses` table
    #[arg(short, long)]
    course: Option<String>,

    /// Where page URLs come from
    #[arg(short, long, value_enum)]
    mode: Option<SourceMode>,

    /// CSV output path (defaults to the config's `output`)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the report, with per-cell status, as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Milliseconds to wait between page fetches
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Config file (defaults to <root>/Config/research.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Project root
    #[arg(long, env = "ROOT", default_value = ".")]
    root: String,

    /// List configured course profiles and exit
    #[arg(long)]
    list_courses: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// One tick per university
struct BarProgress(ProgressBar);

impl Progress for BarProgress {
    fn entity_started(&self, _index: usize, _total: usize, entity: &Entity) {
        self.0.set_message(entity.label());
    }

    fn entity_finished(&self, _index: usize, _total: usize, _record: &Record) {
        self.0.inc(1);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| storage::config_path(&cli.root));
    let mut config = storage::load_config(&config_path)?;

    if cli.list_courses {
        for (id, course) in &config.courses {
            println!("{:<20} {}", id, course.title);
        }
        return Ok(());
    }

    if let Some(delay_ms) = cli.delay_ms {
        config.fetch.delay_ms = delay_ms;
    }

    let issues = config.validate();
    for issue in issues.iter().filter(|i| !i.is_error()) {
        warn!("config: {}", issue.message);
    }
    let errors: Vec<&str> = issues
        .iter()
        .filter(|i| i.is_error())
        .map(|i| i.message.as_str())
        .collect();
    if !errors.is_empty() {
        bail!("Invalid config {}: {}", config_path.display(), errors.join("; "));
    }

    let request = build_request(&cli, &config)?;
    let plan = config.plan(&request)?;
    info!(
        mode = %plan.mode,
        degree = %plan.degree,
        universities = plan.entities.len(),
        categories = plan.categories.len(),
        "Starting research"
    );

    let cancel = CancelToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if signal_token.cancel_again() {
                warn!("Second interrupt; exiting without a report");
                std::process::exit(130);
            }
            warn!("Stop requested; finishing the current university (Ctrl-C again to quit)");
        }
    });

    let bar = ProgressBar::new(plan.entities.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let task_config = config.clone();
    let task_bar = bar.clone();
    let report = tokio::task::spawn_blocking(move || run_research(&task_config, &plan, cancel, task_bar))
        .await
        .context("Research task panicked")??;
    bar.finish_and_clear();

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&cli.root).join(&config.output));
    storage::save_report_csv(&output, &report)?;
    println!("Saved as {}", output.display());

    if let Some(json_path) = &cli.json {
        storage::save_report_json(json_path, &report)?;
        println!("Saved as {}", json_path.display());
    }

    let placeholders: usize = report
        .records
        .iter()
        .map(|r| r.values.len() - r.matched_categories())
        .sum();
    info!(rows = report.records.len(), placeholders, "Report written");

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Collect front-end parameters; asks for the degree when a search run needs one
fn build_request(cli: &Cli, config: &ResearchConfig) -> Result<RunRequest> {
    let mode = cli.mode.unwrap_or(config.mode);
    let mut degree = cli.degree.clone();

    if degree.is_none() && cli.course.is_none() && mode == SourceMode::Search {
        let answer = prompt("Enter undergraduate degree (e.g., Computer Science BSc): ")?;
        if answer.is_empty() {
            bail!("A degree name is required; nothing was fetched");
        }
        degree = Some(answer);
    }

    Ok(RunRequest {
        degree,
        universities: cli.universities.clone(),
        course: cli.course.clone(),
        mode: cli.mode,
    })
}

fn prompt(question: &str) -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", question)?;
    stdout.flush()?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read from stdin")?;
    Ok(answer.trim().to_string())
}

/// Blocking part of the run: HTTP clients live on this thread only
fn run_research(
    config: &ResearchConfig,
    plan: &ResearchPlan,
    cancel: CancelToken,
    bar: ProgressBar,
) -> Result<Report> {
    let fetcher = HttpFetcher::new(&config.fetch).context("Failed to build HTTP client")?;
    let search = DuckDuckGoProvider::new(&config.fetch).context("Failed to build search client")?;
    let resolver = resolver_for(plan, search, fetcher, ThreadPacer, &config.fetch, &config.search);

    let mut researcher = Researcher::new(&plan.categories, resolver)
        .entity_column(config.entity_column.as_str())
        .cancel_token(cancel);

    let report = researcher.run(&plan.entities, &BarProgress(bar))?;
    Ok(report)
}
