//! CLI binary for pdf-split-worker.
//!
//! A thin shim over the library crate that maps CLI flags to `SplitConfig`
//! and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf_split_worker::{
    JobProgressCallback, JobResult, JobSplitter, JobState, ProgressCallback, SplitConfig,
};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// One bar for the whole batch; its length grows as each job reports its
/// page count, since jobs in a batch start at different times.
struct CliProgressCallback {
    bar: ProgressBar,
    failed_jobs: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} pages  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Splitting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self {
            bar,
            failed_jobs: AtomicUsize::new(0),
        })
    }

    fn finish(&self, jobs: usize) {
        self.bar.finish_and_clear();
        let failed = self.failed_jobs.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!("{} {} jobs split", green("✔"), bold(&jobs.to_string()));
        } else {
            eprintln!(
                "{} {}/{} jobs split  ({} failed)",
                red("✘"),
                jobs - failed,
                jobs,
                red(&failed.to_string())
            );
        }
    }
}

impl JobProgressCallback for CliProgressCallback {
    fn on_job_start(&self, job_id: &str, total_pages: usize) {
        self.bar.inc_length(total_pages as u64);
        self.bar.set_message(job_id.to_string());
    }

    fn on_page_written(&self, job_id: &str, _page_num: usize, _total: usize, filename: &str) {
        self.bar.set_message(format!("{job_id} → {filename}"));
        self.bar.inc(1);
    }

    fn on_job_complete(&self, result: &JobResult) {
        if result.is_success() {
            self.bar.println(format!(
                "  {} {:<24} {}",
                green("✓"),
                result.job_id,
                dim(&format!("{} files", result.created_files.len())),
            ));
        } else {
            self.failed_jobs.fetch_add(1, Ordering::SeqCst);
            let msg = result.error.as_deref().unwrap_or("failed");
            let msg = match msg.char_indices().nth(79) {
                Some((cut, _)) => format!("{}\u{2026}", &msg[..cut]),
                None => msg.to_string(),
            };
            self.bar
                .println(format!("  {} {:<24} {}", red("✗"), result.job_id, red(&msg)));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Create inbox/processing/output/logs under the shared root
  pdf-split init

  # Split one batch (reads /shared/inbox/tax-2568-1.pdf)
  pdf-split process tax-2568-1

  # Split several batches, two at a time, JSON results
  pdf-split --json process tax-2568-1 tax-2568-2 --concurrency 2

  # Where is a taxpayer's certificate?
  pdf-split locate 2568 3101700123456

  # Housekeeping
  pdf-split years
  pdf-split files 2568
  pdf-split clear 2568
  pdf-split inbox list
  pdf-split inbox delete tax-2568-1.pdf

ENVIRONMENT VARIABLES:
  SHARED_DIR              Shared root (default /shared)
  PDF_SPLIT_INBOX         Override the inbox directory
  PDF_SPLIT_OUTPUT        Override the output root
  PDF_SPLIT_MARKER        Payee marker phrase
  PDFIUM_LIB_PATH         Path to an existing libpdfium — skips auto-download
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory
"#;

/// Split withholding-tax certificate batches into one PDF per taxpayer.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-split",
    version,
    about = "Split withholding-tax certificate batches into one PDF per taxpayer",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Shared root holding inbox/, processing/, output/ and logs/.
    #[arg(long, global = true, env = "SHARED_DIR", default_value = "/shared")]
    shared_dir: PathBuf,

    /// Inbox directory (default: <shared-dir>/inbox).
    #[arg(long, global = true, env = "PDF_SPLIT_INBOX")]
    inbox_dir: Option<PathBuf>,

    /// Output root (default: <shared-dir>/output).
    #[arg(long, global = true, env = "PDF_SPLIT_OUTPUT")]
    output_dir: Option<PathBuf>,

    /// Print structured JSON instead of text.
    #[arg(long, global = true, env = "PDF_SPLIT_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "PDF_SPLIT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF_SPLIT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF_SPLIT_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the shared directory layout.
    Init,

    /// Split one or more batches from the inbox.
    Process {
        /// Job ids; each reads <inbox>/<JOB_ID>.pdf.
        #[arg(required = true)]
        job_ids: Vec<String>,

        /// Jobs processed at once.
        #[arg(short, long, env = "PDF_SPLIT_CONCURRENCY", default_value_t = 4)]
        concurrency: usize,

        /// Phrase printed before the payee's taxpayer id.
        #[arg(long, env = "PDF_SPLIT_MARKER")]
        marker: Option<String>,

        /// PDF user password for encrypted batches.
        #[arg(long, env = "PDF_SPLIT_PASSWORD")]
        password: Option<String>,
    },

    /// Show a job's state derived from the shared tree.
    Status { job_id: String },

    /// List output years.
    Years,

    /// List the PDFs stored for a year.
    Files { year: String },

    /// Find the certificate stored for a taxpayer in a year.
    Locate { year: String, cid: String },

    /// Delete a year's output directory.
    Clear { year: String },

    /// Inbox housekeeping.
    Inbox {
        #[command(subcommand)]
        command: InboxCommand,
    },
}

#[derive(Subcommand, Debug)]
enum InboxCommand {
    /// List source batches waiting in the inbox.
    List,
    /// Delete one inbox file by name.
    Delete { filename: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let is_process = matches!(cli.command, Command::Process { .. });
    let show_progress = is_process && !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let mut builder = SplitConfig::builder().shared_dir(&cli.shared_dir);
    if let Some(ref dir) = cli.inbox_dir {
        builder = builder.inbox_dir(dir);
    }
    if let Some(ref dir) = cli.output_dir {
        builder = builder.output_dir(dir);
    }

    match &cli.command {
        Command::Init => {
            let config = builder.build().context("Invalid configuration")?;
            let dirs = config
                .ensure_directories()
                .context("Failed to create shared directories")?;
            print_or(&cli, &dirs, || {
                for d in &dirs {
                    println!("{}", d.display());
                }
            })?;
        }

        Command::Process {
            job_ids,
            concurrency,
            marker,
            password,
        } => {
            builder = builder.concurrency(*concurrency);
            if let Some(m) = marker {
                builder = builder.payee_marker(m);
            }
            if let Some(p) = password {
                builder = builder.password(p);
            }
            let progress = show_progress.then(CliProgressCallback::new);
            if let Some(ref cb) = progress {
                builder = builder.progress_callback(Arc::clone(cb) as ProgressCallback);
            }
            let config = builder.build().context("Invalid configuration")?;

            ensure_pdfium(cli.quiet)?;

            let start = Instant::now();
            let splitter = Arc::new(JobSplitter::new(config));
            let results = splitter.process_many(job_ids.clone()).await;

            if let Some(cb) = progress {
                cb.finish(results.len());
            }
            print_results(&cli, &results)?;
            if !cli.quiet && !cli.json {
                eprintln!("{}", dim(&format!("{}ms total", start.elapsed().as_millis())));
            }

            let failed = results.iter().filter(|r| !r.is_success()).count();
            if failed > 0 {
                anyhow::bail!("{failed} of {} jobs failed", results.len());
            }
        }

        Command::Status { job_id } => {
            let splitter = JobSplitter::new(builder.build().context("Invalid configuration")?);
            let state = splitter
                .status(job_id)
                .with_context(|| format!("Failed to read status of job '{job_id}'"))?;
            print_or(&cli, &state, || match &state {
                JobState::Completed { year, files, .. } => {
                    println!("{job_id}: completed ({} files in {year})", files.len());
                    for f in files {
                        println!("  {f}");
                    }
                }
                JobState::Pending { .. } => println!("{job_id}: pending"),
                JobState::NotFound { .. } => println!("{job_id}: not found"),
            })?;
            if matches!(state, JobState::NotFound { .. }) {
                anyhow::bail!("Job not found: {job_id}");
            }
        }

        Command::Years => {
            let splitter = JobSplitter::new(builder.build().context("Invalid configuration")?);
            let years = splitter.store().list_years().context("Failed to list years")?;
            print_lines(&cli, &years)?;
        }

        Command::Files { year } => {
            let splitter = JobSplitter::new(builder.build().context("Invalid configuration")?);
            let files = splitter
                .store()
                .list_files(year)
                .with_context(|| format!("Failed to list files for {year}"))?;
            print_lines(&cli, &files)?;
        }

        Command::Locate { year, cid } => {
            let splitter = JobSplitter::new(builder.build().context("Invalid configuration")?);
            let found = splitter
                .store()
                .locate(year, cid)
                .with_context(|| format!("Failed to look up {cid} in {year}"))?;
            match found {
                Some(doc) => print_or(&cli, &doc, || println!("{}", doc.location.display()))?,
                None => anyhow::bail!("File not found: {year}/{cid}.pdf"),
            }
        }

        Command::Clear { year } => {
            let splitter = JobSplitter::new(builder.build().context("Invalid configuration")?);
            let existed = splitter
                .store()
                .clear_year(year)
                .with_context(|| format!("Failed to clear {year}"))?;
            let report = serde_json::json!({ "year": year, "existed": existed });
            print_or(&cli, &report, || {
                if existed {
                    println!("Cleared {year}");
                } else {
                    println!("{year} did not exist");
                }
            })?;
        }

        Command::Inbox { command } => {
            let splitter = JobSplitter::new(builder.build().context("Invalid configuration")?);
            let inbox = splitter.inbox();
            match command {
                InboxCommand::List => {
                    let files = inbox.list().context("Failed to list inbox")?;
                    print_lines(&cli, &files)?;
                }
                InboxCommand::Delete { filename } => {
                    let deleted = inbox
                        .delete(filename)
                        .with_context(|| format!("Failed to delete {filename}"))?;
                    if !deleted {
                        anyhow::bail!("File not found in inbox: {filename}");
                    }
                    if !cli.quiet {
                        println!("Deleted {filename}");
                    }
                }
            }
        }
    }

    Ok(())
}

/// Make sure a pdfium library is available, downloading it on first run.
fn ensure_pdfium(quiet: bool) -> Result<()> {
    if !pdfium_auto::is_pdfium_cached() {
        if quiet {
            tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
                .context("Failed to download PDFium engine")?;
        } else {
            let dl_bar = ProgressBar::new(0);
            dl_bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.cyan} {prefix:.bold}  \
                     [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            dl_bar.set_prefix("PDF engine");
            dl_bar.enable_steady_tick(Duration::from_millis(80));

            let bar = dl_bar.clone();
            tokio::task::block_in_place(|| {
                pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
                    if let Some(t) = total {
                        bar.set_length(t);
                    }
                    bar.set_position(downloaded);
                }))
            })
            .context("Failed to download PDFium engine")?;

            dl_bar.finish_with_message("ready ✓");
        }
    }

    Ok(())
}

fn print_or<T: Serialize>(cli: &Cli, value: &T, text: impl FnOnce()) -> Result<()> {
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        text();
    }
    Ok(())
}

fn print_lines(cli: &Cli, lines: &[String]) -> Result<()> {
    print_or(cli, &lines, || {
        for l in lines {
            println!("{l}");
        }
    })
}

fn print_results(cli: &Cli, results: &[JobResult]) -> Result<()> {
    if cli.json {
        let json = if results.len() == 1 {
            serde_json::to_string_pretty(&results[0])
        } else {
            serde_json::to_string_pretty(results)
        };
        println!("{}", json.context("Failed to serialise output")?);
        return Ok(());
    }
    if cli.quiet {
        return Ok(());
    }
    for r in results {
        match (&r.error, r.page_count) {
            (None, pages) => println!(
                "{} {}: {} pages → {} files",
                green("✓"),
                r.job_id,
                pages.unwrap_or(0),
                r.created_files.len()
            ),
            (Some(err), _) => println!(
                "{} {}: {} ({} files written before the fault)",
                red("✗"),
                r.job_id,
                err,
                r.created_files.len()
            ),
        }
    }
    Ok(())
}
