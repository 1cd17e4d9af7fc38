//! Download command - fetch every tile of a selection into the store.
//!
//! Progress events from the job drive an `indicatif` bar. Ctrl+C cancels the
//! job: tiles in flight finish, nothing new starts, and the next run over the
//! same store resumes where this one stopped.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::info;

use terrain_downloader::config::ConfigFile;
use terrain_downloader::download::{
    event_channel, DownloadConfig, DownloadEvent, DownloadOrchestrator, DownloadSummary,
    EventReceiver,
};
use terrain_downloader::provider::ReqwestTerrainClient;

use super::common::{display_path, format_size, resolve_store_dir, resolve_token, SelectionArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the download command.
#[derive(Debug, Clone, Args)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Developer token (overrides config)
    #[arg(long)]
    pub token: Option<String>,

    /// Store directory (overrides config)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Tiles downloaded at once (overrides config)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-tile timeout in seconds (overrides config)
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl DownloadArgs {
    /// Merge CLI arguments over the config file.
    pub fn to_download_config(&self, config: &ConfigFile) -> Result<DownloadConfig, CliError> {
        let token = resolve_token(self.token.clone(), config)?;
        let store_dir = resolve_store_dir(self.dir.clone(), config);
        let timeout = self.timeout.unwrap_or(config.download.timeout);

        let job = DownloadConfig::new(token, store_dir, self.selection.selection())
            .with_concurrency(self.concurrency.unwrap_or(config.download.concurrency))
            .with_tile_timeout(Duration::from_secs(timeout))
            .with_auth_endpoint(config.service.auth_endpoint.clone());

        Ok(match self.selection.max_zoom {
            Some(max_zoom) => job.with_max_zoom(max_zoom),
            None => job,
        })
    }
}

/// Run the download command.
pub fn run(runner: &CliRunner, args: DownloadArgs) -> Result<(), CliError> {
    runner.log_startup("download");
    let job = args.to_download_config(runner.config())?;

    println!("Downloading terrain tiles:");
    println!("  Selection:   {}", job.selection);
    println!("  Store:       {}", display_path(&job.store_dir));
    println!("  Concurrency: {}", job.concurrency);
    println!();

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("Received interrupt, finishing tiles in flight...");
        cancel_clone.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let client = Arc::new(ReqwestTerrainClient::new()?);
    let mut orchestrator = DownloadOrchestrator::new(client).with_cancellation(cancel);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let start = Instant::now();
    let summary = runtime.block_on(async {
        let (tx, rx) = event_channel();
        let (result, ()) = tokio::join!(orchestrator.run(&job, Some(tx)), render_progress(rx));
        result
    })?;

    info!(
        total = summary.total,
        downloaded = summary.downloaded,
        skipped = summary.skipped,
        failed = summary.failed,
        "Download finished"
    );
    for line in summary_lines(&summary, start.elapsed()) {
        println!("{}", line);
    }
    Ok(())
}

/// Feeds job events into a progress bar until the job is done.
async fn render_progress(mut rx: EventReceiver) {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] {wide_bar:.cyan/blue} {pos}/{len} tiles ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-"),
    );

    while let Some(event) = rx.recv().await {
        match event {
            DownloadEvent::Update { current, total } => {
                bar.set_length(total);
                bar.set_position(current);
            }
            DownloadEvent::Error { message } => {
                bar.println(format!("{} {}", style("error:").red().bold(), message));
            }
            DownloadEvent::Done => break,
        }
    }
    bar.finish_and_clear();
}

/// Final report printed after the bar is cleared.
fn summary_lines(summary: &DownloadSummary, elapsed: Duration) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Finished in {:.1}s: {} of {} tiles stored ({} already on disk)",
            elapsed.as_secs_f64(),
            summary.downloaded,
            summary.total,
            summary.skipped
        ),
        format!("  Stored:      {}", format_size(summary.bytes)),
    ];

    if summary.failed > 0 {
        lines.push(format!(
            "  {} tiles failed; run the same command again to retry them.",
            summary.failed
        ));
    }
    if summary.cancelled {
        lines.push(format!(
            "  Interrupted with {} tiles remaining; run again to resume.",
            summary.remaining()
        ));
    }
    lines
}
