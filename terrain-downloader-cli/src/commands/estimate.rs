//! Estimate command - tile count and disk usage of a selection.
//!
//! Works offline. When the store holds a cached `layer.json` its zoom bounds
//! and availability apply, so the count equals what `download` fetches;
//! otherwise the default zoom range gives an upper bound.

use terrain_downloader::download::DownloadConfig;
use terrain_downloader::planner::StorageEstimate;
use terrain_downloader::provider::LAYER_FILE_NAME;

use super::common::{display_path, format_size, planning_config, resolve_store_dir, PlanningArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the estimate command.
pub fn run(runner: &CliRunner, args: PlanningArgs) -> Result<(), CliError> {
    runner.log_startup("estimate");
    let config = runner.config();

    let store_dir = resolve_store_dir(args.dir, config);
    let job = planning_config(&args.selection, store_dir, config);
    let estimate = job.estimate_storage()?;

    println!("Selection: {}", job.selection);
    println!("Metadata:  {}", metadata_source(&job));
    println!();
    for line in summary_lines(&estimate) {
        println!("{}", line);
    }
    Ok(())
}

fn metadata_source(job: &DownloadConfig) -> String {
    let path = job.store_dir.join(LAYER_FILE_NAME);
    if path.exists() {
        display_path(&path)
    } else {
        "none cached, default zoom range (upper bound)".to_string()
    }
}

fn summary_lines(estimate: &StorageEstimate) -> Vec<String> {
    vec![
        format!("Tiles:     {}", estimate.tiles),
        format!(
            "Storage:   {} - {}",
            format_size(estimate.min_bytes),
            format_size(estimate.max_bytes)
        ),
    ]
}
