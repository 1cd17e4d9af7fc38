//! Plan command - per-level tile ranges of a selection.
//!
//! Uses the `layer.json` cached in the store directory when present, so the
//! plan matches what `download` will fetch for that store.

use terrain_downloader::planner::{total_tiles, LevelPlan};
use terrain_downloader::provider::{LayerMetadata, LAYER_FILE_NAME};

use super::common::{display_path, planning_config, resolve_store_dir, PlanningArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the plan command.
pub fn run(runner: &CliRunner, args: PlanningArgs) -> Result<(), CliError> {
    runner.log_startup("plan");
    let config = runner.config();

    let store_dir = resolve_store_dir(args.dir, config);
    let metadata = LayerMetadata::load_cached(&store_dir)?;
    let job = planning_config(&args.selection, store_dir.clone(), config);
    let plan = job.plan(metadata.as_ref());

    println!("Selection: {}", job.selection);
    match metadata {
        Some(_) => println!(
            "Metadata:  {}",
            display_path(&store_dir.join(LAYER_FILE_NAME))
        ),
        None => println!("Metadata:  none cached, using default zoom range"),
    }
    println!();
    for line in plan_lines(&plan) {
        println!("{}", line);
    }
    println!();
    println!("Total: {} tiles", total_tiles(&plan));
    Ok(())
}

/// One line per level: its ranges and tile count.
fn plan_lines(plan: &[LevelPlan]) -> Vec<String> {
    plan.iter()
        .map(|level| {
            let ranges = if level.ranges.is_empty() {
                "not available".to_string()
            } else {
                level
                    .ranges
                    .iter()
                    .map(|r| format!("x {}..={} y {}..={}", r.min_x, r.max_x, r.min_y, r.max_y))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            format!(
                "Level {:>2}: {:>10} tiles  {}",
                level.level,
                level.tile_count(),
                ranges
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrain_downloader::planner::TileBoundsRange;

    #[test]
    fn test_plan_lines() {
        let plan = vec![
            LevelPlan {
                level: 0,
                ranges: vec![TileBoundsRange::new(0, 0, 1, 0).unwrap()],
            },
            LevelPlan {
                level: 1,
                ranges: Vec::new(),
            },
        ];
        let lines = plan_lines(&plan);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("2 tiles"));
        assert!(lines[0].contains("x 0..=1 y 0..=0"));
        assert!(lines[1].contains("not available"));
    }
}
