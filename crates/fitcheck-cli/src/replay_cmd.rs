//! `fitcheck replay <file>`: drive a session from a script.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tracing::info;

use fitcheck_core::{
    GeneratorRegistry, SessionController, StepReport, WardrobeSet, parse_session_script,
    run_script,
};
use fitcheck_store::{ListStore, MemoryListStore};

use crate::config::FitcheckConfig;

/// Options for a replay run.
#[derive(Debug, Default)]
pub struct ReplayOptions {
    /// Print reports as JSON instead of a table.
    pub json: bool,
    /// Use an in-memory saved list.
    pub ephemeral: bool,
}

pub async fn run_replay(
    file_path: &str,
    config: &FitcheckConfig,
    options: &ReplayOptions,
) -> Result<()> {
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read script file: {file_path}"))?;
    let script = parse_session_script(&content, &WardrobeSet::with_defaults())
        .with_context(|| format!("failed to parse script file: {file_path}"))?;

    let registry = GeneratorRegistry::builtin(config.latency);
    let generator = registry.get(&config.backend).ok_or_else(|| {
        anyhow!(
            "unknown generator backend {:?} (available: {})",
            config.backend,
            registry.list().join(", ")
        )
    })?;

    let backend: Arc<dyn ListStore> = if options.ephemeral {
        Arc::new(MemoryListStore::new())
    } else {
        Arc::new(config.store_config.open_file_store())
    };
    info!(
        script = %file_path,
        generator = %config.backend,
        store = %backend.name(),
        "starting replay"
    );

    let session = SessionController::new(generator, backend).await;
    let reports = run_script(&session, &script).await;

    if options.json {
        let rendered =
            serde_json::to_string_pretty(&reports).context("failed to serialize step reports")?;
        println!("{rendered}");
    } else {
        print_table(&reports);
        let view = session.view();
        println!();
        println!(
            "Final: layer {} of {}, pose {} ({})",
            view.layer_index,
            view.history_len,
            view.pose_index,
            view.pose_instruction
        );
        if let Some(image) = view.display_image {
            println!("Image: {image}");
        }
    }

    Ok(())
}

fn print_table(reports: &[StepReport]) {
    println!("{:>4}  {:<20}  {:<36}  {:>5}  {:>4}", "STEP", "ACTION", "OUTCOME", "LAYER", "POSE");
    for report in reports {
        println!(
            "{:>4}  {:<20}  {:<36}  {:>5}  {:>4}",
            report.step, report.action, report.outcome, report.layer_index, report.pose_index
        );
        if let Some(error) = &report.error {
            println!("      ! {error}");
        }
    }
}
