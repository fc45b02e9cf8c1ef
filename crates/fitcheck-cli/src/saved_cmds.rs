//! Operator CLI handlers for `fitcheck saved` subcommands.
//!
//! Implements:
//! - `fitcheck saved list`        -- list saved outfits, most recent first
//! - `fitcheck saved show <id>`   -- show one outfit's layers and poses
//! - `fitcheck saved delete <id>` -- remove an outfit from the saved list

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local, TimeZone, Utc};

use fitcheck_core::{SavedOutfit, SavedOutfitStore};

use crate::SavedCommands;
use crate::config::FitcheckConfig;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `SavedCommands` variant to the appropriate handler.
pub async fn run_saved_command(command: SavedCommands, config: &FitcheckConfig) -> Result<()> {
    let backend = Arc::new(config.store_config.open_file_store());
    let mut store = SavedOutfitStore::open(backend).await;

    match command {
        SavedCommands::List => {
            cmd_list(&store);
            Ok(())
        }
        SavedCommands::Show { id, json } => cmd_show(&store, &id, json),
        SavedCommands::Delete { id } => cmd_delete(&mut store, &id).await,
    }
}

// -----------------------------------------------------------------------
// fitcheck saved list
// -----------------------------------------------------------------------

fn cmd_list(store: &SavedOutfitStore) {
    if store.is_empty() {
        println!("No saved outfits.");
        return;
    }

    println!("{:<40}  {:<16}  {:>6}  OUTFIT", "ID", "SAVED", "LAYERS");
    for outfit in store.list() {
        println!(
            "{:<40}  {:<16}  {:>6}  {}",
            outfit.id,
            saved_at(outfit),
            outfit.layers.len(),
            describe_garments(outfit),
        );
    }
}

// -----------------------------------------------------------------------
// fitcheck saved show <id>
// -----------------------------------------------------------------------

fn cmd_show(store: &SavedOutfitStore, id: &str, json: bool) -> Result<()> {
    let Some(outfit) = store.get(id) else {
        bail!("no saved outfit with id {id}");
    };

    if json {
        let rendered =
            serde_json::to_string_pretty(outfit).context("failed to serialize saved outfit")?;
        println!("{rendered}");
        return Ok(());
    }

    println!("Outfit:  {}", outfit.id);
    println!("Saved:   {}", saved_at(outfit));
    println!("Preview: {}", outfit.preview_url);
    println!(
        "Active:  layer {} of {}, pose {}",
        outfit.layer_index,
        outfit.layers.len(),
        outfit.pose_index
    );
    println!();
    for (i, layer) in outfit.layers.iter().enumerate() {
        let marker = if i == outfit.layer_index { "*" } else { " " };
        let label = layer
            .garment
            .as_ref()
            .map_or("(base model)", |g| g.name.as_str());
        println!("{marker} [{i}] {label}");
        for (pose, image) in layer.pose_images.iter() {
            println!("        {pose}: {image}");
        }
    }
    Ok(())
}

// -----------------------------------------------------------------------
// fitcheck saved delete <id>
// -----------------------------------------------------------------------

async fn cmd_delete(store: &mut SavedOutfitStore, id: &str) -> Result<()> {
    let removed = store
        .delete(id)
        .await
        .with_context(|| format!("failed to persist deletion of {id}"))?;
    if !removed {
        bail!("no saved outfit with id {id}");
    }
    println!("Deleted {id}.");
    Ok(())
}

// -----------------------------------------------------------------------
// Formatting
// -----------------------------------------------------------------------

/// Save time in the operator's local time zone.
fn saved_at(outfit: &SavedOutfit) -> String {
    format_timestamp(outfit.created_at, &Local)
}

fn format_timestamp<Tz>(created_at: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    created_at
        .map(|t| t.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn describe_garments(outfit: &SavedOutfit) -> String {
    let names = outfit.garment_names();
    if names.is_empty() {
        "(no garments)".to_string()
    } else {
        names.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn timestamps_are_shown_in_the_given_zone() {
        let t = Utc.with_ymd_and_hms(2024, 3, 9, 23, 30, 0).unwrap();
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();

        assert_eq!(format_timestamp(Some(t), &Utc), "2024-03-09 23:30");
        assert_eq!(format_timestamp(Some(t), &tokyo), "2024-03-10 08:30");
    }

    #[test]
    fn missing_timestamp_is_a_dash() {
        assert_eq!(format_timestamp(None, &Local), "-");
    }
}
