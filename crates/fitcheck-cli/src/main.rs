mod config;
mod replay_cmd;
mod saved_cmds;
#[cfg(test)]
mod test_util;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use fitcheck_core::{POSE_INSTRUCTIONS, WardrobeSet};

use config::FitcheckConfig;

#[derive(Parser)]
#[command(name = "fitcheck", about = "Virtual try-on session driver")]
struct Cli {
    /// Data directory for saved outfits (overrides FITCHECK_DATA_DIR env var)
    #[arg(long, global = true)]
    data_dir: Option<String>,

    /// Image generator backend (overrides FITCHECK_BACKEND env var)
    #[arg(long, global = true)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a fitcheck config file
    Init {
        /// Generator backend to record
        #[arg(long, default_value = config::DEFAULT_BACKEND)]
        generator: String,
        /// Simulated generator latency in milliseconds
        #[arg(long, default_value_t = 0)]
        latency_ms: u64,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// List the pose catalog
    Poses,
    /// List the default wardrobe
    Wardrobe,
    /// Saved outfit management
    Saved {
        #[command(subcommand)]
        command: SavedCommands,
    },
    /// Replay a session script
    Replay {
        /// Path to the script TOML file
        file: String,
        /// Print step reports as JSON
        #[arg(long)]
        json: bool,
        /// Keep saved outfits in memory instead of the data directory
        #[arg(long)]
        ephemeral: bool,
    },
    /// Print a shell completion script
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum SavedCommands {
    /// List saved outfits, most recent first
    List,
    /// Show one saved outfit
    Show {
        /// Saved outfit ID
        id: String,
        /// Print the stored JSON record
        #[arg(long)]
        json: bool,
    },
    /// Delete a saved outfit
    Delete {
        /// Saved outfit ID
        id: String,
    },
}

/// Execute the `fitcheck init` command: write config file.
fn cmd_init(generator: &str, latency_ms: u64, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        storage: config::StorageSection::default(),
        generator: config::GeneratorSection {
            backend: generator.to_string(),
            latency_ms,
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  generator.backend = {generator}");
    println!("  generator.latency_ms = {latency_ms}");
    println!();
    println!("Next: run `fitcheck replay <script.toml>` to drive a session.");

    Ok(())
}

fn cmd_poses() {
    for (i, pose) in POSE_INSTRUCTIONS.iter().enumerate() {
        println!("{i}  {pose}");
    }
}

fn cmd_wardrobe() {
    let wardrobe = WardrobeSet::with_defaults();
    let width = wardrobe
        .items()
        .iter()
        .map(|g| g.id.len())
        .max()
        .unwrap_or(0);
    for garment in wardrobe.items() {
        println!("{:<width$}  {}  {}", garment.id, garment.name, garment.url);
    }
}

fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `--json` output stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            generator,
            latency_ms,
            force,
        } => {
            cmd_init(&generator, latency_ms, force)?;
        }
        Commands::Poses => cmd_poses(),
        Commands::Wardrobe => cmd_wardrobe(),
        Commands::Saved { command } => {
            let resolved =
                FitcheckConfig::resolve(cli.data_dir.as_deref(), cli.backend.as_deref())?;
            saved_cmds::run_saved_command(command, &resolved).await?;
        }
        Commands::Replay {
            file,
            json,
            ephemeral,
        } => {
            let resolved =
                FitcheckConfig::resolve(cli.data_dir.as_deref(), cli.backend.as_deref())?;
            let options = replay_cmd::ReplayOptions { json, ephemeral };
            replay_cmd::run_replay(&file, &resolved, &options).await?;
        }
        Commands::Completions { shell } => cmd_completions(shell),
    }

    Ok(())
}
