//! Kibble-Zurek Command-Line Interface
//!
//! The `kz` tool runs the dashboard's experiments from a terminal: list the
//! samplers, print the theoretical kink-density curve, search ring
//! embeddings, and drive a full submission until the job finishes.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{embed, samplers, simulate, theory, version};

/// kz - Kibble-Zurek experiments on quantum annealers
#[derive(Parser)]
#[command(name = "kz")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (YAML)
    #[arg(short, long, global = true, env = "KZ_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available samplers
    Samplers,

    /// Print the theoretical kink density against anneal time
    Theory {
        /// Coupling strength J
        #[arg(short = 'j', long, default_value = "-1.4", allow_negative_numbers = true)]
        coupling_strength: f64,

        /// Shortest anneal time in ns
        #[arg(long, default_value = "2")]
        min_ns: f64,

        /// Longest anneal time in ns
        #[arg(long, default_value = "350")]
        max_ns: f64,

        /// Number of log-spaced anneal times
        #[arg(short, long, default_value = "12")]
        points: usize,

        /// Anneal schedule CSV (built-in schedule if omitted)
        #[arg(short, long)]
        schedule: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Search a one-to-one ring embedding on a sampler's device graph
    Embed {
        /// Number of spins in the ring
        #[arg(short = 'n', long)]
        ring_size: usize,

        /// Sampler name (first available if omitted)
        #[arg(short, long)]
        sampler: Option<String>,

        /// Store the embedding in the embeddings directory
        #[arg(long)]
        save: bool,
    },

    /// Submit one job and follow it to completion
    Simulate {
        /// Number of spins in the ring
        #[arg(short = 'n', long, default_value = "512")]
        ring_size: usize,

        /// Coupling strength J
        #[arg(short = 'j', long, default_value = "-1.4", allow_negative_numbers = true)]
        coupling_strength: f64,

        /// Anneal time in ns
        #[arg(short = 't', long, default_value = "7")]
        anneal_time_ns: u32,

        /// Sampler name (first available if omitted)
        #[arg(short, long)]
        sampler: Option<String>,

        /// Run as a zero-noise experiment (anneal time scaled by lambda)
        #[arg(long)]
        zne: bool,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();

    // Execute command
    let result = match cli.command {
        Commands::Samplers => samplers::execute(config_path).await,

        Commands::Theory {
            coupling_strength,
            min_ns,
            max_ns,
            points,
            schedule,
            json,
        } => theory::execute(
            coupling_strength,
            (min_ns, max_ns),
            points,
            schedule.as_deref(),
            json,
        ),

        Commands::Embed {
            ring_size,
            sampler,
            save,
        } => embed::execute(config_path, ring_size, sampler.as_deref(), save).await,

        Commands::Simulate {
            ring_size,
            coupling_strength,
            anneal_time_ns,
            sampler,
            zne,
        } => {
            simulate::execute(
                config_path,
                simulate::SimulateArgs {
                    ring_size,
                    coupling_strength,
                    anneal_time_ns,
                    sampler,
                    zne,
                },
            )
            .await
        }

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
