use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "qm")]
#[command(about = "Component quota monitor CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one quota cycle against a grid-state snapshot
    ///
    /// Each invocation starts with no last-known-good settings: if the
    /// custom data is malformed, the cycle runs in dry-run on catalog
    /// defaults.
    Cycle {
        /// Grid-state JSON (inventories + assemblers)
        #[arg(long)]
        grid: String,

        /// Custom-data file; healed in place when keys are missing
        #[arg(long = "custom-data")]
        custom_data: String,

        /// Catalog YAML paths in merge order (built-in catalog when omitted)
        #[arg(long = "catalog")]
        catalog_paths: Vec<String>,

        /// Append enqueue requests as JSON lines here instead of stdout
        #[arg(long = "requests-out")]
        requests_out: Option<String>,

        /// Print the full cycle outcome as JSON instead of the status readout
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Heal a custom-data file without reconciling
    HealConfig {
        #[arg(long = "custom-data")]
        custom_data: String,

        /// Catalog YAML paths in merge order (built-in catalog when omitted)
        #[arg(long = "catalog")]
        catalog_paths: Vec<String>,

        /// Report missing keys and fail instead of writing
        #[arg(long, default_value_t = false)]
        check: bool,
    },

    /// Compute layered catalog hash + print canonical JSON
    CatalogHash {
        /// Paths in merge order (built-in catalog when omitted)
        paths: Vec<String>,
    },
}

fn init_tracing() {
    // Logs go to stderr; stdout carries the readout and requests.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    // Dev-time bootstrap; a missing file is fine.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Cycle {
            grid,
            custom_data,
            catalog_paths,
            requests_out,
            json,
        } => commands::cycle::run_cycle(commands::cycle::CycleArgs {
            grid,
            custom_data,
            catalog_paths,
            requests_out,
            json,
        })?,

        Commands::HealConfig {
            custom_data,
            catalog_paths,
            check,
        } => commands::heal::heal_config(&custom_data, &catalog_paths, check)?,

        Commands::CatalogHash { paths } => {
            let loaded = commands::load_catalog_config(&paths)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}
