//! Rigging CLI - resolve platform-aware dependency recipes

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod context;
mod init;
mod matrix;
mod resolve;

use context::ContextArgs;
use resolve::OutputFormat;

#[derive(Parser)]
#[command(name = "rigging")]
#[command(version)]
#[command(about = "Resolve platform-aware dependency recipes", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the recipe for one platform and print the manifest
    Resolve {
        /// Path to the recipe file
        #[arg(long, default_value = rigging_pkg::RECIPE_FILE)]
        recipe: PathBuf,

        #[command(flatten)]
        context: ContextArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Let conditional requirements replace earlier ones instead of failing
        #[arg(long)]
        allow_override: bool,
    },

    /// Resolve the recipe for several operating systems side by side
    Matrix {
        /// Path to the recipe file
        #[arg(long, default_value = rigging_pkg::RECIPE_FILE)]
        recipe: PathBuf,

        /// Operating systems to resolve for
        #[arg(long = "os", value_delimiter = ',', default_values_t = matrix::default_oses())]
        oses: Vec<String>,

        /// Profile supplying the other settings
        #[arg(long, env = "RIGGING_PROFILE")]
        profile: Option<PathBuf>,
    },

    /// Write a starter recipe in the current directory
    Init {
        /// Use a flat unconditional list instead of per-platform groups
        #[arg(long)]
        flat: bool,

        /// Fixed generators folder (implies --flat)
        #[arg(long)]
        generators_folder: Option<String>,

        /// Set the recipe name (defaults to directory name)
        #[arg(long)]
        name: Option<String>,

        /// Overwrite an existing recipe
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Resolve {
            recipe,
            context,
            format,
            allow_override,
        } => {
            let options = resolve::ResolveOptions {
                recipe,
                context,
                format,
                allow_override,
            };
            let output = resolve::run(&options)?;
            println!("{output}");
        }

        Commands::Matrix {
            recipe,
            oses,
            profile,
        } => {
            let options = matrix::MatrixOptions {
                recipe,
                oses,
                profile,
            };
            let report = matrix::run(&options)?;
            report.print_summary();
            report.into_result()?;
        }

        Commands::Init {
            flat,
            generators_folder,
            name,
            force,
        } => {
            let options = init::InitOptions {
                dir: std::env::current_dir()?,
                flat: flat || generators_folder.is_some(),
                generators_folder,
                name,
                force,
            };
            init::init_recipe(&options)?;
        }
    }

    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` takes precedence over `-v`.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
