use anyhow::Result;
use clap::{Parser, Subcommand};
use lattice::commands::{compile, validate};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lattice")]
#[command(about = "Servlet configuration compiler for sandboxed cluster jobs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a servlet configuration without touching storage
    Validate {
        /// Path to the servlet configuration (JSON)
        spec: PathBuf,

        /// System-image device as name=path (can be repeated)
        #[arg(long = "sysimage", value_name = "NAME=PATH")]
        sysimage: Vec<String>,
    },

    /// Compile a servlet configuration into an execution plan
    Compile {
        /// Path to the servlet configuration (JSON)
        spec: PathBuf,

        /// Root directory of the directory-backed object store
        #[arg(short, long, default_value = ".")]
        store: PathBuf,

        /// System-image device as name=path (can be repeated)
        #[arg(long = "sysimage", value_name = "NAME=PATH")]
        sysimage: Vec<String>,

        /// Write the plan JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { spec, sysimage } => validate::execute(spec, sysimage),
        Commands::Compile {
            spec,
            store,
            sysimage,
            output,
        } => compile::execute(spec, store, sysimage, output),
    }
}
