//! k8s-provider CLI - Kubernetes CRDs as Terraform resources

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod error;
mod exit_codes;

#[derive(Parser)]
#[command(name = "k8s-provider")]
#[command(author = "k8s-provider Contributors")]
#[command(version)]
#[command(about = "Kubernetes CRDs as Terraform resources, data sources and manifests", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

/// Catalog and provider block settings shared by all commands
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Directory of additional CRD files (repeatable)
    #[arg(long = "crd-dir", global = true)]
    pub crd_dirs: Vec<PathBuf>,

    /// Provider configuration file (YAML or JSON)
    #[arg(long, global = true, env = "K8S_PROVIDER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Never contact a cluster
    #[arg(long, global = true)]
    pub offline: bool,

    /// Path to the kubeconfig file
    #[arg(long, global = true)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Field manager for server-side apply
    #[arg(long, global = true)]
    pub field_manager: Option<String>,

    /// Take ownership of fields owned by other managers
    #[arg(long, global = true)]
    pub force_conflicts: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered resource and data source types
    Types {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the provider schema, or the schema of one type, as JSON
    Schema {
        /// Type name
        type_name: Option<String>,

        /// Look the type up among data sources
        #[arg(short = 'd', long)]
        data_source: bool,
    },

    /// Validate a configuration against a type's schema
    Validate {
        /// Type name
        type_name: String,

        /// Configuration file (YAML or JSON)
        #[arg(short = 'f', long = "file")]
        file: PathBuf,

        /// Look the type up among data sources
        #[arg(short = 'd', long)]
        data_source: bool,
    },

    /// Render a manifest without contacting a cluster
    Manifest {
        /// Type name, with or without the `_manifest` suffix
        type_name: String,

        /// Configuration file (YAML or JSON)
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },

    /// Read a live object through a data source
    Read {
        /// Type name
        type_name: String,

        /// Configuration file (YAML or JSON)
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },

    /// Create or update an object through a resource
    Apply {
        /// Type name
        type_name: String,

        /// Planned configuration (YAML or JSON)
        #[arg(short = 'f', long = "file")]
        file: PathBuf,

        /// Prior state; updates instead of creating when set
        #[arg(long)]
        state: Option<PathBuf>,
    },

    /// Delete the object of a resource state
    Destroy {
        /// Type name
        type_name: String,

        /// Resource state (YAML or JSON)
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },

    /// Import an existing object by `name` or `namespace/name`
    Import {
        /// Type name
        type_name: String,

        /// Import identifier
        id: String,
    },
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .init();
}

async fn run(cli: Cli) -> error::Result<()> {
    let global = &cli.global;
    match cli.command {
        Commands::Types { json } => commands::types::run(global, json),

        Commands::Schema {
            type_name,
            data_source,
        } => commands::schema::run(global, type_name.as_deref(), data_source),

        Commands::Validate {
            type_name,
            file,
            data_source,
        } => commands::validate::run(global, &type_name, &file, data_source),

        Commands::Manifest { type_name, file } => {
            commands::manifest::run(global, &type_name, &file).await
        }

        Commands::Read { type_name, file } => commands::read::run(global, &type_name, &file).await,

        Commands::Apply {
            type_name,
            file,
            state,
        } => commands::apply::run(global, &type_name, &file, state.as_deref()).await,

        Commands::Destroy { type_name, file } => {
            commands::destroy::run(global, &type_name, &file).await
        }

        Commands::Import { type_name, id } => {
            commands::import::run(global, &type_name, &id).await
        }
    }
}

#[tokio::main]
async fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
