mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_FAILURE, EXIT_LOOKUP_ERROR, EXIT_MANIFEST_ERROR};
use igpack_cache::{FsPackageCache, PackageCache};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(
    name = "igpack",
    version,
    about = "Deterministic FHIR implementation guide package resolution and artifact lookup"
)]
struct Cli {
    /// Path to the package cache directory.
    #[arg(long, default_value = "~/.fhir/packages")]
    cache_dir: String,

    /// Package registry base URL.
    #[arg(long, default_value = "https://packages.fhir.org")]
    registry: String,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve an IG manifest into its ordered package list.
    Resolve {
        /// Path to the IG manifest JSON file.
        #[arg(default_value = "ig.json")]
        manifest: PathBuf,
    },
    /// Locate a CQL library source across the resolved packages.
    Library {
        /// Path to the IG manifest JSON file.
        #[arg(default_value = "ig.json")]
        manifest: PathBuf,
        /// Canonical namespace the library is published under.
        #[arg(long)]
        system: String,
        /// Logical id of the library.
        #[arg(long)]
        id: String,
        /// Exact artifact version; omit to take the current resource.
        #[arg(long)]
        artifact_version: Option<String>,
        /// Write the source to a file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Locate a model descriptor across the resolved packages.
    Model {
        /// Path to the IG manifest JSON file.
        #[arg(default_value = "ig.json")]
        manifest: PathBuf,
        /// Canonical namespace the model is published under.
        #[arg(long)]
        system: String,
        /// Logical id of the model.
        #[arg(long)]
        id: String,
        /// Exact artifact version; omit to take the current resource.
        #[arg(long)]
        artifact_version: Option<String>,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("IGPACK_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();

    let cache_dir = expand_tilde(&cli.cache_dir);
    let cache: Arc<dyn PackageCache> = Arc::new(FsPackageCache::new(cache_dir, cli.registry));
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Resolve { manifest } => commands::resolve::run(&cache, &manifest, json_output),
        Commands::Library {
            manifest,
            system,
            id,
            artifact_version,
            out,
        } => commands::library::run(
            &cache,
            &manifest,
            &system,
            &id,
            artifact_version.as_deref(),
            out.as_deref(),
        ),
        Commands::Model {
            manifest,
            system,
            id,
            artifact_version,
        } => commands::model::run(&cache, &manifest, &system, &id, artifact_version.as_deref()),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("failed to read manifest")
                || msg.starts_with("failed to parse manifest")
                || msg.starts_with("unsupported fhirVersion")
                || msg.starts_with("manifest error:")
                || msg.starts_with("packageId")
            {
                EXIT_MANIFEST_ERROR
            } else if msg.starts_with("failed to load dependency")
                || msg.starts_with("no package provides")
                || msg.starts_with("failed to decode content")
            {
                EXIT_LOOKUP_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}
