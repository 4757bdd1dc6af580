//! Plugin Publisher CLI
//!
//! Generates manifests and the registry document for a plugin artifact tree
//! and publishes the plugins to npm

use anyhow::Result;
use clap::{Parser, Subcommand};
use plugin_publisher::core::{
    ConfigLoadOptions, ConfigLoader, DescriptorSource, OperatorPrompt, PublishError,
    PublisherConfig,
};
use plugin_publisher::orchestration::{
    NonInteractivePrompt, PublishOrchestrator, PublishTarget, RunOptions, StdinPrompt,
};
use plugin_publisher::{ArtifactKind, NpmRegistryClient, RegistryShape, SafeCommandExecutor};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Plugin artifact publisher
#[derive(Parser)]
#[command(name = "plugin-publisher")]
#[command(version)]
#[command(about = "Discover, describe and publish WebAssembly plugin packages", long_about = None)]
struct Cli {
    /// Project path (defaults to current directory)
    #[arg(long, global = true, value_name = "PROJECT_PATH")]
    project: Option<PathBuf>,

    /// Verbose logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish plugins and the umbrella package
    Publish {
        /// Publish every plugin; the default, kept for scripts that pass it
        /// alongside filters
        #[arg(long)]
        all: bool,

        /// Only these platforms
        #[arg(long, value_parser = ["nodejs", "bundler", "web"])]
        platform: Vec<String>,

        /// Only these kinds
        #[arg(long)]
        kind: Vec<ArtifactKind>,

        /// Only these algorithms
        #[arg(long, value_parser = ["gzip", "brotli", "zip", "tar"])]
        algo: Vec<String>,

        /// Only these exact package names
        #[arg(long)]
        plugin: Vec<String>,

        /// Version to publish instead of bumping the latest published one
        #[arg(long)]
        version: Option<String>,

        /// Write versions but do not publish
        #[arg(long)]
        dry_run: bool,

        /// Do not touch the umbrella package
        #[arg(long)]
        no_umbrella: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Never prompt; fail if the version cannot be derived
        #[arg(long)]
        non_interactive: bool,

        /// Scan the artifact tree instead of reading the registry document
        #[arg(long)]
        scan: bool,
    },

    /// Regenerate manifests, the registry document and umbrella exports
    Generate {
        /// Registry shape; nested is printed to stdout
        #[arg(long, default_value = "flat")]
        shape: RegistryShape,
    },

    /// List known plugins
    List {
        /// Scan the artifact tree instead of reading the registry document
        #[arg(long)]
        scan: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            let code = report_error(&e);
            process::exit(code);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "plugin_publisher=debug"
    } else {
        "plugin_publisher=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Print an error with recovery hints and pick the exit code
fn report_error(error: &anyhow::Error) -> i32 {
    let Some(publish_error) = error.downcast_ref::<PublishError>() else {
        eprintln!("\n❌ Error");
        eprintln!("{:#}", error);
        return 1;
    };

    if matches!(publish_error, PublishError::Cancelled) {
        println!("\nPublishing cancelled");
        return publish_error.exit_code();
    }

    eprintln!("\n❌ Error [{}]", publish_error.code());
    eprintln!("{}", publish_error);

    if let PublishError::FilterEmpty { available } = publish_error {
        eprintln!("\nAvailable plugins:");
        for name in available {
            eprintln!("  • {}", name);
        }
    }

    let actions = publish_error.suggested_actions();
    if !actions.is_empty() {
        eprintln!("\n💡 Suggested actions:");
        for action in actions {
            eprintln!("  - {}", action);
        }
    }

    publish_error.exit_code()
}

async fn load_config(project_path: &Path, scan: bool) -> Result<PublisherConfig> {
    let mut options = ConfigLoadOptions::for_project(project_path);
    if scan {
        options.overrides.source = Some(DescriptorSource::Scan);
    }
    Ok(ConfigLoader::load(options).await?)
}

fn orchestrator(
    project_path: &Path,
    config: PublisherConfig,
    prompt: Arc<dyn OperatorPrompt>,
) -> Result<PublishOrchestrator> {
    let mut executor = SafeCommandExecutor::new(project_path)?;
    if let Some(secs) = config.command_timeout_secs {
        executor.set_timeout(Duration::from_secs(secs));
    }
    let client = Arc::new(NpmRegistryClient::new(executor));

    Ok(PublishOrchestrator::new(project_path, config, client, prompt))
}

async fn run(cli: Cli) -> Result<i32> {
    let project_path = cli.project.unwrap_or_else(|| PathBuf::from("."));

    match cli.command {
        Commands::Publish {
            all: _,
            platform,
            kind,
            algo,
            plugin,
            version,
            dry_run,
            no_umbrella,
            yes,
            non_interactive,
            scan,
        } => {
            let target = PublishTarget {
                platforms: platform.into_iter().collect(),
                kinds: kind.into_iter().collect(),
                algorithms: algo.into_iter().collect(),
                explicit_names: plugin.into_iter().collect(),
            };
            let options = RunOptions {
                explicit_version: version,
                dry_run,
                skip_umbrella: no_umbrella,
                assume_yes: yes,
            };
            let interactive = !non_interactive && std::io::stdin().is_terminal();

            publish_command(&project_path, scan, target, options, interactive).await
        }
        Commands::Generate { shape } => generate_command(&project_path, shape).await,
        Commands::List { scan } => list_command(&project_path, scan).await,
    }
}

async fn publish_command(
    project_path: &Path,
    scan: bool,
    target: PublishTarget,
    options: RunOptions,
    interactive: bool,
) -> Result<i32> {
    println!("\n📦 plugin-publisher\n");

    let config = load_config(project_path, scan).await?;
    let prompt: Arc<dyn OperatorPrompt> = if interactive {
        Arc::new(StdinPrompt::new())
    } else {
        Arc::new(NonInteractivePrompt::new(options.assume_yes))
    };

    if options.dry_run {
        println!("⚠️  DRY RUN MODE - manifests are updated but nothing is published\n");
    }

    let orchestrator = orchestrator(project_path, config, prompt)?;
    let result = orchestrator.run(&target, &options).await?;

    println!("{}", result.summary());

    Ok(if result.is_success() { 0 } else { 1 })
}

async fn generate_command(project_path: &Path, shape: RegistryShape) -> Result<i32> {
    let config = load_config(project_path, true).await?;
    let prompt = Arc::new(NonInteractivePrompt::new(false));
    let orchestrator = orchestrator(project_path, config, prompt)?;

    let report = orchestrator.generate().await?;

    match shape {
        RegistryShape::Flat => {
            println!(
                "Wrote {} manifests; registry document {}",
                report.descriptors.len(),
                if report.registry_written { "updated" } else { "unchanged" }
            );
            for descriptor in &report.descriptors {
                println!("  {} -> {}", descriptor.package_name, descriptor.subpath());
            }
        }
        RegistryShape::Nested => {
            let nested = orchestrator.builder().render(&report.descriptors, shape)?;
            println!("{}", serde_json::to_string_pretty(&nested)?);
        }
    }

    Ok(0)
}

async fn list_command(project_path: &Path, scan: bool) -> Result<i32> {
    let config = load_config(project_path, scan).await?;
    let prompt = Arc::new(NonInteractivePrompt::new(false));
    let orchestrator = orchestrator(project_path, config, prompt)?;

    let descriptors = orchestrator.discover().await?;
    println!("\n📦 {} plugins\n", descriptors.len());
    for descriptor in &descriptors {
        println!("  • {} ({})", descriptor.package_name, descriptor.subpath());
    }
    println!();

    Ok(0)
}
