//! # Aurora Global Provisioner CLI
//!
//! Single entry point that synthesizes the two-region deployment plan.
//!
//! ## Usage
//!
//! ```bash
//! # Synthesize the plan to stdout as JSON
//! aurora-global-provisioner synth --account 123456789012
//!
//! # Account from the environment, plan written as YAML files
//! export AURORA_PROVISIONER_ACCOUNT=123456789012
//! aurora-global-provisioner synth --format yaml --out-dir ./out
//!
//! # Re-validate a rendered plan
//! aurora-global-provisioner check ./out/plan.yaml
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use aurora_global_provisioner::{
    synthesize, DeploymentPlan, ProvisionerConfig, SecretReplicationMode,
};

/// Environment variable the account id falls back to
const ACCOUNT_ENV: &str = "AURORA_PROVISIONER_ACCOUNT";

/// Aurora Global Provisioner CLI
#[derive(Parser)]
#[command(name = "aurora-global-provisioner")]
#[command(
    about = "Synthesizes the two-region Aurora global database deployment plan",
    long_about = None,
    after_help = "\
Examples:
  aurora-global-provisioner synth --account 123456789012
  aurora-global-provisioner synth --format yaml --out-dir ./out
  aurora-global-provisioner check ./out/plan.yaml
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize and validate the deployment plan
    Synth {
        /// Target account id (12 digits); falls back to AURORA_PROVISIONER_ACCOUNT
        #[arg(long, value_name = "ACCOUNT_ID")]
        account: Option<String>,

        /// Database created on the primary cluster
        #[arg(long, value_name = "NAME")]
        database_name: Option<String>,

        /// Identifier for the global database identity
        #[arg(long, value_name = "IDENTIFIER")]
        global_cluster_identifier: Option<String>,

        /// How the credentials secret is encrypted and replicated
        #[arg(long, value_enum, value_name = "MODE")]
        replication_mode: Option<SecretReplicationMode>,

        /// Rendering format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Write the plan into this directory instead of stdout
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
    /// Validate a previously rendered plan file
    Check {
        /// Plan file to validate (.json, .yaml, or .yml)
        #[arg(value_name = "PLAN_FILE")]
        plan: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aurora_global_provisioner=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Synth {
            account,
            database_name,
            global_cluster_identifier,
            replication_mode,
            format,
            out_dir,
        } => synth_command(
            account,
            database_name,
            global_cluster_identifier,
            replication_mode,
            format,
            out_dir,
        ),
        Commands::Check { plan } => check_command(&plan),
    }
}

/// Build the configuration and render the synthesized plan
fn synth_command(
    account: Option<String>,
    database_name: Option<String>,
    global_cluster_identifier: Option<String>,
    replication_mode: Option<SecretReplicationMode>,
    format: OutputFormat,
    out_dir: Option<PathBuf>,
) -> Result<()> {
    let account = account
        .or_else(|| std::env::var(ACCOUNT_ENV).ok())
        .with_context(|| {
            format!("account id is required: pass --account or set {ACCOUNT_ENV}")
        })?;

    let mut config = ProvisionerConfig::new(&account)?;
    if let Some(database_name) = database_name {
        config.database_name = database_name;
    }
    if let Some(identifier) = global_cluster_identifier {
        config.global_cluster_identifier = identifier;
    }
    if let Some(mode) = replication_mode {
        config.secret_replication = mode;
    }
    config.validate()?;

    let plan = synthesize(&config)?;

    let (rendered, file_name) = match format {
        OutputFormat::Json => (plan.to_json()?, "plan.json"),
        OutputFormat::Yaml => (plan.to_yaml()?, "plan.yaml"),
    };

    match out_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            let path = dir.join(file_name);
            std::fs::write(&path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote deployment plan");
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

/// Re-read a rendered plan and run every validation pass against it
fn check_command(path: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let plan: DeploymentPlan = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse {} as YAML", path.display()))?,
        _ => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {} as JSON", path.display()))?,
    };

    println!("► checking resource ordering");
    plan.validate_ordering()?;
    println!("✔ dependencies are declared in order");

    println!("► checking global database identity");
    plan.validate_global_identity()?;
    println!("✔ one global identity, seeded after its source cluster");

    println!("► checking network allocations");
    plan.validate_network()?;
    println!("✔ region address blocks are disjoint");

    println!("✅ plan is valid ({} units)", plan.unit_count());

    Ok(())
}
