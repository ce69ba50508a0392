//! RHCS - cluster provider command-line driver
//!
//! The `rhcs` command runs single reconciliation steps against the
//! clusters-management API, reading declared intent and stored state from
//! JSON files and writing the new stored state back.
//!
//! ## Commands
//!
//! - `wait-ready`: Block until a cluster reports the ready state
//! - `ingress read`: Show a cluster's default ingress
//! - `ingress apply`: Converge the default ingress on declared intent
//! - `group-membership`: Add, show, or remove a group member

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rhcs_client::{ClustersApi, HttpClustersApi};
use rhcs_core::default_ingress::{ClusterIngressLifecycle, DefaultIngress};
use rhcs_core::group_membership::{
    create_group_membership, delete_group_membership, read_group_membership, GroupMembership,
};
use rhcs_core::telemetry::init_tracing;
use rhcs_core::{wait_for_cluster_ready, PollSettings, ProviderConfig};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "rhcs")]
#[command(author = "RHCS Provider Developers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Reconcile cluster sub-resources against the clusters-management API", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// API base URL (overrides RHCS_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Bearer access token (overrides RHCS_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Seconds between readiness queries (overrides RHCS_POLL_INTERVAL_SECS)
    #[arg(long, global = true, value_name = "SECS")]
    poll_interval: Option<u64>,

    /// Seconds to wait for a cluster to become ready (overrides RHCS_READY_TIMEOUT_SECS)
    #[arg(long, global = true, value_name = "SECS")]
    ready_timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Environment configuration with the command-line overrides applied.
    fn provider_config(&self) -> ProviderConfig {
        let mut config = ProviderConfig::from_env();
        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        if let Some(token) = &self.token {
            config = config.with_token(token);
        }
        if let Some(secs) = self.poll_interval {
            config = config.with_poll_interval(secs);
        }
        if let Some(secs) = self.ready_timeout {
            config = config.with_ready_timeout(secs);
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Wait until a cluster is ready
    WaitReady {
        #[arg(long)]
        cluster: String,
    },

    /// Default ingress operations
    Ingress {
        #[command(subcommand)]
        action: IngressCommand,
    },

    /// Group membership operations
    GroupMembership {
        #[command(subcommand)]
        action: MembershipCommand,
    },
}

#[derive(Subcommand)]
enum IngressCommand {
    /// Show the cluster's default ingress as stored state
    Read {
        #[arg(long)]
        cluster: String,

        /// Refresh this stored state (JSON) instead of importing from the API
        #[arg(long)]
        state: Option<PathBuf>,

        /// Write the state here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Converge the default ingress on declared intent
    Apply {
        #[arg(long)]
        cluster: String,

        /// Declared intent (JSON; `null` means unmanaged)
        #[arg(long)]
        intent: PathBuf,

        /// Previously stored state (JSON); absent on first apply
        #[arg(long)]
        state: Option<PathBuf>,

        /// Where to write the new state (default: the --state file, else stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum MembershipCommand {
    /// Add a user to a group once the cluster is ready
    Add {
        #[arg(long)]
        cluster: String,
        #[arg(long)]
        group: String,
        #[arg(long)]
        user: String,
    },

    /// Show a group member
    Show {
        #[arg(long)]
        cluster: String,
        #[arg(long)]
        group: String,
        #[arg(long)]
        id: String,
    },

    /// Remove a user from a group
    Remove {
        #[arg(long)]
        cluster: String,
        #[arg(long)]
        group: String,
        #[arg(long)]
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let config = cli.provider_config();
    let api: Arc<dyn ClustersApi> = Arc::new(
        HttpClustersApi::new(&config.url, config.token.as_deref())
            .context("Failed to build API client")?,
    );
    let settings = config.poll_settings();
    let lifecycle = ClusterIngressLifecycle::new(api.clone(), settings);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Commands::WaitReady { cluster } => {
            cmd_wait_ready(api.as_ref(), &cluster, settings, &cancel).await
        }
        Commands::Ingress { action } => match action {
            IngressCommand::Read {
                cluster,
                state,
                output,
            } => {
                cmd_ingress_read(
                    &lifecycle,
                    &cluster,
                    state.as_deref(),
                    output.as_deref(),
                    &cancel,
                )
                .await
            }
            IngressCommand::Apply {
                cluster,
                intent,
                state,
                output,
            } => {
                cmd_ingress_apply(
                    &lifecycle,
                    &cluster,
                    &intent,
                    state.as_deref(),
                    output.as_deref(),
                    &cancel,
                )
                .await
            }
        },
        Commands::GroupMembership { action } => match action {
            MembershipCommand::Add {
                cluster,
                group,
                user,
            } => {
                let planned = GroupMembership::new(cluster, group, user);
                cmd_membership_add(api.as_ref(), &planned, settings, &cancel).await
            }
            MembershipCommand::Show { cluster, group, id } => {
                cmd_membership_show(api.as_ref(), &membership_ref(cluster, group, id)).await
            }
            MembershipCommand::Remove { cluster, group, id } => {
                cmd_membership_remove(api.as_ref(), &membership_ref(cluster, group, id)).await
            }
        },
    }
}

fn membership_ref(cluster: String, group: String, id: String) -> GroupMembership {
    let mut membership = GroupMembership::new(cluster, group, id.clone());
    membership.id = Some(id);
    membership
}

fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read JSON file: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {:?}", path))
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, &json).with_context(|| format!("Failed to write to {:?}", path))?;
            println!("Wrote state to {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

async fn cmd_wait_ready(
    api: &dyn ClustersApi,
    cluster_id: &str,
    settings: PollSettings,
    cancel: &CancellationToken,
) -> Result<()> {
    let cluster = wait_for_cluster_ready(api, cluster_id, settings, cancel)
        .await
        .with_context(|| format!("Cluster '{}' did not become ready", cluster_id))?;
    println!(
        "Cluster {} is {} (version {})",
        cluster.id,
        cluster.state,
        cluster.raw_version().unwrap_or("unknown")
    );
    Ok(())
}

fn read_stored_state(path: Option<&Path>) -> Result<Option<DefaultIngress>> {
    match path {
        Some(path) if path.exists() => read_json_file(path),
        _ => Ok(None),
    }
}

async fn cmd_ingress_read(
    lifecycle: &ClusterIngressLifecycle,
    cluster_id: &str,
    state_path: Option<&Path>,
    output: Option<&Path>,
    cancel: &CancellationToken,
) -> Result<()> {
    let state = match state_path {
        Some(path) => {
            let stored = read_stored_state(Some(path))?;
            lifecycle.read(cluster_id, stored.as_ref(), cancel).await
        }
        None => lifecycle.import(cluster_id, cancel).await,
    }
    .with_context(|| format!("Failed to read default ingress of '{}'", cluster_id))?;
    write_json(&state, output)
}

async fn cmd_ingress_apply(
    lifecycle: &ClusterIngressLifecycle,
    cluster_id: &str,
    intent_path: &Path,
    state_path: Option<&Path>,
    output: Option<&Path>,
    cancel: &CancellationToken,
) -> Result<()> {
    let intent: Option<DefaultIngress> = read_json_file(intent_path)?;
    let stored = read_stored_state(state_path)?;

    let result = lifecycle
        .update(cluster_id, stored.as_ref(), intent.as_ref(), cancel)
        .await
        .with_context(|| format!("Failed to reconcile default ingress of '{}'", cluster_id))?;

    info!(cluster_id = %cluster_id, action = ?result.action, "Default ingress reconciled");
    write_json(&result.state, output.or(state_path))
}

async fn cmd_membership_add(
    api: &dyn ClustersApi,
    planned: &GroupMembership,
    settings: PollSettings,
    cancel: &CancellationToken,
) -> Result<()> {
    let state = create_group_membership(api, planned, settings, cancel)
        .await
        .context("Failed to add group member")?;
    write_json(&state, None)
}

async fn cmd_membership_show(api: &dyn ClustersApi, membership: &GroupMembership) -> Result<()> {
    let state = read_group_membership(api, membership)
        .await
        .context("Failed to read group member")?;
    write_json(&state, None)
}

async fn cmd_membership_remove(api: &dyn ClustersApi, membership: &GroupMembership) -> Result<()> {
    delete_group_membership(api, membership)
        .await
        .context("Failed to remove group member")?;
    println!(
        "Removed {} from group {} of cluster {}",
        membership.user, membership.group, membership.cluster
    );
    Ok(())
}
