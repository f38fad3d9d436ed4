//! kview - live cluster workload viewer.
//!
//! Connects to a kview publisher and logs cluster snapshots to the terminal
//! as they stream in.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use kview_client::{
    ClientConfig, ClientEvent, EventCategory, ReconnectConfig, ReconnectPolicy, SnapshotStore,
    StreamClient,
};
use kview_proto::{ClusterSnapshot, parse_timestamp};

#[derive(Parser)]
#[command(name = "kview")]
#[command(about = "Live cluster workload viewer")]
#[command(version)]
struct Cli {
    /// Publisher WebSocket URL
    #[arg(long, default_value = "ws://localhost:5000/ws")]
    url: String,

    /// Handshake timeout in seconds (0 disables)
    #[arg(long, default_value_t = 10)]
    connect_timeout: u64,

    /// Reconnect automatically with exponential backoff
    #[arg(long)]
    reconnect: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("kview=info".parse()?))
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::new(cli.url);
    if cli.connect_timeout > 0 {
        config = config.with_connect_timeout(Duration::from_secs(cli.connect_timeout));
    }

    let client = Arc::new(StreamClient::new(config));
    let store = Arc::new(SnapshotStore::new());
    store.attach(&client);

    client.on(EventCategory::Connect, |_| {
        info!("connected to publisher");
        Ok(())
    });
    client.on(EventCategory::Disconnect, |_| {
        info!("publisher disconnected, last snapshot stays visible");
        Ok(())
    });
    client.on(EventCategory::Error, |event| {
        if let ClientEvent::Error(error) = event {
            warn!(%error, "client error");
        }
        Ok(())
    });
    client.on(EventCategory::Message, |event| {
        if let ClientEvent::Message(snapshot) = event {
            log_snapshot(snapshot);
        }
        Ok(())
    });

    let policy = cli
        .reconnect
        .then(|| ReconnectPolicy::attach(&client, ReconnectConfig::default()));

    client.connect();
    tokio::signal::ctrl_c().await?;

    if let Some(policy) = policy {
        policy.stop();
    }
    client.disconnect();
    Ok(())
}

fn log_snapshot(snapshot: &ClusterSnapshot) {
    for ns in &snapshot.namespaces {
        info!(
            namespace = %ns.name,
            age = %namespace_age(&ns.created_at),
            pods = %count(ns.pods.as_deref()),
            deployments = %count(ns.deployments.as_deref()),
            services = %count(ns.services.as_deref()),
            "namespace"
        );
    }
    info!(namespaces = snapshot.len(), "snapshot replaced");
}

/// Render a collection count, with "-" for a collection the publisher did
/// not report in this update.
fn count<T>(collection: Option<&[T]>) -> String {
    collection.map_or_else(|| "-".to_string(), |items| items.len().to_string())
}

fn namespace_age(created_at: &str) -> String {
    let Some(created) = parse_timestamp(created_at) else {
        return "-".to_string();
    };
    let elapsed = Utc::now().signed_duration_since(created);
    if elapsed.num_days() > 0 {
        format!("{}d", elapsed.num_days())
    } else if elapsed.num_hours() > 0 {
        format!("{}h", elapsed.num_hours())
    } else {
        format!("{}m", elapsed.num_minutes().max(0))
    }
}
