//! Command handling and session wiring.

use crate::error::{AppError, AppResult};
use clap::{Parser, Subcommand};
use orderdesk_persistence::JsonFileStore;
use orderdesk_reactive::Observable;
use orderdesk_session::{SettingsSession, TracingReporter};
use orderdesk_settings::YamlParser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Orderbook settings selection desk.
#[derive(Parser, Debug)]
#[command(name = "orderdesk", version, about, long_about = None)]
pub struct Args {
    /// Settings YAML file (can also be set via ORDERDESK_SETTINGS)
    #[arg(short, long)]
    pub settings: Option<PathBuf>,

    /// State directory for persisted preferences (ORDERDESK_STATE_DIR)
    #[arg(long)]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the resolved selection state
    Show,
    /// Select the active network
    UseNetwork { network: String },
    /// Select the active orderbook on the active network
    UseOrderbook { orderbook: String },
    /// Select the active deployment under the active orderbook
    UseDeployment { deployment: String },
    /// Reset every selection to its default
    Reset,
}

pub async fn run(args: Args) -> AppResult<()> {
    let settings_path = args
        .settings
        .or_else(|| std::env::var("ORDERDESK_SETTINGS").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("settings.yaml"));
    let state_dir = args
        .state_dir
        .or_else(|| std::env::var("ORDERDESK_STATE_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(".orderdesk"));

    let store = Arc::new(JsonFileStore::open(state_dir.join("prefs.json")));
    let session = SettingsSession::new(store, Arc::new(YamlParser), Arc::new(TracingReporter));

    // The settings file is authoritative when present; the cached copy in
    // the preference store covers runs before any file exists.
    match std::fs::read_to_string(&settings_path) {
        Ok(text) => {
            if text != session.settings_text().get() {
                info!(path = %settings_path.display(), "loading settings file");
                session.set_settings_text(text);
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %settings_path.display(), "no settings file, using cached text");
        }
        Err(e) => return Err(e.into()),
    }
    session.load_settings().await;

    apply_command(&session, &args.command)?;
    print_state(&session);
    Ok(())
}

/// Apply one subcommand to the session.
///
/// Selection keys are validated against the settled document before the
/// `set`; the cascade takes care of everything downstream.
fn apply_command(session: &SettingsSession, command: &Command) -> AppResult<()> {
    match command {
        Command::Show => {}
        Command::UseNetwork { network } => {
            if !session.settings().get().networks.contains_key(network) {
                return Err(AppError::UnknownNetwork(network.clone()));
            }
            session.set_active_network_ref(Some(network.clone()));
        }
        Command::UseOrderbook { orderbook } => {
            if !session
                .active_network_orderbooks()
                .get()
                .contains_key(orderbook)
            {
                return Err(AppError::UnknownOrderbook(orderbook.clone()));
            }
            session.set_active_orderbook_ref(Some(orderbook.clone()));
        }
        Command::UseDeployment { deployment } => {
            if !session.deployments().get().contains_key(deployment) {
                return Err(AppError::UnknownDeployment(deployment.clone()));
            }
            session.set_active_deployment_ref(Some(deployment.clone()));
        }
        Command::Reset => {
            session.reset_active_network_ref();
            session.reset_active_orderbook_ref();
            session.reset_active_deployment_ref();
        }
    }
    Ok(())
}

fn print_state(session: &SettingsSession) {
    let doc = session.settings().get();

    let network = match (session.active_network_ref().get(), session.active_chain().get()) {
        (Some(r), Some(chain)) => format!("{r} ({}, chain {})", chain.name, chain.chain_id),
        (Some(r), None) => r,
        (None, _) => "-".to_string(),
    };
    println!("network:     {network}");
    println!(
        "rpc:         {}",
        session
            .rpc_url()
            .get()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "-".into())
    );
    println!(
        "orderbook:   {}",
        session
            .active_orderbook_ref()
            .get()
            .unwrap_or_else(|| "-".into())
    );
    println!(
        "address:     {}",
        session.orderbook_address().get().unwrap_or_else(|| "-".into())
    );
    println!(
        "subgraph:    {}",
        session
            .subgraph_url()
            .get()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "-".into())
    );
    println!(
        "deployment:  {}",
        session
            .active_deployment_ref()
            .get()
            .unwrap_or_else(|| "-".into())
    );
    println!("ready:       {}", session.has_required_settings().get());
    println!();
    println!("networks:    {}", join_keys(doc.networks.keys()));
    println!(
        "orderbooks:  {}",
        join_keys(session.active_network_orderbooks().get().keys())
    );
    println!(
        "deployments: {}",
        join_keys(session.deployments().get().keys())
    );
}

fn join_keys<'a>(keys: impl Iterator<Item = &'a String>) -> String {
    let joined = keys.cloned().collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderdesk_core::KvStore;
    use orderdesk_persistence::MemoryStore;

    const SETTINGS: &str = r#"
networks:
  net1:
    rpc: https://rpc.example/net1
    chain-id: 137
orderbooks:
  ob1:
    network: net1
    address: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
"#;

    async fn test_session() -> SettingsSession {
        let store = Arc::new(MemoryStore::new());
        store.write("settings", SETTINGS);
        let session = SettingsSession::new(store, Arc::new(YamlParser), Arc::new(TracingReporter));
        session.load_settings().await;
        session
    }

    #[tokio::test]
    async fn unknown_network_is_rejected() {
        let session = test_session().await;
        let err = apply_command(
            &session,
            &Command::UseNetwork {
                network: "nope".into(),
            },
        );
        assert!(matches!(err, Err(AppError::UnknownNetwork(_))));
    }

    #[tokio::test]
    async fn valid_selection_is_applied() {
        let session = test_session().await;
        apply_command(
            &session,
            &Command::UseNetwork {
                network: "net1".into(),
            },
        )
        .unwrap();
        apply_command(
            &session,
            &Command::UseOrderbook {
                orderbook: "ob1".into(),
            },
        )
        .unwrap();
        assert!(session.has_required_settings().get());
    }

    #[tokio::test]
    async fn orderbook_off_the_active_network_is_rejected() {
        let session = test_session().await;
        // No orderbook selection is valid before a network is active... but
        // the default pick already selected net1, so ob1 is available and
        // anything else is not.
        let err = apply_command(
            &session,
            &Command::UseOrderbook {
                orderbook: "other".into(),
            },
        );
        assert!(matches!(err, Err(AppError::UnknownOrderbook(_))));
    }
}
