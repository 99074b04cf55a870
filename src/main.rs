//! node-balancer: inspect and run penalty-based audio node selection.
//!
//! # Commands
//!
//! ```text
//! penalties   print every node's penalty breakdown for a session
//! select      run one selection pass and print the outcome
//! watch       run the balancer on the config file, applying reloads
//!             as stats/connectivity updates until a signal arrives
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use audio_node_balancer::balancer::{LoadBalancer, Selection, SessionNotice};
use audio_node_balancer::config::{load_config, BalancerConfig, ConfigWatcher};
use audio_node_balancer::lifecycle::{signals, startup, Shutdown};
use audio_node_balancer::node::NodeRegistry;
use audio_node_balancer::observability::{logging, metrics};
use audio_node_balancer::session::{SessionId, SessionTable};

#[derive(Parser)]
#[command(name = "node-balancer")]
#[command(about = "Penalty-based audio node selection", long_about = None)]
struct Cli {
    /// Node configuration file (TOML).
    #[arg(short, long, default_value = "nodes.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print each node's penalty breakdown
    Penalties {
        /// Session the penalties are computed for
        #[arg(short, long, default_value_t = 0)]
        session: u64,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Select the best node for a session
    Select {
        #[arg(short, long)]
        session: u64,
    },
    /// Run the balancer and follow config changes
    Watch {
        /// Number of sessions to place at startup
        #[arg(long, default_value_t = 0)]
        sessions: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    logging::init(&config.observability)?;

    match cli.command {
        Commands::Penalties { session, json } => print_penalties(&config, SessionId(session), json)?,
        Commands::Select { session } => print_selection(&config, SessionId(session))?,
        Commands::Watch { sessions } => watch(cli.config, config, sessions).await?,
    }
    Ok(())
}

fn static_balancer(config: &BalancerConfig) -> LoadBalancer {
    let registry = Arc::new(NodeRegistry::from_config(config));
    LoadBalancer::new(registry, SessionTable::new())
}

fn print_penalties(config: &BalancerConfig, session: SessionId, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let balancer = static_balancer(config);
    let table = balancer.penalty_table(session);

    if json {
        let reports: Vec<_> = table.iter().map(|p| p.report()).collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for penalties in &table {
        let node = penalties.node();
        let state = if node.is_open() { "open" } else { "closed" };
        println!("{:<20} {:<7} {}", node.id, state, penalties);
    }
    Ok(())
}

fn print_selection(config: &BalancerConfig, session: SessionId) -> Result<(), Box<dyn std::error::Error>> {
    let balancer = static_balancer(config);
    match balancer.select_node(session)? {
        Selection::Node(node) => println!("session {} → {} ({})", session, node.id, node.address),
        Selection::Unavailable(node) => {
            println!("session {}: best node {} is closed, retry once it reconnects", session, node.id)
        }
    }
    Ok(())
}

async fn watch(path: PathBuf, config: BalancerConfig, sessions: u64) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?);
    }

    let shutdown = Shutdown::new();
    let mut services = startup::start(&config, &shutdown);

    for id in 1..=sessions {
        if let Err(e) = services.balancer.place_session(SessionId(id)) {
            tracing::error!(session = id, error = %e, "Initial placement failed");
        }
    }

    let (watcher, mut updates) = ConfigWatcher::new(&path);
    let _watcher = watcher.run()?;

    let signal = signals::wait_for_signal();
    tokio::pin!(signal);

    loop {
        tokio::select! {
            Some(update) = updates.recv() => {
                services.registry.apply_config(&update);
            }
            Some(notice) = services.notices.recv() => {
                handle_notice(&services.balancer, notice);
            }
            _ = &mut signal => {
                shutdown.trigger();
                break;
            }
        }
    }

    services.reassigner.await?;
    let (assigned, unassigned) = services.balancer.sessions().summary();
    tracing::info!(assigned, unassigned, "Shutdown complete");
    Ok(())
}

/// Stand-in for an orchestrator: orphaned sessions get a fresh selection.
fn handle_notice(balancer: &LoadBalancer, notice: SessionNotice) {
    match notice {
        SessionNotice::NodeLost { session, node } => {
            tracing::info!(session = %session, lost = %node, "Session orphaned, reselecting");
            if let Err(e) = balancer.place_session(session) {
                tracing::warn!(session = %session, error = %e, "Reselection failed");
            }
        }
        SessionNotice::NodeClaimed { session, node } => {
            tracing::info!(session = %session, node = %node.id, address = %node.address, "Session moved to connected node");
        }
    }
}
