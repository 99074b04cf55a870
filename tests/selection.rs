//! Selection behavior over registries built from configuration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use audio_node_balancer::balancer::{BalancerError, LoadBalancer, Selection};
use audio_node_balancer::node::NodeRegistry;
use audio_node_balancer::penalty::NO_STATS_PENALTY;
use audio_node_balancer::{NodeId, NodeStats, PenaltyProvider, Penalties, SessionId, SessionTable};

mod common;

fn balancer(config: &audio_node_balancer::BalancerConfig) -> LoadBalancer {
    LoadBalancer::new(Arc::new(NodeRegistry::from_config(config)), SessionTable::new())
}

#[test]
fn test_two_node_scenario_hand_computed() {
    // A: 5 players + trunc(1.05^10 * 10) - 10 = 5 + 6
    // B: 1 player  + trunc(1.05^80 * 10) - 10 = 1 + 485
    let config = common::config(vec![
        common::node("a", true, Some(NodeStats::new(5, 0.1))),
        common::node("b", true, Some(NodeStats::new(1, 0.8))),
    ]);
    let lb = balancer(&config);

    let table = lb.penalty_table(SessionId(1));
    assert_eq!(table[0].cpu_penalty(), 6);
    assert_eq!(table[0].total(), 11);
    assert_eq!(table[1].cpu_penalty(), 485);
    assert_eq!(table[1].total(), 486);

    let selection = lb.select_node(SessionId(1)).unwrap();
    assert_eq!(selection.node().unwrap().id, NodeId::from("a"));
}

#[test]
fn test_frame_health_outweighs_player_count() {
    let config = common::config(vec![
        common::node("stuttering", true, Some(NodeStats::new(1, 0.1).with_frames(300, 30))),
        common::node("busy", true, Some(NodeStats::new(200, 0.1).with_frames(0, 0))),
    ]);
    let lb = balancer(&config);

    let table = lb.penalty_table(SessionId(1));
    // 1 + 6 + 2030 + 94
    assert_eq!(table[0].total(), 2131);
    assert_eq!(table[1].total(), 206);
    assert_eq!(lb.select_node(SessionId(1)).unwrap().node().unwrap().id, NodeId::from("busy"));
}

#[test]
fn test_empty_registry_fails() {
    let lb = balancer(&common::config(Vec::new()));
    assert_eq!(lb.select_node(SessionId(1)).unwrap_err(), BalancerError::NoNodesAvailable);
}

#[test]
fn test_statless_nodes_lose_to_any_reporting_node() {
    let config = common::config(vec![
        common::node("warming-up", true, None),
        common::node("loaded", true, Some(NodeStats::new(1000, 1.5))),
    ]);
    let lb = balancer(&config);

    assert_eq!(lb.penalty_table(SessionId(1))[0].total(), NO_STATS_PENALTY);
    assert_eq!(lb.select_node(SessionId(1)).unwrap().node().unwrap().id, NodeId::from("loaded"));
}

#[test]
fn test_all_statless_picks_first_and_respects_open_state() {
    let config = common::config(vec![common::node("x", false, None), common::node("y", true, None)]);
    let lb = balancer(&config);

    // Equal totals: first wins, and it is closed.
    match lb.select_node(SessionId(1)).unwrap() {
        Selection::Unavailable(node) => assert_eq!(node.id, NodeId::from("x")),
        Selection::Node(node) => panic!("closed node should not be handed out, got {}", node.id),
    }
}

#[test]
fn test_session_aware_provider() {
    let config = common::config(vec![
        common::node("a", true, Some(NodeStats::new(0, 0.0))),
        common::node("b", true, Some(NodeStats::new(0, 0.0))),
    ]);
    let lb = balancer(&config);

    // Pin even sessions to "b" by penalizing "a" for them.
    let pin: Arc<dyn PenaltyProvider> = Arc::new(|p: &Penalties| {
        if p.session().0 % 2 == 0 && p.node().id == NodeId::from("a") {
            1
        } else {
            0
        }
    });
    lb.register_provider(pin);

    assert_eq!(lb.select_node(SessionId(1)).unwrap().node().unwrap().id, NodeId::from("a"));
    assert_eq!(lb.select_node(SessionId(2)).unwrap().node().unwrap().id, NodeId::from("b"));
}

#[test]
fn test_concurrent_updates_during_selection() {
    let config = common::config(vec![
        common::node("a", true, Some(NodeStats::new(1, 0.1))),
        common::node("b", true, Some(NodeStats::new(2, 0.2))),
    ]);
    let lb = Arc::new(balancer(&config));
    let stop = Arc::new(AtomicBool::new(false));

    let stats_writer = {
        let lb = lb.clone();
        let stop = stop.clone();
        thread::spawn(move || {
            let mut players = 0;
            while !stop.load(Ordering::Relaxed) {
                players = (players + 1) % 50;
                let id = NodeId::from(if players % 2 == 0 { "a" } else { "b" });
                lb.registry().update_stats(&id, NodeStats::new(players, 0.3)).unwrap();
            }
        })
    };

    let provider_churn = {
        let lb = lb.clone();
        let stop = stop.clone();
        thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                let provider: Arc<dyn PenaltyProvider> = Arc::new(|p: &Penalties| p.player_penalty());
                lb.register_provider(provider.clone());
                assert!(lb.unregister_provider(&provider));
            }
        })
    };

    for session in 0..2_000 {
        let selection = lb.select_node(SessionId(session)).unwrap();
        assert!(selection.is_selected());
    }

    stop.store(true, Ordering::Relaxed);
    stats_writer.join().unwrap();
    provider_churn.join().unwrap();
    assert!(lb.providers().is_empty());
}
