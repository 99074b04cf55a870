//! Load statistics reported by a node.

use serde::{Deserialize, Serialize};

/// Sentinel for frame counters a node has not measured yet.
pub const FRAMES_NOT_MEASURED: i32 = -1;

/// Snapshot of a node's load, as last reported.
///
/// A node replaces its snapshot wholesale on every report; nothing in this
/// crate mutates one after construction.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NodeStats {
    /// Sessions actively producing audio on the node.
    pub playing_players: u32,

    /// Total players hosted, including paused ones. Not scored.
    #[serde(default)]
    pub players: u32,

    /// System load as a fraction; may exceed 1.0 on oversubscribed hosts.
    pub system_load: f64,

    /// Average late frames per minute, or `-1` when not yet measured.
    #[serde(default = "not_measured")]
    pub avg_frames_deficit_per_minute: i32,

    /// Average frames replaced by silence per minute.
    #[serde(default = "not_measured")]
    pub avg_frames_nulled_per_minute: i32,

    /// Node uptime in milliseconds. Not scored.
    #[serde(default)]
    pub uptime_ms: u64,
}

fn not_measured() -> i32 {
    FRAMES_NOT_MEASURED
}

impl NodeStats {
    /// Stats for a node that has not measured frame health yet.
    pub fn new(playing_players: u32, system_load: f64) -> Self {
        Self {
            playing_players,
            players: playing_players,
            system_load,
            avg_frames_deficit_per_minute: FRAMES_NOT_MEASURED,
            avg_frames_nulled_per_minute: FRAMES_NOT_MEASURED,
            uptime_ms: 0,
        }
    }

    /// Attach frame counters to the snapshot.
    pub fn with_frames(mut self, deficit_per_minute: i32, nulled_per_minute: i32) -> Self {
        self.avg_frames_deficit_per_minute = deficit_per_minute;
        self.avg_frames_nulled_per_minute = nulled_per_minute;
        self
    }

    /// Whether the node has reported frame statistics.
    pub fn has_frame_stats(&self) -> bool {
        self.avg_frames_deficit_per_minute != FRAMES_NOT_MEASURED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_has_no_frame_stats() {
        let stats = NodeStats::new(3, 0.25);
        assert!(!stats.has_frame_stats());
        assert_eq!(stats.players, 3);
    }

    #[test]
    fn test_with_frames() {
        let stats = NodeStats::new(0, 0.0).with_frames(0, 0);
        assert!(stats.has_frame_stats());
    }

    #[test]
    fn test_deserialize_defaults_frames_to_sentinel() {
        let stats: NodeStats = toml::from_str("playing_players = 2\nsystem_load = 0.5\n").unwrap();
        assert_eq!(stats.avg_frames_deficit_per_minute, FRAMES_NOT_MEASURED);
        assert_eq!(stats.avg_frames_nulled_per_minute, FRAMES_NOT_MEASURED);
        assert_eq!(stats.uptime_ms, 0);
    }
}
