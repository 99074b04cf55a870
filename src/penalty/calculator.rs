//! Penalty computation.
//!
//! Exponential curves turn raw load signals into integer penalty points. Each
//! curve is evaluated in floating point and truncated toward zero before the
//! components are combined, so scores are reproducible across hosts.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::node::{Node, NodeStats};
use crate::observability::metrics;
use crate::penalty::provider::PenaltyProvider;
use crate::penalty::snapshot::Penalties;
use crate::session::SessionId;

/// Frames a healthy node sends per minute (50 per second).
const FRAMES_PER_MINUTE: f32 = 3000.0;

/// Compute the penalties of `node` for `session`, including every provider.
///
/// Providers are called in order, each seeing the partially built breakdown.
/// A provider that panics contributes nothing; the fault is logged and
/// counted and scoring continues.
pub fn compute(node: &Arc<Node>, session: SessionId, providers: &[Arc<dyn PenaltyProvider>]) -> Penalties {
    let mut penalties = Penalties::empty(node.clone(), session);
    let Some(stats) = node.stats() else {
        return penalties;
    };

    apply_standard(&mut penalties, &stats);

    for provider in providers {
        let contribution = match panic::catch_unwind(AssertUnwindSafe(|| provider.penalty(&penalties))) {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(
                    provider = provider.name(),
                    node = %node.id,
                    session = %session,
                    "Penalty provider panicked, ignoring its contribution"
                );
                metrics::record_provider_fault(provider.name());
                0
            }
        };
        penalties.custom = penalties.custom.saturating_add(contribution);
    }

    penalties
}

/// Standard penalties only: no providers, session 0.
pub fn standard(node: &Arc<Node>) -> Penalties {
    compute(node, SessionId(0), &[])
}

fn apply_standard(penalties: &mut Penalties, stats: &NodeStats) {
    penalties.has_stats = true;
    // Rule of thumb: one playing player is one penalty point.
    penalties.player = i32::try_from(stats.playing_players).unwrap_or(i32::MAX);
    penalties.cpu = cpu_penalty(stats.system_load);

    // Young nodes have no frame stats yet and are not punished for it.
    if stats.has_frame_stats() {
        penalties.deficit_frame = deficit_frame_penalty(stats.avg_frames_deficit_per_minute);
        // An unreported nulled rate alongside a measured deficit counts as none.
        penalties.null_frame = null_frame_penalty(stats.avg_frames_nulled_per_minute.max(0));
    }
}

/// `trunc(1.05^(100 * load) * 10) - 10`: ~0 when idle, steep past full load.
pub fn cpu_penalty(system_load: f64) -> i32 {
    let curve = (1.05f64.powf(100.0 * system_load) * 10.0) as i32;
    curve.saturating_sub(10)
}

/// Penalty for frames delivered late.
pub fn deficit_frame_penalty(deficit_per_minute: i32) -> i32 {
    frame_curve(deficit_per_minute, 600.0)
}

/// Penalty for frames replaced by silence.
///
/// Weighted twice as heavily as late frames at the same rate: late frames
/// are often a garbage collection pause, nulled frames are lost audio.
pub fn null_frame_penalty(nulled_per_minute: i32) -> i32 {
    frame_curve(nulled_per_minute, 300.0).saturating_mul(2)
}

/// `trunc(1.03^(500 * (rate / 3000)) * scale - scale)`.
fn frame_curve(rate_per_minute: i32, scale: f64) -> i32 {
    let exponent = 500.0f32 * (rate_per_minute as f32 / FRAMES_PER_MINUTE);
    (1.03f64.powf(exponent as f64) * scale - scale) as i32
}
