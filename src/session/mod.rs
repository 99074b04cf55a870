//! Session bindings.
//!
//! # State Machine
//! ```text
//! Unassigned → AssignedTo(node)   successful selection, or connect-event claim
//! AssignedTo(node) → Unassigned   that node disconnected
//! ```
//!
//! There is no draining or migrating state; a bound session never moves
//! until its node goes away.

pub mod table;

pub use table::{Binding, SessionId, SessionTable};
