//! Session-to-node binding table.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::node::NodeId;

/// Opaque session (guild) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl From<u64> for SessionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which node, if any, currently hosts a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Unassigned,
    AssignedTo(NodeId),
}

impl Binding {
    pub fn node(&self) -> Option<&NodeId> {
        match self {
            Binding::Unassigned => None,
            Binding::AssignedTo(node) => Some(node),
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self, Binding::AssignedTo(_))
    }
}

/// A thread-safe table of session bindings.
///
/// Cheap to clone; clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct SessionTable {
    inner: Arc<DashMap<SessionId, Binding>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a session as unassigned. Returns false if it was already tracked.
    pub fn open(&self, session: SessionId) -> bool {
        let mut inserted = false;
        self.inner.entry(session).or_insert_with(|| {
            inserted = true;
            Binding::Unassigned
        });
        inserted
    }

    /// Stop tracking a session, returning its last binding.
    pub fn close(&self, session: SessionId) -> Option<Binding> {
        self.inner.remove(&session).map(|(_, binding)| binding)
    }

    pub fn binding(&self, session: SessionId) -> Option<Binding> {
        self.inner.get(&session).map(|r| r.value().clone())
    }

    /// Bind a session to a node, tracking it if needed. Returns the previous binding.
    pub fn bind(&self, session: SessionId, node: NodeId) -> Option<Binding> {
        self.inner.insert(session, Binding::AssignedTo(node))
    }

    /// Mark a tracked session unassigned. Returns the previous binding.
    pub fn unbind(&self, session: SessionId) -> Option<Binding> {
        self.inner
            .get_mut(&session)
            .map(|mut r| std::mem::replace(r.value_mut(), Binding::Unassigned))
    }

    /// Mark a session unassigned only while it is still bound to `node`.
    pub fn unbind_if(&self, session: SessionId, node: &NodeId) -> bool {
        match self.inner.get_mut(&session) {
            Some(mut r) if r.value().node() == Some(node) => {
                *r.value_mut() = Binding::Unassigned;
                true
            }
            _ => false,
        }
    }

    /// Unassign every session bound to `node`. Returns them in id order.
    pub fn release_node(&self, node: &NodeId) -> Vec<SessionId> {
        self.release_matching(|bound| bound == node)
            .into_iter()
            .map(|(session, _)| session)
            .collect()
    }

    /// Unassign every session whose node matches `pred`.
    ///
    /// Returns the released sessions with the node they were bound to, in
    /// session id order.
    pub fn release_matching(&self, pred: impl Fn(&NodeId) -> bool) -> Vec<(SessionId, NodeId)> {
        let mut released = Vec::new();
        for mut entry in self.inner.iter_mut() {
            let Some(node) = entry.value().node().filter(|n| pred(*n)).cloned() else {
                continue;
            };
            *entry.value_mut() = Binding::Unassigned;
            released.push((*entry.key(), node));
        }
        released.sort_unstable_by_key(|(session, _)| *session);
        released
    }

    /// Bind every unassigned session to `node`. Returns them in id order.
    pub fn claim_unassigned(&self, node: &NodeId) -> Vec<SessionId> {
        let mut claimed = Vec::new();
        for mut entry in self.inner.iter_mut() {
            if !entry.value().is_assigned() {
                *entry.value_mut() = Binding::AssignedTo(node.clone());
                claimed.push(*entry.key());
            }
        }
        claimed.sort_unstable();
        claimed
    }

    /// Sessions currently bound to `node`, in id order.
    pub fn sessions_on(&self, node: &NodeId) -> Vec<SessionId> {
        let mut sessions: Vec<_> = self
            .inner
            .iter()
            .filter(|r| r.value().node() == Some(node))
            .map(|r| *r.key())
            .collect();
        sessions.sort_unstable();
        sessions
    }

    /// Sessions without a node, in id order.
    pub fn unassigned(&self) -> Vec<SessionId> {
        let mut sessions: Vec<_> = self
            .inner
            .iter()
            .filter(|r| !r.value().is_assigned())
            .map(|r| *r.key())
            .collect();
        sessions.sort_unstable();
        sessions
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Count of (assigned, unassigned) sessions.
    pub fn summary(&self) -> (usize, usize) {
        let mut assigned = 0;
        let mut unassigned = 0;
        for r in self.inner.iter() {
            if r.value().is_assigned() {
                assigned += 1;
            } else {
                unassigned += 1;
            }
        }
        (assigned, unassigned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> NodeId {
        NodeId::from(id)
    }

    #[test]
    fn test_open_and_bind() {
        let table = SessionTable::new();
        assert!(table.open(SessionId(1)));
        assert!(!table.open(SessionId(1)));
        assert_eq!(table.binding(SessionId(1)), Some(Binding::Unassigned));

        let previous = table.bind(SessionId(1), node("a"));
        assert_eq!(previous, Some(Binding::Unassigned));
        assert_eq!(table.binding(SessionId(1)), Some(Binding::AssignedTo(node("a"))));

        // Opening again never clears an existing binding.
        assert!(!table.open(SessionId(1)));
        assert!(table.binding(SessionId(1)).unwrap().is_assigned());
    }

    #[test]
    fn test_unbind_and_close() {
        let table = SessionTable::new();
        table.bind(SessionId(2), node("a"));

        assert_eq!(table.unbind(SessionId(2)), Some(Binding::AssignedTo(node("a"))));
        assert_eq!(table.unbind(SessionId(3)), None);
        assert_eq!(table.close(SessionId(2)), Some(Binding::Unassigned));
        assert!(table.is_empty());
    }

    #[test]
    fn test_unbind_if_leaves_other_bindings() {
        let table = SessionTable::new();
        table.bind(SessionId(1), node("a"));
        table.bind(SessionId(2), node("b"));

        assert!(table.unbind_if(SessionId(1), &node("a")));
        assert!(!table.unbind_if(SessionId(2), &node("a")));
        assert!(!table.unbind_if(SessionId(9), &node("a")));
        assert_eq!(table.binding(SessionId(1)), Some(Binding::Unassigned));
        assert_eq!(table.binding(SessionId(2)), Some(Binding::AssignedTo(node("b"))));
    }

    #[test]
    fn test_release_node_only_touches_that_node() {
        let table = SessionTable::new();
        table.bind(SessionId(3), node("a"));
        table.bind(SessionId(1), node("a"));
        table.bind(SessionId(2), node("b"));

        assert_eq!(table.release_node(&node("a")), vec![SessionId(1), SessionId(3)]);
        assert_eq!(table.binding(SessionId(2)), Some(Binding::AssignedTo(node("b"))));
        assert_eq!(table.unassigned(), vec![SessionId(1), SessionId(3)]);
        assert_eq!(table.summary(), (1, 2));
    }

    #[test]
    fn test_release_matching_reports_previous_node() {
        let table = SessionTable::new();
        table.bind(SessionId(1), node("a"));
        table.bind(SessionId(2), node("b"));
        table.bind(SessionId(3), node("c"));

        let released = table.release_matching(|n| n != &node("b"));

        assert_eq!(released, vec![(SessionId(1), node("a")), (SessionId(3), node("c"))]);
        assert_eq!(table.summary(), (1, 2));
    }

    #[test]
    fn test_claim_unassigned_leaves_bound_sessions() {
        let table = SessionTable::new();
        table.open(SessionId(1));
        table.open(SessionId(2));
        table.bind(SessionId(3), node("b"));

        assert_eq!(table.claim_unassigned(&node("c")), vec![SessionId(1), SessionId(2)]);
        assert_eq!(table.sessions_on(&node("c")), vec![SessionId(1), SessionId(2)]);
        assert_eq!(table.sessions_on(&node("b")), vec![SessionId(3)]);
        assert!(table.claim_unassigned(&node("d")).is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let table = SessionTable::new();
        let other = table.clone();
        other.open(SessionId(9));
        assert_eq!(table.len(), 1);
    }
}
