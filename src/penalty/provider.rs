//! Pluggable penalty providers.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::penalty::snapshot::Penalties;

/// Extra, deployment-specific penalty for a (node, session) pair.
///
/// Providers run inline with every selection pass, once per node. They see
/// the standard penalties already computed and the custom sum of the
/// providers registered before them, and must return quickly.
pub trait PenaltyProvider: Send + Sync {
    /// Penalty to add to the node's total. May be negative.
    fn penalty(&self, penalties: &Penalties) -> i32;

    /// Name used in logs and metrics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> PenaltyProvider for F
where
    F: Fn(&Penalties) -> i32 + Send + Sync,
{
    fn penalty(&self, penalties: &Penalties) -> i32 {
        self(penalties)
    }
}

/// Ordered list of registered providers.
///
/// Mutation publishes a new list; a scoring pass holds the list it loaded
/// for its whole duration. Registration does not de-duplicate: the same
/// provider registered twice contributes twice until unregistered twice.
#[derive(Default)]
pub struct ProviderSet {
    providers: ArcSwap<Vec<Arc<dyn PenaltyProvider>>>,
}

impl ProviderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider.
    pub fn register(&self, provider: Arc<dyn PenaltyProvider>) {
        tracing::debug!(provider = provider.name(), "Penalty provider registered");
        self.providers.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(provider.clone());
            next
        });
    }

    /// Remove the first registration of `provider` (compared by pointer).
    ///
    /// Returns whether a registration was removed.
    pub fn unregister(&self, provider: &Arc<dyn PenaltyProvider>) -> bool {
        let mut removed = false;
        self.providers.rcu(|current| {
            let mut next = Vec::clone(current);
            removed = match next.iter().position(|p| Arc::ptr_eq(p, provider)) {
                Some(index) => {
                    next.remove(index);
                    true
                }
                None => false,
            };
            next
        });
        if removed {
            tracing::debug!(provider = provider.name(), "Penalty provider unregistered");
        }
        removed
    }

    /// The current list, stable for as long as the caller holds it.
    pub fn snapshot(&self) -> Arc<Vec<Arc<dyn PenaltyProvider>>> {
        self.providers.load_full()
    }

    pub fn len(&self) -> usize {
        self.providers.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.load().is_empty()
    }
}
