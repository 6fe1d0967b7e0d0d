//! Change notification fan-out
//!
//! Decoupled observers register here explicitly, per recipe or globally,
//! and receive a [`RatingChange`] synchronously after every mutation.
//! Fire-and-forget: no acknowledgment, no queueing, no replay — a listener
//! registered after an emission never observes it.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use resep_ratings_core::RatingChange;

/// Callback invoked with every change in its scope.
pub type RatingListener = Arc<dyn Fn(&RatingChange) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Scope {
    Recipe(String),
    Global,
}

/// Handle returned by subscribe; pass it back to unsubscribe.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Subscription {
    id: u64,
    scope: Scope,
}

/// Observer registry with per-recipe and global subscriber lists.
#[derive(Default)]
pub struct ChangeNotifier {
    next_id: AtomicU64,
    per_recipe: RwLock<HashMap<String, Vec<(u64, RatingListener)>>>,
    global: RwLock<Vec<(u64, RatingListener)>>,
}

impl ChangeNotifier {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one recipe's changes.
    pub fn subscribe(
        &self,
        recipe_id: impl Into<String>,
        listener: impl Fn(&RatingChange) + Send + Sync + 'static,
    ) -> Subscription {
        let recipe_id = recipe_id.into();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.per_recipe
            .write()
            .entry(recipe_id.clone())
            .or_default()
            .push((id, Arc::new(listener)));
        Subscription {
            id,
            scope: Scope::Recipe(recipe_id),
        }
    }

    /// Register a listener for every change, for observers that cannot
    /// cheaply filter by recipe (lists, favorites views).
    pub fn subscribe_global(
        &self,
        listener: impl Fn(&RatingChange) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.global.write().push((id, Arc::new(listener)));
        Subscription {
            id,
            scope: Scope::Global,
        }
    }

    /// Remove a listener. Returns whether it was still registered.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        match subscription.scope {
            Scope::Recipe(recipe_id) => {
                let mut map = self.per_recipe.write();
                let Some(listeners) = map.get_mut(&recipe_id) else {
                    return false;
                };
                let before = listeners.len();
                listeners.retain(|(id, _)| *id != subscription.id);
                let removed = listeners.len() != before;
                if listeners.is_empty() {
                    map.remove(&recipe_id);
                }
                removed
            }
            Scope::Global => {
                let mut listeners = self.global.write();
                let before = listeners.len();
                listeners.retain(|(id, _)| *id != subscription.id);
                listeners.len() != before
            }
        }
    }

    /// Fan out `change` to the recipe's subscribers, then the global list.
    ///
    /// Listener handles are cloned out of the registry lock before any is
    /// invoked, so a listener may subscribe or unsubscribe while running.
    /// Returns the number of deliveries made.
    pub fn emit(&self, change: &RatingChange) -> usize {
        let mut listeners: Vec<RatingListener> = Vec::new();
        if let Some(scoped) = self.per_recipe.read().get(&change.recipe_id) {
            listeners.extend(scoped.iter().map(|(_, l)| Arc::clone(l)));
        }
        listeners.extend(self.global.read().iter().map(|(_, l)| Arc::clone(l)));

        for listener in &listeners {
            listener(change);
        }
        listeners.len()
    }

    /// Global-only broadcast for events without a single recipe scope,
    /// e.g. a full rating reset.
    pub fn emit_global(&self, change: &RatingChange) -> usize {
        let listeners: Vec<RatingListener> = self
            .global
            .read()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        for listener in &listeners {
            listener(change);
        }
        listeners.len()
    }
}
