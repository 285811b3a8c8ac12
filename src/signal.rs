//! Signal subscriptions
//!
//! A subscription connects (source node, signal name) to a `Callable`: a
//! target node plus the name of the handler method to run on the object
//! attached to it. The hub only records who listens to what; invoking the
//! handler is up to whoever owns the target object.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::interner::intern;
use crate::tree::NodeId;

/// Target of a subscription: (object node, method name)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Callable {
    pub target: NodeId,
    pub method: Arc<str>,
}

impl Callable {
    pub fn new(target: NodeId, method: &str) -> Self {
        Self {
            target,
            method: intern(method),
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.target, self.method)
    }
}

/// Subscription table keyed by source node, then signal name
///
/// Lookups borrow the signal name; only `connect` stores (and interns) one.
#[derive(Debug, Default)]
pub struct SignalHub {
    connections: FxHashMap<NodeId, FxHashMap<Arc<str>, Vec<Callable>>>,
}

impl SignalHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn targets(&self, source: NodeId, signal: &str) -> Option<&Vec<Callable>> {
        self.connections.get(&source)?.get(signal)
    }

    pub fn is_connected(&self, source: NodeId, signal: &str, callable: &Callable) -> bool {
        self.targets(source, signal)
            .is_some_and(|targets| targets.contains(callable))
    }

    /// Add a subscription. Returns false (and changes nothing) when the exact
    /// subscription already exists.
    pub fn connect(&mut self, source: NodeId, signal: &str, callable: Callable) -> bool {
        if self.is_connected(source, signal, &callable) {
            return false;
        }
        self.connections
            .entry(source)
            .or_default()
            .entry(intern(signal))
            .or_default()
            .push(callable);
        true
    }

    /// Remove a subscription. Returns false when it did not exist.
    pub fn disconnect(&mut self, source: NodeId, signal: &str, callable: &Callable) -> bool {
        let Some(signals) = self.connections.get_mut(&source) else {
            return false;
        };
        let Some(targets) = signals.get_mut(signal) else {
            return false;
        };
        let before = targets.len();
        targets.retain(|c| c != callable);
        let removed = targets.len() != before;
        if targets.is_empty() {
            signals.remove(signal);
        }
        if signals.is_empty() {
            self.connections.remove(&source);
        }
        removed
    }

    /// Subscribers of (source, signal) in connection order
    pub fn subscribers(&self, source: NodeId, signal: &str) -> Vec<Callable> {
        self.targets(source, signal).cloned().unwrap_or_default()
    }

    /// Number of subscribers of (source, signal)
    pub fn connection_count(&self, source: NodeId, signal: &str) -> usize {
        self.targets(source, signal).map_or(0, Vec::len)
    }

    /// Drop every subscription where `node` is the source or the target
    pub fn forget_node(&mut self, node: NodeId) {
        self.connections.remove(&node);
        self.connections.retain(|_, signals| {
            signals.retain(|_, targets| {
                targets.retain(|c| c.target != node);
                !targets.is_empty()
            });
            !signals.is_empty()
        });
    }

    /// Total number of subscriptions
    pub fn len(&self) -> usize {
        self.connections
            .values()
            .flat_map(|signals| signals.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
