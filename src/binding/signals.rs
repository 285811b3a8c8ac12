//! Handler wiring and delivery

use tracing::debug;

use crate::error::{BindError, Result};
use crate::signal::Callable;
use crate::tree::{NodeId, SceneTree};
use crate::variant::Variant;

use super::member::{HandlerBinding, TypeEntry};

/// Outcome of one wiring pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalReport {
    /// Subscriptions created by this pass
    pub connected: usize,
    /// Subscriptions that already existed and were left alone
    pub already_connected: usize,
}

/// Subscribe every handler of `entry` for the instance living on `node`
pub(crate) fn bind_handlers<T>(
    tree: &mut SceneTree,
    entry: &TypeEntry<T>,
    obj: &T,
    node: NodeId,
) -> Result<SignalReport> {
    let mut report = SignalReport::default();

    for binding in &entry.handlers {
        let source = handler_source(tree, entry, obj, node, binding)?;
        let callable = Callable::new(node, &binding.method);

        if tree.is_connected(source, &binding.signal, &callable) {
            report.already_connected += 1;
            continue;
        }

        debug!(
            type_name = entry.type_name,
            source = %source,
            signal = %binding.signal,
            callable = %callable,
            "Connecting handler"
        );
        tree.connect(source, &binding.signal, callable)?;
        report.connected += 1;
    }

    Ok(report)
}

/// Node whose signal the handler listens to
fn handler_source<T>(
    tree: &SceneTree,
    entry: &TypeEntry<T>,
    obj: &T,
    node: NodeId,
    binding: &HandlerBinding,
) -> Result<NodeId> {
    let Some(source_member) = &binding.source else {
        return Ok(node);
    };

    entry
        .member(source_member)
        .and_then(|member| member.get(obj).as_node())
        .filter(|id| tree.contains(*id))
        .ok_or_else(|| BindError::MissingSource {
            type_name: entry.type_name.to_string(),
            method: binding.method.to_string(),
            source_member: source_member.to_string(),
        })
}

/// Run the handlers subscribed to `signal` on `source` that target `node`.
/// Returns how many ran.
pub(crate) fn deliver<T>(
    tree: &SceneTree,
    entry: &TypeEntry<T>,
    obj: &mut T,
    node: NodeId,
    source: NodeId,
    signal: &str,
    args: &[Variant],
) -> usize {
    tree.emit_signal(source, signal)
        .iter()
        .filter(|callable| callable.target == node)
        .filter(|callable| call(entry, obj, &callable.method, args))
        .count()
}

/// Invoke a handler method by name. False when the type has no such method.
pub(crate) fn call<T>(entry: &TypeEntry<T>, obj: &mut T, method: &str, args: &[Variant]) -> bool {
    match entry.method(method) {
        Some(handler) => {
            (handler.invoke)(obj, args);
            true
        }
        None => false,
    }
}
