//! Binding Module - declarative member binding for scene objects
//!
//! - `describe`: registration (`Bindable`, `TypeBuilder`)
//! - `member`: per-type metadata (`TypeEntry`, `BindableMember`, `Directive`)
//! - `cache`: process-wide metadata cache
//! - `resolve`: candidate names and owner-scoped lookup
//! - `dispatch`: directive execution
//! - `signals`: handler wiring and delivery
//!
//! Data flow:
//! ```text
//! Bindable::describe → TypeEntry (cache, once per type)
//!                          ↓
//!            dispatch: members ← tree lookups / resources
//!                          ↓
//!            bind_handlers: tree subscriptions
//! ```

mod cache;
mod describe;
mod dispatch;
mod member;
mod resolve;
mod signals;

pub use cache::MetadataCache;
pub use describe::{Bindable, HandlerBuilder, MemberBuilder, TypeBuilder};
pub use dispatch::DispatchReport;
pub use member::{
    BindableMember, Directive, DirectiveKind, Getter, HandlerBinding, HandlerMethod, Invoker,
    MemberKind, MemberType, Setter, TypeEntry,
};
pub use resolve::{capitalized_variant, node_candidates, resolve_candidates, singleton_candidates};
pub use signals::SignalReport;

pub(crate) use dispatch::{dispatch, ResolveContext};
pub(crate) use signals::{bind_handlers, call, deliver};
