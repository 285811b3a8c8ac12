//! Nodewire - declarative member binding for scene-tree objects

pub mod binding;
pub mod class_db;
pub mod config;
pub mod error;
pub mod interner;
pub mod logging;
pub mod node_path;
pub mod resolver;
pub mod resource;
pub mod signal;
pub mod tree;
pub mod variant;

pub use binding::{Bindable, Directive, MemberType, MetadataCache, TypeBuilder, TypeEntry};
pub use class_db::ClassDb;
pub use config::{MissingNodePolicy, ResolverConfig};
pub use error::{BindError, FixSuggestion, ResourceError, Result};
pub use logging::init_logging;
pub use node_path::NodePath;
pub use resolver::{ReadyReport, Resolver};
pub use resource::{FsResourceLoader, MemoryResourceLoader, Resource, ResourceLoader};
pub use signal::{Callable, SignalHub};
pub use tree::{NodeId, SceneTree};
pub use variant::{Variant, VariantError};
