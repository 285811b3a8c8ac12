//! Resources and resource loaders
//!
//! A resource is an immutable, shareable asset identified by a `res://` id.
//! The dispatcher only talks to the `ResourceLoader` trait; two loaders ship
//! with the crate:
//! - `MemoryResourceLoader`: in-process table, filled by the host
//! - `FsResourceLoader`: JSON files under a resource root, cached by id
//!
//! Resource file format:
//! ```json
//! { "class": "Texture", "data": { "width": 16 } }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::ResourceError;
use crate::interner::intern;

/// Scheme prefix of resource ids
pub const RESOURCE_SCHEME: &str = "res://";

/// Loaded resource
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// Id the resource was loaded from
    pub path: String,
    /// Class name, checked against the member's declared resource class
    pub class: Arc<str>,
    /// Payload
    pub data: Value,
}

impl Resource {
    pub fn new(path: impl Into<String>, class: &str, data: Value) -> Self {
        Self {
            path: path.into(),
            class: intern(class),
            data,
        }
    }
}

/// On-disk shape of a resource file
#[derive(Debug, Deserialize, Serialize)]
struct ResourceFile {
    #[serde(default = "default_class")]
    class: String,
    #[serde(default)]
    data: Value,
}

fn default_class() -> String {
    "Resource".to_string()
}

/// Loads resources by id
///
/// `Ok(None)` means the id resolved to nothing; the dispatcher treats it the
/// same as an error.
pub trait ResourceLoader: Send + Sync {
    fn load(&self, id: &str) -> Result<Option<Arc<Resource>>, ResourceError>;
}

// ═══════════════════════════════════════════════════════════════════
// Memory loader
// ═══════════════════════════════════════════════════════════════════

/// In-process resource table
#[derive(Default)]
pub struct MemoryResourceLoader {
    resources: DashMap<String, Arc<Resource>>,
}

impl MemoryResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource under its own path
    pub fn insert(&self, resource: Resource) -> Arc<Resource> {
        let resource = Arc::new(resource);
        self.resources
            .insert(resource.path.clone(), Arc::clone(&resource));
        resource
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl ResourceLoader for MemoryResourceLoader {
    fn load(&self, id: &str) -> Result<Option<Arc<Resource>>, ResourceError> {
        Ok(self.resources.get(id).map(|r| Arc::clone(&r)))
    }
}

// ═══════════════════════════════════════════════════════════════════
// Filesystem loader
// ═══════════════════════════════════════════════════════════════════

/// Loads `res://a/b.json` from `<root>/a/b.json`
///
/// Successful loads are cached by id; misses are not, so a file created later
/// is picked up on the next load.
pub struct FsResourceLoader {
    root: PathBuf,
    cache: DashMap<String, Arc<Resource>>,
}

impl FsResourceLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a resource id to a file path under the root
    fn file_path(&self, id: &str) -> Result<PathBuf, ResourceError> {
        let relative = id
            .strip_prefix(RESOURCE_SCHEME)
            .ok_or_else(|| ResourceError::InvalidId { id: id.to_string() })?;

        // Ids are confined to the resource root
        if relative.is_empty() || relative.split('/').any(|part| part == "..") {
            return Err(ResourceError::InvalidId { id: id.to_string() });
        }

        Ok(self.root.join(relative))
    }
}

impl ResourceLoader for FsResourceLoader {
    fn load(&self, id: &str) -> Result<Option<Arc<Resource>>, ResourceError> {
        if let Some(cached) = self.cache.get(id) {
            return Ok(Some(Arc::clone(&cached)));
        }

        let path = self.file_path(id)?;
        if !path.is_file() {
            debug!(id, path = %path.display(), "Resource file not found");
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        let file: ResourceFile = serde_json::from_str(&content)?;
        let resource = Arc::new(Resource::new(id, &file.class, file.data));

        debug!(id, class = %resource.class, "Loaded resource");
        self.cache.insert(id.to_string(), Arc::clone(&resource));
        Ok(Some(resource))
    }
}
