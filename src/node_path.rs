//! Node paths
//!
//! A path addresses a node relative to another node (`Body/Sprite`,
//! `../Hud`, `%Weapon`) or from the tree root (`/root/Score`).
//!
//! Segments:
//! - `.` stays on the current node
//! - `..` moves to the parent
//! - `%Name` looks `Name` up among the unique names of the current scope
//! - anything else selects the child with that name

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::interner::intern;

/// Prefix marking a unique-name segment
pub const UNIQUE_NAME_PREFIX: char = '%';

/// One step of a node path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// `.`
    Current,
    /// `..`
    Parent,
    /// `%Name`
    Unique(Arc<str>),
    /// `Name`
    Child(Arc<str>),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Current => write!(f, "."),
            Segment::Parent => write!(f, ".."),
            Segment::Unique(name) => write!(f, "{}{}", UNIQUE_NAME_PREFIX, name),
            Segment::Child(name) => write!(f, "{}", name),
        }
    }
}

/// Parsed node path
///
/// The empty path is valid and addresses nothing; lookups with it fail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath {
    absolute: bool,
    segments: Vec<Segment>,
}

impl NodePath {
    /// Parse a path string. Parsing never fails: empty segments (`a//b`,
    /// trailing `/`) are skipped.
    pub fn new(path: &str) -> Self {
        let absolute = path.starts_with('/');
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s {
                "." => Segment::Current,
                ".." => Segment::Parent,
                _ => match s.strip_prefix(UNIQUE_NAME_PREFIX) {
                    Some(name) => Segment::Unique(intern(name)),
                    None => Segment::Child(intern(s)),
                },
            })
            .collect();

        Self { absolute, segments }
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// True when the path has no segments and is not absolute
    pub fn is_empty(&self) -> bool {
        !self.absolute && self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Build an absolute path from root-first names
    pub(crate) fn absolute_from(names: impl IntoIterator<Item = Arc<str>>) -> Self {
        Self {
            absolute: true,
            segments: names.into_iter().map(Segment::Child).collect(),
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            write!(f, "/")?;
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(NodePath::new(s))
    }
}

impl From<&str> for NodePath {
    fn from(s: &str) -> Self {
        NodePath::new(s)
    }
}

impl From<String> for NodePath {
    fn from(s: String) -> Self {
        NodePath::new(&s)
    }
}
