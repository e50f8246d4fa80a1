//! Document paths and JSON Pointer helpers.
//!
//! Every schema the engine touches is addressed by a [`SchemaPath`]: the
//! ordered list of keys and indices leading from the document root to the
//! value. Paths render as RFC 6901 JSON Pointers, which is also how local
//! `$ref` fragments are written, so the two convert into each other freely.

use std::borrow::Cow;
use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

// ---------------------------------------------------------------------------
// JSON Pointer escaping (RFC 6901)
// ---------------------------------------------------------------------------

/// Escape a single pointer segment: `~` → `~0`, `/` → `~1`.
///
/// Returns `Cow::Borrowed` when no escaping is needed (the common case).
pub fn escape_pointer_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains('~') || segment.contains('/') {
        Cow::Owned(segment.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Unescape a single pointer segment: `~1` → `/`, then `~0` → `~`.
pub fn unescape_pointer_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains("~0") || segment.contains("~1") {
        Cow::Owned(segment.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(segment)
    }
}

// ---------------------------------------------------------------------------
// SchemaPath
// ---------------------------------------------------------------------------

/// One step of a [`SchemaPath`].
///
/// Canonical digit strings are always stored as `Index`, so `"200"` reached
/// as a status-code key and `200` reached as an array position compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    fn parse(key: String) -> Self {
        match key.parse::<usize>() {
            Ok(index) if index.to_string() == key => PathSegment::Index(index),
            _ => PathSegment::Key(key),
        }
    }

    /// The segment as it appears inside a JSON Pointer (unescaped).
    pub fn as_key(&self) -> Cow<'_, str> {
        match self {
            PathSegment::Key(key) => Cow::Borrowed(key),
            PathSegment::Index(i) => Cow::Owned(i.to_string()),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::parse(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::parse(key)
    }
}

impl From<&String> for PathSegment {
    fn from(key: &String) -> Self {
        PathSegment::parse(key.clone())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Location of a value inside an API document.
///
/// Used both for addressing (read/write through [`crate::document::ApiDocument`])
/// and as the identity of a schema in the walker's visited set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaPath {
    segments: Vec<PathSegment>,
}

impl SchemaPath {
    /// The document root.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a JSON Pointer (`/a/b~1c`) or a local `$ref` fragment
    /// (`#/a/b~1c`).
    ///
    /// Whether `0` means an array index or an object key depends on the
    /// document; [`SchemaPath::lookup`] accepts either.
    pub fn from_pointer(pointer: &str) -> Self {
        let stripped = pointer.strip_prefix('#').unwrap_or(pointer);
        if stripped.is_empty() {
            return Self::root();
        }
        let mut parts = stripped.split('/');
        if stripped.starts_with('/') {
            parts.next();
        }
        Self {
            segments: parts
                .map(|s| PathSegment::from(unescape_pointer_segment(s).into_owned()))
                .collect(),
        }
    }

    /// Append a segment, returning a new path.
    pub fn join(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Append several segments, returning a new path.
    pub fn join_all<I, S>(&self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        let mut path = self.clone();
        path.segments.extend(segments.into_iter().map(Into::into));
        path
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// The path with its last segment removed (`None` at the root).
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.segments.split_last()?;
        Some(Self {
            segments: init.to_vec(),
        })
    }

    /// Render as an RFC 6901 JSON Pointer (`""` for the root).
    pub fn to_pointer(&self) -> String {
        let mut pointer = String::new();
        for segment in &self.segments {
            pointer.push('/');
            pointer.push_str(&escape_pointer_segment(&segment.as_key()));
        }
        pointer
    }

    /// Render as a local `$ref` fragment (`#/components/schemas/Pet`).
    pub fn to_ref(&self) -> String {
        format!("#{}", self.to_pointer())
    }

    /// Follow this path through `root`.
    pub fn lookup<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut current = root;
        for segment in &self.segments {
            current = match (current, segment) {
                (Value::Object(map), segment) => map.get(segment.as_key().as_ref())?,
                (Value::Array(items), PathSegment::Index(i)) => items.get(*i)?,
                (Value::Array(items), PathSegment::Key(key)) => {
                    items.get(key.parse::<usize>().ok()?)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Mutable counterpart of [`SchemaPath::lookup`].
    pub fn lookup_mut<'a>(&self, root: &'a mut Value) -> Option<&'a mut Value> {
        let mut current = root;
        for segment in &self.segments {
            current = match (current, segment) {
                (Value::Object(map), segment) => map.get_mut(segment.as_key().as_ref())?,
                (Value::Array(items), PathSegment::Index(i)) => items.get_mut(*i)?,
                (Value::Array(items), PathSegment::Key(key)) => {
                    items.get_mut(key.parse::<usize>().ok()?)?
                }
                _ => return None,
            };
        }
        Some(current)
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ref())
    }
}

impl Serialize for SchemaPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_pointer())
    }
}

/// Last segment of a reference string, unescaped.
///
/// `#/components/schemas/Cat` → `Cat`. Used as the implicit discriminator
/// option name when no mapping entry targets a reference.
pub fn ref_name(reference: &str) -> String {
    let fragment = reference
        .rsplit_once('#')
        .map_or(reference, |(_, fragment)| fragment);
    let last = fragment.rsplit('/').next().unwrap_or(fragment);
    unescape_pointer_segment(last).into_owned()
}

// ===========================================================================
// Tests
// ===========================================================================
