//! Field paths for pinpointing problems inside a JSON document.

use std::fmt;

/// One step of a [`FieldPath`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object member
    Key(String),
    /// Array element
    Index(usize),
}

/// Location of a value inside a JSON document
///
/// Renders as `$.tools.redact.parameters.mode.enum[1]`. Paths are cheap
/// value types; `key` and `index` return extended copies so a parser can
/// hand a child path down without mutating its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// The document root (`$`)
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted key such as `training.batch_size` or `stages[1].batch_size`
    ///
    /// Empty components are dropped, so `""` is the root. A component whose
    /// brackets do not hold an index is taken as a plain key. This is the
    /// inverse of [`Self::to_dotted`].
    #[must_use]
    pub fn from_dotted(dotted: &str) -> Self {
        let mut segments = Vec::new();
        for part in dotted.split('.').filter(|part| !part.is_empty()) {
            match split_indices(part) {
                Some((name, indices)) => {
                    if !name.is_empty() {
                        segments.push(Segment::Key(name.to_string()));
                    }
                    segments.extend(indices.into_iter().map(Segment::Index));
                }
                None => segments.push(Segment::Key(part.to_string())),
            }
        }
        Self { segments }
    }

    /// Child path for an object member
    #[must_use]
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut child = self.clone();
        child.segments.push(Segment::Key(key.into()));
        child
    }

    /// Child path for an array element
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut child = self.clone();
        child.segments.push(Segment::Index(index));
        child
    }

    /// Whether this is the document root
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Path segments from the root down
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Last object key on the path, if any
    #[must_use]
    pub fn leaf_key(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(|s| match s {
            Segment::Key(k) => Some(k.as_str()),
            Segment::Index(_) => None,
        })
    }

    /// Render without the `$.` prefix, as used for config keys
    #[must_use]
    pub fn to_dotted(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Key(k) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(k);
                }
                Segment::Index(i) => out.push_str(&format!("[{}]", i)),
            }
        }
        out
    }
}

/// Split `name[1][2]` into its name and indices
fn split_indices(part: &str) -> Option<(&str, Vec<usize>)> {
    let Some(open) = part.find('[') else {
        return Some((part, Vec::new()));
    };
    let (name, mut rest) = part.split_at(open);
    let mut indices = Vec::new();
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        indices.push(inner[..close].parse().ok()?);
        rest = &inner[close + 1..];
    }
    Some((name, indices))
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for segment in &self.segments {
            match segment {
                Segment::Key(k) => write!(f, ".{}", k)?,
                Segment::Index(i) => write!(f, "[{}]", i)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_display() {
        assert_eq!(FieldPath::root().to_string(), "$");
        assert!(FieldPath::root().is_root());
    }

    #[test]
    fn test_nested_display() {
        let path = FieldPath::root()
            .key("redact")
            .key("parameters")
            .key("mode")
            .key("enum")
            .index(1);
        assert_eq!(path.to_string(), "$.redact.parameters.mode.enum[1]");
    }

    #[test]
    fn test_child_does_not_mutate_parent() {
        let parent = FieldPath::root().key("a");
        let _child = parent.key("b");
        assert_eq!(parent.to_string(), "$.a");
    }

    #[test]
    fn test_dotted_roundtrip() {
        let path = FieldPath::from_dotted("training.optimizer.betas");
        assert_eq!(path.to_dotted(), "training.optimizer.betas");
        assert_eq!(path.leaf_key(), Some("betas"));
        assert!(FieldPath::from_dotted("").is_root());
    }

    #[test]
    fn test_dotted_with_indices() {
        let path = FieldPath::from_dotted("stages[1].batch_size");
        assert_eq!(
            path,
            FieldPath::root().key("stages").index(1).key("batch_size")
        );
        assert_eq!(path.to_dotted(), "stages[1].batch_size");

        let nested = FieldPath::from_dotted("grid[0][2]");
        assert_eq!(nested, FieldPath::root().key("grid").index(0).index(2));
    }

    #[test]
    fn test_dotted_malformed_brackets_are_keys() {
        assert_eq!(
            FieldPath::from_dotted("weights[x]"),
            FieldPath::root().key("weights[x]")
        );
        assert_eq!(
            FieldPath::from_dotted("weights[1"),
            FieldPath::root().key("weights[1")
        );
    }

    #[test]
    fn test_leaf_key_skips_indices() {
        let path = FieldPath::root().key("documents").index(3);
        assert_eq!(path.leaf_key(), Some("documents"));
        assert_eq!(path.to_dotted(), "documents[3]");
    }
}
