//! Field paths: `destinatari[0].ufficio` and friends.
//!
//! Key segments render as `.name` (bare at the start), index segments as `[n]`.
//! Decoding skips empty segments produced by doubled or dangling dots.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// Deepest path `parse` accepts, in segments.
pub const MAX_PATH_DEPTH: usize = 64;

/// Arrays never grow past this many items; indices address `0..MAX_ITEMS`.
pub const MAX_ITEMS: usize = 1000;

static CANONICAL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^.\[\]]+(\[\d+\])*(\.[^.\[\]]+(\[\d+\])*)*$").ok());

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,
    #[error("unterminated `[` at byte {0}")]
    Unterminated(usize),
    #[error("invalid index `{found}` at byte {at}")]
    InvalidIndex { at: usize, found: String },
    #[error("unexpected `]` at byte {0}")]
    StrayBracket(usize),
    #[error("path is deeper than {} segments", MAX_PATH_DEPTH)]
    TooDeep,
    #[error("index {index} exceeds the {}-item limit", MAX_ITEMS)]
    IndexTooLarge { index: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Child path for a property key.
    pub fn key(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key(name.into()));
        Self { segments }
    }

    /// Child path for an array position.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self { segments }
    }

    /// Copy of this path with the index segment at `depth` replaced.
    /// Paths that have no index at `depth` come back unchanged.
    pub fn with_index_at(&self, depth: usize, index: usize) -> Self {
        let mut segments = self.segments.clone();
        if let Some(Segment::Index(slot)) = segments.get_mut(depth) {
            *slot = index;
        }
        Self { segments }
    }

    pub fn parse(input: &str) -> Result<Self, PathError> {
        let mut segments = Vec::new();
        let mut key = String::new();
        let mut chars = input.char_indices();

        while let Some((at, ch)) = chars.next() {
            if segments.len() > MAX_PATH_DEPTH {
                return Err(PathError::TooDeep);
            }
            match ch {
                '.' => flush_key(&mut key, &mut segments),
                '[' => {
                    flush_key(&mut key, &mut segments);
                    let mut digits = String::new();
                    let mut closed = false;
                    for (_, inner) in chars.by_ref() {
                        if inner == ']' {
                            closed = true;
                            break;
                        }
                        digits.push(inner);
                    }
                    if !closed {
                        return Err(PathError::Unterminated(at));
                    }
                    let index = digits
                        .parse::<usize>()
                        .ok()
                        .filter(|_| digits.bytes().all(|b| b.is_ascii_digit()))
                        .ok_or(PathError::InvalidIndex { at, found: digits })?;
                    if index >= MAX_ITEMS {
                        return Err(PathError::IndexTooLarge { index });
                    }
                    segments.push(Segment::Index(index));
                }
                ']' => return Err(PathError::StrayBracket(at)),
                other => key.push(other),
            }
        }
        flush_key(&mut key, &mut segments);

        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        let path = Self { segments };
        path.check_limits()?;
        Ok(path)
    }

    /// Depth and index bounds for paths that were built rather than parsed.
    pub fn check_limits(&self) -> Result<(), PathError> {
        if self.segments.len() > MAX_PATH_DEPTH {
            return Err(PathError::TooDeep);
        }
        match self.segments.iter().find_map(|segment| match segment {
            Segment::Index(index) if *index >= MAX_ITEMS => Some(*index),
            _ => None,
        }) {
            Some(index) => Err(PathError::IndexTooLarge { index }),
            None => Ok(()),
        }
    }

    /// Whether `input` is written in the exact public grammar, without the
    /// leniency `parse` applies to empty segments.
    pub fn is_canonical(input: &str) -> bool {
        CANONICAL
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(input))
    }

    pub fn lookup<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(value, |current, segment| match segment {
                Segment::Key(name) => current.as_object()?.get(name),
                Segment::Index(index) => current.as_array()?.get(*index),
            })
    }

    pub fn lookup_mut<'a>(&self, value: &'a mut Value) -> Option<&'a mut Value> {
        self.segments
            .iter()
            .try_fold(value, |current, segment| match segment {
                Segment::Key(name) => current.as_object_mut()?.get_mut(name),
                Segment::Index(index) => current.as_array_mut()?.get_mut(*index),
            })
    }
}

fn flush_key(key: &mut String, segments: &mut Vec<Segment>) {
    if !key.is_empty() {
        segments.push(Segment::Key(std::mem::take(key)));
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(name) if position == 0 => f.write_str(name)?,
                Segment::Key(name) => write!(f, ".{name}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_keys_and_indices() {
        let path = FieldPath::parse("destinatari[0].ufficio").expect("path");
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("destinatari".into()),
                Segment::Index(0),
                Segment::Key("ufficio".into()),
            ]
        );
        assert_eq!(path.to_string(), "destinatari[0].ufficio");
    }

    #[test]
    fn encodes_scalar_items_without_trailing_key() {
        let path = FieldPath::root().key("items").index(2);
        assert_eq!(path.to_string(), "items[2]");
        assert_eq!(FieldPath::parse("items[2]").expect("path"), path);
    }

    #[test]
    fn ignores_empty_segments() {
        let path = FieldPath::parse(".a..b.").expect("path");
        assert_eq!(path.to_string(), "a.b");
        assert!(!FieldPath::is_canonical(".a..b."));
        assert!(FieldPath::is_canonical("a.b"));
    }

    #[test]
    fn accepts_nested_indices() {
        let path = FieldPath::parse("grid[0][1]").expect("path");
        assert_eq!(path.len(), 3);
        assert!(FieldPath::is_canonical("grid[0][1].cell"));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(FieldPath::parse(""), Err(PathError::Empty));
        assert_eq!(FieldPath::parse("..."), Err(PathError::Empty));
        assert_eq!(FieldPath::parse("a[1"), Err(PathError::Unterminated(1)));
        assert!(matches!(
            FieldPath::parse("a[x]"),
            Err(PathError::InvalidIndex { .. })
        ));
        assert!(matches!(
            FieldPath::parse("a[+1]"),
            Err(PathError::InvalidIndex { .. })
        ));
        assert_eq!(FieldPath::parse("a]"), Err(PathError::StrayBracket(1)));
    }

    #[test]
    fn rejects_paths_past_the_limits() {
        let deep = format!("a{}", ".a".repeat(200_000));
        assert_eq!(FieldPath::parse(&deep), Err(PathError::TooDeep));
        let at_limit = vec!["a"; MAX_PATH_DEPTH].join(".");
        assert_eq!(FieldPath::parse(&at_limit).map(|path| path.len()), Ok(MAX_PATH_DEPTH));

        assert_eq!(
            FieldPath::parse("x[4000000000].y"),
            Err(PathError::IndexTooLarge { index: 4_000_000_000 })
        );
        assert!(FieldPath::parse(&format!("x[{}]", MAX_ITEMS - 1)).is_ok());
        assert_eq!(
            FieldPath::root().key("x").index(MAX_ITEMS).check_limits(),
            Err(PathError::IndexTooLarge { index: MAX_ITEMS })
        );
    }

    #[test]
    fn rewrites_index_at_depth() {
        let path = FieldPath::parse("x[2].y[4].z").expect("path");
        assert_eq!(path.with_index_at(1, 1).to_string(), "x[1].y[4].z");
        assert_eq!(path.with_index_at(0, 9), path);
    }

    #[test]
    fn looks_up_values() {
        let data = json!({"x": [{"y": "a"}, {"y": "b"}]});
        let path = FieldPath::parse("x[1].y").expect("path");
        assert_eq!(path.lookup(&data), Some(&json!("b")));
        assert!(FieldPath::parse("x[5]").expect("path").lookup(&data).is_none());
    }
}
