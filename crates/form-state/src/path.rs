//! Dotted field paths.
//!
//! A path addresses a location in a form's value tree. It is a sequence of
//! segments, each either a record key or a sequence index, and is written as
//! a dot-joined string: `"friends.0.name"`.
//!
//! Parsing is purely lexical. A segment spelling a `usize` in canonical
//! decimal (no leading zeros) becomes an index, anything else becomes a key.
//! Literal dots inside keys cannot be expressed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single segment in a field path.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seg {
    /// Record key: `{"key": value}`
    Key(String),
    /// Sequence index: `[index]`
    Index(usize),
}

impl Seg {
    /// Parse one dotted segment.
    ///
    /// Only the canonical decimal spelling of a `usize` is an index. Other
    /// digit strings (`"007"`, or values too large for `usize`) stay keys so
    /// their text keeps addressing the record entry it names.
    pub fn parse(raw: &str) -> Self {
        let canonical = match raw.as_bytes() {
            [] => false,
            [b'0'] => true,
            [b'0', ..] => false,
            bytes => bytes.iter().all(u8::is_ascii_digit),
        };
        if canonical {
            if let Ok(i) = raw.parse::<usize>() {
                return Seg::Index(i);
            }
        }
        Seg::Key(raw.to_owned())
    }

    /// The key this segment resolves to when it lands on a record.
    ///
    /// Index segments only come from canonical spellings, so their decimal
    /// form is the text they were parsed from and `"0"` keys stay addressable.
    pub fn record_key(&self) -> String {
        match self {
            Seg::Key(k) => k.clone(),
            Seg::Index(i) => i.to_string(),
        }
    }
}

impl fmt::Display for Seg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seg::Key(k) => f.write_str(k),
            Seg::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<String> for Seg {
    fn from(s: String) -> Self {
        Seg::Key(s)
    }
}

impl From<&str> for Seg {
    fn from(s: &str) -> Self {
        Seg::Key(s.to_owned())
    }
}

impl From<usize> for Seg {
    fn from(i: usize) -> Self {
        Seg::Index(i)
    }
}

/// A complete path into a value tree.
///
/// # Examples
///
/// ```
/// use form_state::{parse_path, Path};
///
/// let path = Path::root().key("friends").index(0).key("name");
/// assert_eq!(path.to_string(), "friends.0.name");
/// assert_eq!(parse_path("friends.0.name"), path);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Path(Vec<Seg>);

impl Path {
    /// The empty path, addressing the whole tree.
    #[inline]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    #[inline]
    pub fn from_segments(segments: Vec<Seg>) -> Self {
        Self(segments)
    }

    /// Append a key segment (builder style).
    #[inline]
    pub fn key(mut self, k: impl Into<String>) -> Self {
        self.0.push(Seg::Key(k.into()));
        self
    }

    /// Append an index segment (builder style).
    #[inline]
    pub fn index(mut self, i: usize) -> Self {
        self.0.push(Seg::Index(i));
        self
    }

    #[inline]
    pub fn push(&mut self, seg: Seg) {
        self.0.push(seg);
    }

    #[inline]
    pub fn pop(&mut self) -> Option<Seg> {
        self.0.pop()
    }

    #[inline]
    pub fn segments(&self) -> &[Seg] {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Seg> {
        self.0.iter()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", seg)?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(parse_path(s))
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        parse_path(s)
    }
}

impl FromIterator<Seg> for Path {
    fn from_iter<I: IntoIterator<Item = Seg>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Seg;
    type IntoIter = std::slice::Iter<'a, Seg>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Parse a dot-separated path string into a `Path`.
///
/// Empty segments are skipped, so `""` is the root and `"a..b"` equals `"a.b"`.
pub fn parse_path(path: &str) -> Path {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .map(Seg::parse)
        .collect()
}

/// Whether the dotted `path` equals `prefix` or lies below it.
///
/// Comparison is per segment: `"friends.1"` is within `"friends"` but
/// `"friendship"` is not.
pub fn path_is_within(path: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}

/// Construct a `Path` from a sequence of segments.
///
/// ```
/// use form_state::path;
///
/// let p = path!("friends", 0, "name");
/// assert_eq!(p.to_string(), "friends.0.name");
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::Path::root()
    };
    ($($seg:expr),+ $(,)?) => {{
        let mut p = $crate::Path::root();
        $(
            p.push($crate::Seg::from($seg));
        )+
        p
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_segments_as_indices() {
        let p = parse_path("friends.0.name");
        assert_eq!(
            p.segments(),
            [Seg::Key("friends".into()), Seg::Index(0), Seg::Key("name".into())]
        );
    }

    #[test]
    fn test_parse_mixed_segment_is_key() {
        let p = parse_path("a.0b.-1");
        assert_eq!(p.segments()[1], Seg::Key("0b".into()));
        assert_eq!(p.segments()[2], Seg::Key("-1".into()));
    }

    #[test]
    fn test_parse_non_canonical_digits_as_keys() {
        assert_eq!(parse_path("code.007").segments()[1], Seg::Key("007".into()));
        assert_eq!(parse_path("x.0").segments()[1], Seg::Index(0));
        assert_eq!(parse_path("x.10").segments()[1], Seg::Index(10));
        // Wider than usize: kept as text.
        let huge = "184467440737095516150000";
        assert_eq!(parse_path(huge).segments()[0], Seg::Key(huge.into()));
        assert_eq!(parse_path("code.007").to_string(), "code.007");
    }

    #[test]
    fn test_parse_empty_is_root() {
        assert!(parse_path("").is_empty());
        assert_eq!(parse_path("a..b"), path!("a", "b"));
    }

    #[test]
    fn test_display_round_trips() {
        for raw in ["name", "friends.0.name", "a.b.c.10"] {
            assert_eq!(parse_path(raw).to_string(), raw);
        }
        assert_eq!(Path::root().to_string(), "");
    }

    #[test]
    fn test_macro_matches_parse() {
        assert_eq!(path!("friends", 0, "age"), parse_path("friends.0.age"));
        assert_eq!("x.1".parse::<Path>().unwrap(), path!("x", 1));
    }

    #[test]
    fn test_path_is_within() {
        assert!(path_is_within("friends.0.name", "friends"));
        assert!(path_is_within("friends", "friends"));
        assert!(path_is_within("anything", ""));
        assert!(!path_is_within("friendship", "friends"));
        assert!(!path_is_within("friends", "friends.0"));
    }

    #[test]
    fn test_record_key_for_index() {
        assert_eq!(Seg::Index(3).record_key(), "3");
        assert_eq!(Seg::Key("x".into()).record_key(), "x");
    }
}
