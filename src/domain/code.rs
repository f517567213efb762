use std::{fmt, num::NonZeroU32, str::FromStr};

use serde::{Deserialize, Serialize};

/// Deepest level a title may be nested at.
pub const MAX_LEVEL: usize = 10;

/// A hierarchical, dot-separated code such as `01.02.03`.
///
/// Every segment is a positive sequence number. Segments are rendered
/// zero-padded to two digits; numbers above 99 simply widen.
///
/// Codes of titles and line items are never written by hand in ACU text, they
/// are assigned while parsing. A child's code is always its parent's code with
/// one more segment appended.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Code(Vec<NonZeroU32>);

impl Code {
    /// Create a single-segment (root level) code.
    #[must_use]
    pub fn root(sequence: NonZeroU32) -> Self {
        Self(vec![sequence])
    }

    /// Create a code from its segments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`] if `segments` is empty.
    pub fn from_segments(segments: Vec<NonZeroU32>) -> Result<Self, Error> {
        if segments.is_empty() {
            return Err(Error::Empty);
        }
        Ok(Self(segments))
    }

    /// Returns the code of a child with the given sequence number.
    #[must_use]
    pub fn child(&self, sequence: NonZeroU32) -> Self {
        let mut segments = self.0.clone();
        segments.push(sequence);
        Self(segments)
    }

    /// Returns the parent code, or `None` for a root-level code.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        match self.0.split_last() {
            Some((_, rest)) if !rest.is_empty() => Some(Self(rest.to_vec())),
            _ => None,
        }
    }

    /// Returns the segments of the code.
    #[must_use]
    pub fn segments(&self) -> &[NonZeroU32] {
        &self.0
    }

    /// Number of segments, which equals the nesting depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// The last segment: the sequence number within the parent.
    #[must_use]
    pub fn sequence(&self) -> NonZeroU32 {
        // a code always holds at least one segment
        self.0[self.0.len() - 1]
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (index, segment) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment:02}")?;
        }
        Ok(())
    }
}

/// Errors that can occur while parsing a code string.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// A code needs at least one segment.
    #[error("Invalid code: a code needs at least one segment")]
    Empty,

    /// A segment is not a positive integer.
    #[error("Invalid segment in code '{0}': expected a positive integer, got '{1}'")]
    Segment(String, String),
}

impl FromStr for Code {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::Empty);
        }

        let segments = s
            .split('.')
            .map(|segment| {
                if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(Error::Segment(s.to_string(), segment.to_string()));
                }
                segment
                    .parse::<u32>()
                    .ok()
                    .and_then(NonZeroU32::new)
                    .ok_or_else(|| Error::Segment(s.to_string(), segment.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self(segments))
    }
}

impl TryFrom<&str> for Code {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value)
    }
}

impl TryFrom<String> for Code {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value)
    }
}

impl From<Code> for String {
    fn from(code: Code) -> Self {
        code.to_string()
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn nz(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test_case(&[1], "01"; "single segment")]
    #[test_case(&[1, 2], "01.02"; "two segments")]
    #[test_case(&[3, 10, 7], "03.10.07"; "three segments")]
    #[test_case(&[100], "100"; "widens past two digits")]
    fn display(segments: &[u32], expected: &str) {
        let code = Code::from_segments(segments.iter().copied().map(nz).collect()).unwrap();
        assert_eq!(code.to_string(), expected);
    }

    #[test]
    fn child_appends_a_segment() {
        let code = Code::root(nz(2)).child(nz(5));
        assert_eq!(code.to_string(), "02.05");
        assert_eq!(code.depth(), 2);
        assert_eq!(code.sequence().get(), 5);
    }

    #[test]
    fn parent_drops_the_last_segment() {
        let code: Code = "01.02.03".parse().unwrap();
        assert_eq!(code.parent().unwrap().to_string(), "01.02");
        assert_eq!(code.parent().unwrap().parent().unwrap().to_string(), "01");
        assert!(Code::root(nz(1)).parent().is_none());
    }

    #[test]
    fn parses_unpadded_segments() {
        let code: Code = "1.2".parse().unwrap();
        assert_eq!(code, "01.02".parse().unwrap());
    }

    #[test_case(""; "empty")]
    #[test_case("01..02"; "empty segment")]
    #[test_case("01.ab"; "letters")]
    #[test_case("00"; "zero")]
    #[test_case("-1"; "negative")]
    fn rejects_invalid_codes(input: &str) {
        assert!(Code::from_str(input).is_err());
    }

    #[test]
    fn empty_segments_are_rejected() {
        assert_eq!(Code::from_segments(Vec::new()), Err(Error::Empty));
    }

    #[test]
    fn serializes_as_string() {
        let code: Code = "01.02".parse().unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"01.02\"");
        let back: Code = serde_json::from_str(&json).unwrap();
        assert_eq!(back, code);
    }

    #[test]
    fn error_display() {
        let error = Code::from_str("01.x").unwrap_err();
        assert_eq!(
            error.to_string(),
            "Invalid segment in code '01.x': expected a positive integer, got 'x'"
        );
    }
}
