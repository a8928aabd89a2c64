//! Helpers for validating identifiers before they are joined into filesystem paths.
//!
//! Namespaces, resource names and entry keys all become exactly one path
//! component below the output root. Anything that could resolve to a
//! different directory is rejected instead of being rewritten.

use thiserror::Error;

/// Reasons a string cannot be used as a single path segment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} must not be '.' or '..'")]
    Relative(&'static str),

    #[error("{what} must not contain {found:?}")]
    ForbiddenChar { what: &'static str, found: char },
}

const FORBIDDEN: &[char] = &['/', '\\', '\0'];

/// Checks that `value` is usable as one path component.
///
/// `what` names the value in the error (e.g. "namespace").
pub fn validate_segment(what: &'static str, value: &str) -> Result<(), SegmentError> {
    if value.is_empty() {
        return Err(SegmentError::Empty(what));
    }
    if value == "." || value == ".." {
        return Err(SegmentError::Relative(what));
    }
    if let Some(found) = value.chars().find(|c| FORBIDDEN.contains(c)) {
        return Err(SegmentError::ForbiddenChar { what, found });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names_are_accepted() {
        assert!(validate_segment("name", "my-dashboard").is_ok());
        assert!(validate_segment("key", "node-exporter.json").is_ok());
        assert!(validate_segment("key", "..hidden.json").is_ok());
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(
            validate_segment("namespace", ""),
            Err(SegmentError::Empty("namespace"))
        );
    }

    #[test]
    fn test_dot_segments_rejected() {
        assert!(matches!(
            validate_segment("name", ".."),
            Err(SegmentError::Relative("name"))
        ));
        assert!(matches!(
            validate_segment("name", "."),
            Err(SegmentError::Relative("name"))
        ));
    }

    #[test]
    fn test_separators_rejected() {
        assert_eq!(
            validate_segment("key", "../../etc/passwd.json"),
            Err(SegmentError::ForbiddenChar {
                what: "key",
                found: '/'
            })
        );
        assert!(validate_segment("key", "a\\b.json").is_err());
        assert!(validate_segment("key", "nul\0.json").is_err());
    }
}
