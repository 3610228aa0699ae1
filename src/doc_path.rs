//! Validation of caller-supplied documentation paths.
//!
//! [`validate`] is the only way to obtain the path component that
//! [`crate::fetch`] interpolates into an outbound URL. The input is
//! percent-decoded up to three times so that multiply-encoded traversal
//! (`%252e%252e`) is caught, then every segment must be drawn from
//! `[A-Za-z0-9_-]`.

use crate::error::PathError;

pub const MAX_PATH_LENGTH: usize = 200;
const MAX_DECODE_ROUNDS: usize = 3;

/// Normalize and validate `path`, returning the safe relative path.
///
/// Leading slashes are ignored.
pub fn validate(path: &str) -> Result<String, PathError> {
    let path = path.trim_start_matches('/');

    if path.chars().count() > MAX_PATH_LENGTH {
        return Err(PathError::TooLong);
    }
    if path.trim().is_empty() {
        return Err(PathError::Empty);
    }

    let decoded = decode_until_stable(path)?;

    if decoded.contains("..") {
        return Err(PathError::Traversal);
    }
    if decoded.chars().any(|c| c <= '\u{1f}' || c == '\u{7f}') {
        return Err(PathError::ControlCharacter);
    }

    let segments: Vec<&str> = decoded.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(PathError::Empty);
    }
    if segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(PathError::RelativeSegment);
    }
    if !segments.iter().all(|s| is_valid_segment(s)) {
        return Err(PathError::DisallowedCharacter);
    }

    Ok(segments.join("/"))
}

fn is_valid_segment(segment: &str) -> bool {
    segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn decode_until_stable(path: &str) -> Result<String, PathError> {
    let mut current = path.to_string();
    for _ in 0..MAX_DECODE_ROUNDS {
        let next = decode_once(&current)?;
        if next == current {
            break;
        }
        current = next;
    }
    Ok(current)
}

/// One round of strict percent-decoding.
///
/// A `%` not followed by two hex digits, or escapes that do not form valid
/// UTF-8, are errors rather than being passed through.
fn decode_once(s: &str) -> Result<String, PathError> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while let Some(offset) = bytes[i..].iter().position(|&b| b == b'%') {
        let at = i + offset;
        let well_formed = bytes
            .get(at + 1..at + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !well_formed {
            return Err(PathError::MalformedEncoding);
        }
        i = at + 3;
    }

    urlencoding::decode(s)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| PathError::MalformedEncoding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_paths_unchanged() {
        assert_eq!(validate("guides/function-calling").unwrap(), "guides/function-calling");
        assert_eq!(validate("models").unwrap(), "models");
        assert_eq!(validate("api_reference/v1").unwrap(), "api_reference/v1");
    }

    #[test]
    fn strips_leading_slashes_and_empty_segments() {
        assert_eq!(validate("///guides//tools/").unwrap(), "guides/tools");
    }

    #[test]
    fn rejects_traversal_in_every_encoding() {
        assert_eq!(validate("a/../b"), Err(PathError::Traversal));
        assert_eq!(validate("a/%2e%2e/b"), Err(PathError::Traversal));
        assert_eq!(validate("a/%252e%252e/b"), Err(PathError::Traversal));
        assert_eq!(validate("../etc/passwd"), Err(PathError::Traversal));
        assert_eq!(validate("..%2fetc"), Err(PathError::Traversal));
    }

    #[test]
    fn rejects_control_characters() {
        assert_eq!(validate("a\u{0000}b"), Err(PathError::ControlCharacter));
        assert_eq!(validate("a%00b"), Err(PathError::ControlCharacter));
        assert_eq!(validate("a%0Ab"), Err(PathError::ControlCharacter));
        assert_eq!(validate("a\u{7f}"), Err(PathError::ControlCharacter));
    }

    #[test]
    fn rejects_dot_segment() {
        assert_eq!(validate("a/./b"), Err(PathError::RelativeSegment));
    }

    #[test]
    fn rejects_disallowed_characters() {
        for bad in ["a b", "a?x=1", "a#frag", "a.html", "user@host", "caf%C3%A9", "a:b"] {
            assert_eq!(validate(bad), Err(PathError::DisallowedCharacter), "{bad}");
        }
    }

    #[test]
    fn rejects_malformed_encoding() {
        assert_eq!(validate("a%zz"), Err(PathError::MalformedEncoding));
        assert_eq!(validate("a%2"), Err(PathError::MalformedEncoding));
        assert_eq!(validate("a%ff"), Err(PathError::MalformedEncoding));
    }

    #[test]
    fn rejects_empty_and_oversized() {
        assert_eq!(validate(""), Err(PathError::Empty));
        assert_eq!(validate("   "), Err(PathError::Empty));
        assert_eq!(validate("/"), Err(PathError::Empty));
        assert_eq!(validate("%2F%2F"), Err(PathError::Empty));
        assert_eq!(validate(&"a".repeat(MAX_PATH_LENGTH + 1)), Err(PathError::TooLong));
        assert!(validate(&"a".repeat(MAX_PATH_LENGTH)).is_ok());
    }

    #[test]
    fn error_messages_are_user_facing() {
        assert_eq!(
            validate("../x").unwrap_err().to_string(),
            "Invalid path: path traversal not allowed"
        );
    }
}
