//! Node name validation.

use crate::error::{FsError, Result};

/// Path separator
pub const SEPARATOR: char = '/';

/// Name stored on the root row. Contains `?`, so no user name can collide with it.
pub const ROOT_NAME: &str = "___?root?___";

/// Characters a name may not contain
pub const FORBIDDEN_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

const TRIMMED: &[char] = &[' ', '\r', '\n', '\t'];

/// Trim surrounding whitespace and check what remains; returns the name to store.
/// Control characters are rejected anywhere in the trimmed name.
pub fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim_matches(TRIMMED);
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(FORBIDDEN_CHARS)
        || trimmed.contains(char::is_control)
    {
        return Err(FsError::InvalidName(name.to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(validate_name("  notes.txt\t\r\n").unwrap(), "notes.txt");
    }

    #[test]
    fn test_rejects_reserved_and_empty() {
        for bad in ["", "   ", ".", "..", " .. ", "a/b", "a\\b", "what?", "x|y", "\"q\""] {
            assert_eq!(
                validate_name(bad),
                Err(FsError::InvalidName(bad.to_string())),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_rejects_control_characters() {
        for bad in ["a\0b", "\0", "tab\tinside", "bell\u{7}", "del\u{7f}"] {
            assert_eq!(
                validate_name(bad),
                Err(FsError::InvalidName(bad.to_string())),
                "{bad:?}"
            );
        }
        assert_eq!(validate_name("\tedge\n").unwrap(), "edge");
    }

    #[test]
    fn test_dots_inside_names_are_fine() {
        assert_eq!(validate_name("...").unwrap(), "...");
        assert_eq!(validate_name(".hidden").unwrap(), ".hidden");
    }

    #[test]
    fn test_root_name_is_not_a_valid_name() {
        assert!(validate_name(ROOT_NAME).is_err());
    }

    proptest! {
        #[test]
        fn valid_names_are_stable(name in "[a-zA-Z0-9_ .-]{1,40}") {
            if let Ok(stored) = validate_name(&name) {
                prop_assert_eq!(validate_name(&stored).unwrap(), stored.clone());
                prop_assert!(!stored.starts_with(' ') && !stored.ends_with(' '));
            }
        }
    }
}
