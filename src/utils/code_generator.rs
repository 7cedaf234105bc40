//! Short path generation.
//!
//! A short path is the owner prefix (bytes `25..33` of the owner id) followed
//! by `/` and eight random alphanumeric characters, e.g. `z1234567/Kq3xT9bA`.

use crate::error::AppError;
use serde_json::json;

/// Alphabet for the random tail.
const ALPHABET: &[u8; 62] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Number of random characters after the separator.
const RANDOM_LEN: usize = 8;

/// Byte range of the owner id used as the path prefix.
const PREFIX_RANGE: std::ops::Range<usize> = 25..33;

/// Returns the short path prefix of `owner_id`.
///
/// The prefix becomes the first segment of the redirect URL, so it may only
/// contain unreserved URL characters (`A-Z a-z 0-9 - _ . ~`).
///
/// # Errors
///
/// Returns [`AppError::Validation`] if the owner id is shorter than 33 bytes
/// or the prefix contains any other character.
pub fn owner_prefix(owner_id: &str) -> Result<&str, AppError> {
    let prefix = owner_id.get(PREFIX_RANGE).ok_or_else(|| {
        AppError::bad_request(
            "Owner id is too short to derive a short path",
            json!({ "owner_id_length": owner_id.len(), "required": PREFIX_RANGE.end }),
        )
    })?;

    if !prefix.bytes().all(is_unreserved) {
        return Err(AppError::bad_request(
            "Owner id cannot be used in a short path",
            json!({ "prefix": prefix, "allowed": "A-Z a-z 0-9 - _ . ~" }),
        ));
    }

    Ok(prefix)
}

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~')
}

/// Generates a new short path for `owner_id`.
///
/// Uniqueness is not checked here; the store's `UNIQUE(short)` constraint
/// rejects the rare collision.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if [`owner_prefix`] rejects the owner id.
///
/// Returns [`AppError::Entropy`] if the system random source fails.
///
/// # Examples
///
/// ```ignore
/// let short = generate_short_path("abcdefghijklmnopqrstuvwxyz1234567890")?;
/// assert!(short.starts_with("z1234567/"));
/// assert_eq!(short.len(), 17);
/// ```
pub fn generate_short_path(owner_id: &str) -> Result<String, AppError> {
    let prefix = owner_prefix(owner_id)?;

    let mut buffer = [0u8; RANDOM_LEN];
    getrandom::fill(&mut buffer).map_err(|e| AppError::entropy(e.to_string()))?;

    let mut short = String::with_capacity(prefix.len() + 1 + RANDOM_LEN);
    short.push_str(prefix);
    short.push('/');
    short.extend(
        buffer
            .iter()
            .map(|byte| ALPHABET[usize::from(*byte) % ALPHABET.len()] as char),
    );

    Ok(short)
}

/// Joins the public base URL and a short path.
pub fn short_url(base_url: &str, short: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), short)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const OWNER: &str = "abcdefghijklmnopqrstuvwxyz1234567890";

    #[test]
    fn test_generate_short_path_shape() {
        let short = generate_short_path(OWNER).unwrap();

        assert_eq!(short.len(), 17);
        assert!(short.starts_with("z1234567/"));
        assert!(short[9..].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_short_path_for_uuid_owner() {
        let owner = "3f2b8c4e-9a1d-4e7f-b6c5-0d8e2a4f6b1c";
        let short = generate_short_path(owner).unwrap();

        assert_eq!(&short[..9], "d8e2a4f6/");
        assert_eq!(short.len(), 17);
    }

    #[test]
    fn test_generate_short_path_minimum_owner_length() {
        let owner = "a".repeat(33);
        assert!(generate_short_path(&owner).is_ok());
    }

    #[test]
    fn test_generate_short_path_rejects_short_owner() {
        let owner = "a".repeat(32);
        let err = generate_short_path(&owner).unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
        assert!(generate_short_path("").is_err());
    }

    #[test]
    fn test_generate_short_path_rejects_split_character() {
        // 24 ASCII bytes then a 2-byte char straddling offset 25
        let owner = format!("{}é{}", "a".repeat(24), "b".repeat(20));
        assert!(matches!(
            generate_short_path(&owner),
            Err(AppError::Validation { .. })
        ));
    }

    #[test]
    fn test_generate_short_path_rejects_unroutable_prefix() {
        for bad in ["abc/defg", "abc?defg", "abc#defg", "abc%2Fde", "abc defg"] {
            let owner = format!("{}{bad}XYZ", "o".repeat(25));
            assert!(
                matches!(
                    generate_short_path(&owner),
                    Err(AppError::Validation { .. })
                ),
                "prefix {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_owner_prefix_accepts_unreserved_characters() {
        let owner = format!("{}a-b_c.~9XYZ", "o".repeat(25));
        assert_eq!(owner_prefix(&owner).unwrap(), "a-b_c.~9");
    }

    #[test]
    fn test_generate_short_path_tails_differ() {
        let tails: HashSet<String> = (0..500)
            .map(|_| generate_short_path(OWNER).unwrap()[9..].to_string())
            .collect();

        assert!(tails.len() > 490);
    }

    #[test]
    fn test_short_url_joins_base() {
        assert_eq!(
            short_url("https://s.example.com/", "z1234567/AbCd1234"),
            "https://s.example.com/z1234567/AbCd1234"
        );
        assert_eq!(
            short_url("http://localhost:3000", "p/x"),
            "http://localhost:3000/p/x"
        );
    }
}
