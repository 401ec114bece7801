//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: cron jobs and CI scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                                   |
//! |---------|------------------|-----------------------------------------------|
//! | 0       | Universal        | Success                                       |
//! | 1       | Universal        | `check` found a non-canonical matrix (never an error) |
//! | 2       | Universal        | CLI usage error (bad args)                    |
//! | 3-9     | local files      | Reading or parsing a CI file                  |
//! | 10-19   | config           | Watchlist and keychain                        |
//! | 20-29   | feed             | Release feed                                  |
//! | 30-39   | dispatch         | Notification targets                          |
//! | 60-69   | github           | GitHub credentials and API                    |
//! | 70      | internal         | Unexpected failure inside bumpwatch           |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use bumpwatch_config::ConfigError;
use bumpwatch_matrix::MatrixError;

use crate::feed::FeedError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// `check` found a matrix that is not in canonical form.
/// Like `diff(1)`, exit 1 means "would change."
pub const EXIT_CHECK_DIFFERS: u8 = 1;

// =============================================================================
// Local files (3-9)
// =============================================================================

/// Cannot read or write a local CI file.
pub const EXIT_IO: u8 = 3;

/// A matrix line is malformed (empty, or a token that is not NAME=VALUE).
pub const EXIT_MATRIX_INVALID: u8 = 4;

/// The CI document is not YAML, or has no usable `env:` list.
pub const EXIT_DOCUMENT_INVALID: u8 = 5;

// =============================================================================
// Config (10-19)
// =============================================================================

/// Watchlist file missing or unreadable.
pub const EXIT_CONFIG_MISSING: u8 = 10;

/// Watchlist file does not parse or fails validation.
pub const EXIT_CONFIG_INVALID: u8 = 11;

/// Keychain error (cannot store credentials).
pub const EXIT_KEYCHAIN_ERR: u8 = 12;

// =============================================================================
// Feed (20-29)
// =============================================================================

/// Feed could not be fetched (network error, non-2xx status, unreadable file).
pub const EXIT_FEED_UNREACHABLE: u8 = 20;

/// Feed body is not well-formed XML.
pub const EXIT_FEED_MALFORMED: u8 = 21;

// =============================================================================
// Dispatch (30-39)
// =============================================================================

/// At least one target failed. Other targets still ran.
pub const EXIT_DISPATCH_FAILURES: u8 = 30;

// =============================================================================
// GitHub (60-69)
// =============================================================================

/// A `github` target is configured but no token is available.
/// Raised before any network access.
pub const EXIT_GITHUB_NOT_AUTH: u8 = 60;

/// The GitHub HTTP client could not be built.
pub const EXIT_GITHUB_CLIENT: u8 = 61;

// =============================================================================
// Internal (70)
// =============================================================================

/// Unexpected failure, e.g. the run report could not be serialized.
/// Kept apart from 1 so scripts never read it as "check differs".
pub const EXIT_INTERNAL: u8 = 70;

// =============================================================================
// Error mapping
// =============================================================================

/// Map a MatrixError to its exit code.
pub fn matrix_exit_code(err: &MatrixError) -> u8 {
    match err {
        MatrixError::EmptyLine { .. } | MatrixError::MalformedLine { .. } => EXIT_MATRIX_INVALID,
        MatrixError::Yaml(_)
        | MatrixError::NotAMapping
        | MatrixError::MissingEnv
        | MatrixError::EnvNotSequence
        | MatrixError::EnvEntryNotString { .. }
        | MatrixError::EnvNotInBlock
        | MatrixError::RewriteMismatch => EXIT_DOCUMENT_INVALID,
    }
}

pub fn config_exit_code(err: &ConfigError) -> u8 {
    match err {
        ConfigError::Io { .. } => EXIT_CONFIG_MISSING,
        ConfigError::Parse(_) | ConfigError::Validation(_) => EXIT_CONFIG_INVALID,
    }
}

pub fn feed_exit_code(err: &FeedError) -> u8 {
    match err {
        FeedError::Xml(_) => EXIT_FEED_MALFORMED,
        // Per-item errors never abort a poll; only reachable if a caller
        // promotes one.
        FeedError::UnparseableEntry { .. } => EXIT_FEED_MALFORMED,
        FeedError::Network(_) | FeedError::Http(_) | FeedError::Io { .. } => EXIT_FEED_UNREACHABLE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_codes() {
        let err = MatrixError::MalformedLine { line: 1, token: "X".into() };
        assert_eq!(matrix_exit_code(&err), EXIT_MATRIX_INVALID);
        assert_eq!(matrix_exit_code(&MatrixError::MissingEnv), EXIT_DOCUMENT_INVALID);
    }

    #[test]
    fn test_config_codes() {
        let err = ConfigError::Io { path: "x".into(), message: "gone".into() };
        assert_eq!(config_exit_code(&err), EXIT_CONFIG_MISSING);
        assert_eq!(config_exit_code(&ConfigError::Validation("bad".into())), EXIT_CONFIG_INVALID);
    }

    #[test]
    fn test_feed_codes() {
        assert_eq!(feed_exit_code(&FeedError::Http(503)), EXIT_FEED_UNREACHABLE);
        assert_eq!(feed_exit_code(&FeedError::Xml("eof".into())), EXIT_FEED_MALFORMED);
    }

    #[test]
    fn test_codes_are_distinct_outside_universal() {
        let codes = [
            EXIT_IO,
            EXIT_MATRIX_INVALID,
            EXIT_DOCUMENT_INVALID,
            EXIT_CONFIG_MISSING,
            EXIT_CONFIG_INVALID,
            EXIT_KEYCHAIN_ERR,
            EXIT_FEED_UNREACHABLE,
            EXIT_FEED_MALFORMED,
            EXIT_DISPATCH_FAILURES,
            EXIT_GITHUB_NOT_AUTH,
            EXIT_GITHUB_CLIENT,
            EXIT_INTERNAL,
        ];
        let unique: std::collections::BTreeSet<u8> = codes.iter().copied().collect();
        assert_eq!(unique.len(), codes.len());
        assert!(codes.iter().all(|c| *c > EXIT_USAGE));
    }

    #[test]
    fn test_check_differs_is_not_shared() {
        assert_eq!(EXIT_CHECK_DIFFERS, 1);
        assert_ne!(EXIT_INTERNAL, EXIT_CHECK_DIFFERS);
        assert_ne!(EXIT_GITHUB_CLIENT, EXIT_CHECK_DIFFERS);
    }
}
