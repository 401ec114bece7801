// GitHub credential lookup
//
// The token is resolved from:
// 1. Environment variable (GITHUB_TOKEN, for CI/headless)
// 2. System keychain
//
// Tokens are NEVER stored in watchlist.toml

use std::env;

pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// Service name for keychain storage
#[cfg(feature = "keychain")]
const KEYCHAIN_SERVICE: &str = "bumpwatch";

#[cfg(feature = "keychain")]
const KEYCHAIN_ACCOUNT: &str = "github";

/// Source of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    Keychain,
    None,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Environment => "environment",
            KeySource::Keychain => "keychain",
            KeySource::None => "none",
        }
    }
}

/// Result of token lookup
#[derive(Debug, Clone)]
pub struct TokenLookup {
    pub token: Option<String>,
    pub source: KeySource,
}

impl TokenLookup {
    pub fn none() -> Self {
        Self { token: None, source: KeySource::None }
    }

    pub fn from_env_value(value: Option<String>) -> Self {
        match value.map(|v| v.trim().to_string()) {
            Some(token) if !token.is_empty() => Self {
                token: Some(token),
                source: KeySource::Environment,
            },
            _ => Self::none(),
        }
    }
}

/// Get the GitHub token
///
/// Checks in order:
/// 1. GITHUB_TOKEN
/// 2. System keychain (feature `keychain`)
pub fn github_token() -> TokenLookup {
    let lookup = TokenLookup::from_env_value(env::var(TOKEN_ENV_VAR).ok());
    if lookup.token.is_some() {
        return lookup;
    }

    #[cfg(feature = "keychain")]
    {
        if let Ok(entry) = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT) {
            if let Ok(token) = entry.get_password() {
                return TokenLookup {
                    token: Some(token),
                    source: KeySource::Keychain,
                };
            }
        }
    }

    TokenLookup::none()
}

/// Store the GitHub token in the system keychain
#[cfg(feature = "keychain")]
pub fn set_github_token(token: &str) -> Result<(), String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT)
        .map_err(|e| format!("Failed to create keychain entry: {}", e))?;

    entry
        .set_password(token)
        .map_err(|e| format!("Failed to store token in keychain: {}", e))
}

#[cfg(not(feature = "keychain"))]
pub fn set_github_token(_token: &str) -> Result<(), String> {
    Err(format!("Keychain support not enabled. Set {TOKEN_ENV_VAR} instead."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_value_is_trimmed() {
        let lookup = TokenLookup::from_env_value(Some("  ghp_abc \n".into()));
        assert_eq!(lookup.token.as_deref(), Some("ghp_abc"));
        assert_eq!(lookup.source, KeySource::Environment);
    }

    #[test]
    fn blank_env_value_is_no_token() {
        let lookup = TokenLookup::from_env_value(Some("   ".into()));
        assert!(lookup.token.is_none());
        assert_eq!(lookup.source, KeySource::None);
        assert!(TokenLookup::from_env_value(None).token.is_none());
    }

    #[test]
    fn source_names() {
        assert_eq!(KeySource::Environment.as_str(), "environment");
        assert_eq!(KeySource::None.as_str(), "none");
    }
}
