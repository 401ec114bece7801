// bumpwatch - keep CI build matrices in sync with a package release feed

pub mod dispatch;
pub mod exit_codes;
pub mod feed;
pub mod logging;
pub mod targets;

use bumpwatch_config::ConfigError;
use bumpwatch_github::GithubError;
use bumpwatch_matrix::MatrixError;

use feed::FeedError;

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(exit_codes::EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(exit_codes::EXIT_IO, msg)
    }

    /// Matrix or CI document error, prefixed with where it came from.
    pub fn matrix(origin: &str, err: MatrixError) -> Self {
        Self::new(exit_codes::matrix_exit_code(&err), format!("{origin}: {err}"))
    }

    pub fn config(err: ConfigError) -> Self {
        let code = exit_codes::config_exit_code(&err);
        let hint = match &err {
            ConfigError::Io { .. } => Some("create it, or pass --config <PATH>".to_string()),
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    pub fn feed(err: FeedError) -> Self {
        Self::new(exit_codes::feed_exit_code(&err), err.to_string())
    }

    pub fn github(err: GithubError) -> Self {
        match err {
            GithubError::MissingCredential => Self {
                code: exit_codes::EXIT_GITHUB_NOT_AUTH,
                message: "a github target is configured but no token is available".to_string(),
                hint: Some(format!(
                    "set {} or run `bumpwatch login`",
                    bumpwatch_config::TOKEN_ENV_VAR
                )),
            },
            other => Self::new(exit_codes::EXIT_GITHUB_CLIENT, other.to_string()),
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_maps_to_60() {
        let err = CliError::github(GithubError::MissingCredential);
        assert_eq!(err.code, 60);
        assert!(err.hint.unwrap().contains("GITHUB_TOKEN"));
    }

    #[test]
    fn test_other_github_errors_are_not_check_differs() {
        let err = CliError::github(GithubError::Network("tls backend unavailable".into()));
        assert_eq!(err.code, exit_codes::EXIT_GITHUB_CLIENT);
        assert_ne!(err.code, exit_codes::EXIT_CHECK_DIFFERS);
    }

    #[test]
    fn test_matrix_error_names_origin() {
        let err = CliError::matrix(".travis.yml", MatrixError::MissingEnv);
        assert_eq!(err.code, exit_codes::EXIT_DOCUMENT_INVALID);
        assert_eq!(err.message, ".travis.yml: CI document has no 'env' field");
    }
}
