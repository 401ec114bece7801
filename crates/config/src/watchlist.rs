// Watchlist configuration
// Loaded from ~/.config/bumpwatch/watchlist.toml
//
// Maps a package name (as the release feed publishes it) to the CI files
// that should be reconciled when that package ships a new version.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_FEED_URL: &str = "https://pypi.org/rss/updates.xml";
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Could not read the config file.
    #[error("cannot read {path}: {message}")]
    Io { path: String, message: String },

    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    Parse(String),

    /// Parsed fine, but a value is unusable.
    #[error("config validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchConfig {
    #[serde(default)]
    pub feed: FeedSettings,
    #[serde(default)]
    pub github: GithubSettings,
    /// Package name → targets to reconcile on a new release.
    #[serde(default)]
    pub packages: BTreeMap<String, Vec<TargetConfig>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GithubSettings {
    pub api_base: String,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// One CI file to keep in sync with a package's releases.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TargetConfig {
    #[serde(default)]
    pub kind: TargetKind,
    /// `owner/name`
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_file")]
    pub file: String,
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_file() -> String {
    ".travis.yml".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Rewrite the file and commit it upstream.
    #[default]
    Github,
    /// Only log the release.
    Log,
}

impl TargetKind {
    pub fn needs_credentials(&self) -> bool {
        matches!(self, Self::Github)
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Github => write!(f, "github"),
            Self::Log => write!(f, "log"),
        }
    }
}

impl std::fmt::Display for TargetConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}:{}", self.repo, self.branch, self.file)
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl WatchConfig {
    /// `~/.config/bumpwatch/watchlist.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bumpwatch")
            .join("watchlist.toml")
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: WatchConfig =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.url.trim().is_empty() {
            return Err(ConfigError::Validation("feed.url must not be empty".into()));
        }

        for (package, targets) in &self.packages {
            for target in targets {
                let Some((owner, name)) = target.repo.split_once('/') else {
                    return Err(ConfigError::Validation(format!(
                        "package '{package}': repo '{}' must be owner/name",
                        target.repo
                    )));
                };
                if owner.is_empty() || name.is_empty() || name.contains('/') {
                    return Err(ConfigError::Validation(format!(
                        "package '{package}': repo '{}' must be owner/name",
                        target.repo
                    )));
                }
                if target.branch.trim().is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "package '{package}': branch must not be empty"
                    )));
                }
                if target.file.trim().is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "package '{package}': file must not be empty"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Targets registered for `package`. Exact name match.
    pub fn targets_for(&self, package: &str) -> &[TargetConfig] {
        self.packages.get(package).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True if any target will talk to GitHub.
    pub fn needs_github(&self) -> bool {
        self.packages
            .values()
            .flatten()
            .any(|t| t.kind.needs_credentials())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const WATCHLIST: &str = r#"
[feed]
url = "https://pypi.org/rss/updates.xml"

[[packages.PyYAML]]
repo = "acme/widgets"
branch = "master"
file = ".travis.yml"

[[packages.PyYAML]]
repo = "acme/gadgets"

[[packages.jinja-ab]]
kind = "log"
repo = "acme/site"
"#;

    #[test]
    fn parse_watchlist() {
        let config = WatchConfig::from_toml(WATCHLIST).unwrap();
        assert_eq!(config.packages.len(), 2);

        let targets = config.targets_for("PyYAML");
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].repo, "acme/widgets");
        assert_eq!(targets[0].kind, TargetKind::Github);
        // Defaults
        assert_eq!(targets[1].branch, "master");
        assert_eq!(targets[1].file, ".travis.yml");

        assert_eq!(config.targets_for("jinja-ab")[0].kind, TargetKind::Log);
        assert!(config.needs_github());
        assert_eq!(config.github.api_base, DEFAULT_API_BASE);
        assert_eq!(config.feed.timeout_secs, 30);
    }

    #[test]
    fn lookup_is_exact() {
        let config = WatchConfig::from_toml(WATCHLIST).unwrap();
        assert!(config.targets_for("pyyaml").is_empty());
        assert!(config.targets_for("Django").is_empty());
    }

    #[test]
    fn empty_config_is_valid() {
        let config = WatchConfig::from_toml("").unwrap();
        assert!(config.packages.is_empty());
        assert!(!config.needs_github());
        assert_eq!(config.feed.url, DEFAULT_FEED_URL);
    }

    #[test]
    fn log_only_config_needs_no_github() {
        let config = WatchConfig::from_toml(
            r#"
[[packages.requests]]
kind = "log"
repo = "acme/api"
"#,
        )
        .unwrap();
        assert!(!config.needs_github());
    }

    #[test]
    fn bad_repo_is_rejected() {
        for repo in ["widgets", "/widgets", "acme/", "a/b/c"] {
            let input = format!("[[packages.PyYAML]]\nrepo = \"{repo}\"\n");
            let err = WatchConfig::from_toml(&input).unwrap_err();
            assert!(matches!(err, ConfigError::Validation(_)), "{repo}: {err}");
        }
    }

    #[test]
    fn empty_file_is_rejected() {
        let err = WatchConfig::from_toml("[[packages.PyYAML]]\nrepo = \"a/b\"\nfile = \"\"\n").unwrap_err();
        assert!(err.to_string().contains("file must not be empty"));
    }

    #[test]
    fn unknown_kind_is_a_parse_error() {
        let err = WatchConfig::from_toml("[[packages.PyYAML]]\nrepo = \"a/b\"\nkind = \"email\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watchlist.toml");
        std::fs::write(&path, WATCHLIST).unwrap();
        let config = WatchConfig::load(&path).unwrap();
        assert_eq!(config.targets_for("PyYAML").len(), 2);

        let missing = WatchConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }

    #[test]
    fn default_path_is_under_bumpwatch() {
        let path = WatchConfig::default_path();
        assert!(path.ends_with("bumpwatch/watchlist.toml"));
    }

    #[test]
    fn target_display() {
        let config = WatchConfig::from_toml(WATCHLIST).unwrap();
        assert_eq!(
            config.targets_for("PyYAML")[0].to_string(),
            "acme/widgets@master:.travis.yml"
        );
    }
}
