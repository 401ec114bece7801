// Configuration loading

pub mod credentials;
pub mod watchlist;

pub use credentials::{github_token, set_github_token, KeySource, TokenLookup, TOKEN_ENV_VAR};
pub use watchlist::{ConfigError, FeedSettings, GithubSettings, TargetConfig, TargetKind, WatchConfig};
