//! GitHub HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required).
//! Covers the git data endpoints needed to read one file at a branch head
//! and to commit a new version of it.

use std::time::Duration;

use base64::Engine as _;

const USER_AGENT: &str = concat!("bumpwatch/", env!("CARGO_PKG_VERSION"));

/// GitHub API client (blocking).
#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::blocking::Client,
    api_base: String,
    token: String,
}

/// Error type for GitHub operations.
#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    /// No token configured. Raised before any request is made.
    #[error("no GitHub token configured (set GITHUB_TOKEN)")]
    MissingCredential,
    /// Branch, tree entry or blob does not exist
    #[error("not found: {0}")]
    NotFound(String),
    /// Ref update rejected because the branch moved since it was read
    #[error("write conflict: {0}")]
    WriteConflict(String),
    /// Network error
    #[error("network error: {0}")]
    Network(String),
    /// HTTP error with status code
    #[error("HTTP {0}: {1}")]
    Http(u16, String),
    /// JSON parsing error
    #[error("parse error: {0}")]
    Parse(String),
    /// Blob content could not be decoded
    #[error("decode error: {0}")]
    Decode(String),
}

/// One entry of a git tree listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub kind: String,
    pub sha: String,
}

impl GithubClient {
    /// Create a client from an optional token; `None` is a missing credential.
    pub fn from_token(api_base: &str, token: Option<String>) -> Result<Self, GithubError> {
        let token = token
            .filter(|t| !t.trim().is_empty())
            .ok_or(GithubError::MissingCredential)?;
        Self::new(api_base, token)
    }

    /// Create a new client with an explicit token.
    pub fn new(api_base: &str, token: String) -> Result<Self, GithubError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GithubError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Commit SHA the branch currently points to.
    pub fn branch_head(&self, repo: &str, branch: &str) -> Result<String, GithubError> {
        let url = format!("{}/repos/{}/git/ref/heads/{}", self.api_base, repo, branch);
        let json = self.get(&url).map_err(|e| match e {
            GithubError::Http(404, _) => {
                GithubError::NotFound(format!("branch '{branch}' in {repo}"))
            }
            other => other,
        })?;
        json_str(&json["object"], "sha")
    }

    /// Tree SHA of a commit.
    pub fn commit_tree(&self, repo: &str, commit_sha: &str) -> Result<String, GithubError> {
        let url = format!("{}/repos/{}/git/commits/{}", self.api_base, repo, commit_sha);
        let json = self.get(&url)?;
        json_str(&json["tree"], "sha")
    }

    /// Full (recursive) listing of a tree.
    pub fn list_tree(&self, repo: &str, tree_sha: &str) -> Result<Vec<TreeEntry>, GithubError> {
        let url = format!("{}/repos/{}/git/trees/{}?recursive=1", self.api_base, repo, tree_sha);
        let json = self.get(&url)?;

        if json["truncated"].as_bool() == Some(true) {
            tracing::warn!(repo, tree = tree_sha, "tree listing truncated by GitHub");
        }

        let entries = json["tree"]
            .as_array()
            .ok_or_else(|| GithubError::Parse("missing tree in response".into()))?
            .iter()
            .filter_map(|e| {
                Some(TreeEntry {
                    path: e["path"].as_str()?.to_string(),
                    kind: e["type"].as_str().unwrap_or("blob").to_string(),
                    sha: e["sha"].as_str()?.to_string(),
                })
            })
            .collect();

        Ok(entries)
    }

    /// Contents of a blob as UTF-8 text.
    pub fn blob_text(&self, repo: &str, blob_sha: &str) -> Result<String, GithubError> {
        let url = format!("{}/repos/{}/git/blobs/{}", self.api_base, repo, blob_sha);
        let json = self.get(&url)?;
        let content = json["content"]
            .as_str()
            .ok_or_else(|| GithubError::Parse("missing content in blob".into()))?;

        match json["encoding"].as_str().unwrap_or("base64") {
            "base64" => decode_base64_text(content),
            "utf-8" => Ok(content.to_string()),
            other => Err(GithubError::Decode(format!("unsupported blob encoding '{other}'"))),
        }
    }

    pub fn create_blob(&self, repo: &str, content: &str) -> Result<String, GithubError> {
        let url = format!("{}/repos/{}/git/blobs", self.api_base, repo);
        let json = self.post_json(
            &url,
            &serde_json::json!({ "content": content, "encoding": "utf-8" }),
        )?;
        json_str(&json, "sha")
    }

    /// New tree that replaces one path of `base_tree`.
    pub fn create_tree(
        &self,
        repo: &str,
        base_tree: &str,
        path: &str,
        blob_sha: &str,
    ) -> Result<String, GithubError> {
        let url = format!("{}/repos/{}/git/trees", self.api_base, repo);
        let body = serde_json::json!({
            "base_tree": base_tree,
            "tree": [{
                "path": path,
                "mode": "100644",
                "type": "blob",
                "sha": blob_sha,
            }],
        });
        let json = self.post_json(&url, &body)?;
        json_str(&json, "sha")
    }

    pub fn create_commit(
        &self,
        repo: &str,
        message: &str,
        parent: &str,
        tree: &str,
    ) -> Result<String, GithubError> {
        let url = format!("{}/repos/{}/git/commits", self.api_base, repo);
        let body = serde_json::json!({
            "message": message,
            "parents": [parent],
            "tree": tree,
        });
        let json = self.post_json(&url, &body)?;
        json_str(&json, "sha")
    }

    /// Move the branch to `commit_sha`. Never forced: GitHub refuses the
    /// update unless it fast-forwards, which is reported as a conflict.
    pub fn update_branch(&self, repo: &str, branch: &str, commit_sha: &str) -> Result<(), GithubError> {
        let url = format!("{}/repos/{}/git/refs/heads/{}", self.api_base, repo, branch);
        let response = self
            .http
            .patch(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .json(&serde_json::json!({ "sha": commit_sha, "force": false }))
            .send()
            .map_err(|e| GithubError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if response.status().is_success() {
            return Ok(());
        }
        let message = error_message(&response.text().unwrap_or_default());
        match status {
            409 | 422 => Err(GithubError::WriteConflict(message)),
            _ => Err(GithubError::Http(status, message)),
        }
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn get(&self, url: &str) -> Result<serde_json::Value, GithubError> {
        tracing::debug!(url, "GET");
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .map_err(|e| GithubError::Network(e.to_string()))?;
        read_json(response)
    }

    fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<serde_json::Value, GithubError> {
        tracing::debug!(url, "POST");
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .json(body)
            .send()
            .map_err(|e| GithubError::Network(e.to_string()))?;
        read_json(response)
    }
}

// ── Free functions ──────────────────────────────────────────────────

fn read_json(response: reqwest::blocking::Response) -> Result<serde_json::Value, GithubError> {
    let status = response.status().as_u16();
    if !response.status().is_success() {
        let body = response.text().unwrap_or_default();
        return Err(GithubError::Http(status, error_message(&body)));
    }
    response.json().map_err(|e| GithubError::Parse(e.to_string()))
}

/// GitHub error bodies are `{"message": "..."}`; fall back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}

/// Blob content arrives base64-encoded and wrapped at 60 columns.
fn decode_base64_text(content: &str) -> Result<String, GithubError> {
    let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| GithubError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| GithubError::Decode(e.to_string()))
}

fn json_str(json: &serde_json::Value, key: &str) -> Result<String, GithubError> {
    json[key]
        .as_str()
        .map(String::from)
        .ok_or_else(|| GithubError::Parse(format!("Missing {} in response", key)))
}
