//! The CI configuration document that carries the matrix.
//!
//! Only the `env:` block is touched. The rewrite splices new text over the
//! block's lines, so every other byte of the file is kept as written. The
//! result is parsed again and must agree with the original outside `env:`.

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::engine::reconcile;
use crate::error::MatrixError;
use crate::model::{ChangeKind, Outcome};

const ENV_KEY: &str = "env";
const DEFAULT_INDENT: &str = "  ";

/// A parsed CI configuration file (e.g. `.travis.yml`).
#[derive(Debug, Clone, PartialEq)]
pub struct CiDocument {
    text: String,
    root: Mapping,
}

impl CiDocument {
    pub fn from_yaml(text: &str) -> Result<Self, MatrixError> {
        match serde_yaml::from_str::<Value>(text.trim_end())? {
            Value::Mapping(root) => Ok(Self {
                text: text.to_string(),
                root,
            }),
            _ => Err(MatrixError::NotAMapping),
        }
    }

    /// The matrix lines held in `env:`, in file order.
    pub fn env_lines(&self) -> Result<Vec<String>, MatrixError> {
        let env = self.root.get(ENV_KEY).ok_or(MatrixError::MissingEnv)?;
        let Value::Sequence(entries) = env else {
            return Err(MatrixError::EnvNotSequence);
        };
        entries
            .iter()
            .enumerate()
            .map(|(index, entry)| match entry {
                Value::String(line) => Ok(line.clone()),
                _ => Err(MatrixError::EnvEntryNotString { index }),
            })
            .collect()
    }

    /// The document text with the `env:` block replaced by `lines`.
    pub fn with_env(&self, lines: &[String]) -> Result<String, MatrixError> {
        let block = env_block(&self.text).ok_or(MatrixError::EnvNotInBlock)?;

        let mut replacement = format!("{ENV_KEY}:\n");
        for line in lines {
            let scalar = serde_yaml::to_string(&Value::String(line.clone()))?;
            replacement.push_str(&block.indent);
            replacement.push_str("- ");
            replacement.push_str(scalar.trim_end_matches('\n'));
            replacement.push('\n');
        }

        let mut text = String::with_capacity(self.text.len() + replacement.len());
        text.push_str(&self.text[..block.start]);
        text.push_str(&replacement);
        text.push_str(&self.text[block.end..]);

        let rewritten = Self::from_yaml(&text)?;
        if rewritten.env_lines()? != lines || without_env(&rewritten.root) != without_env(&self.root) {
            return Err(MatrixError::RewriteMismatch);
        }
        Ok(text)
    }
}

/// Byte range of the top-level `env:` key and its value.
struct EnvBlock {
    start: usize,
    end: usize,
    /// Leading whitespace of the first sequence entry.
    indent: String,
}

fn env_block(text: &str) -> Option<EnvBlock> {
    let mut offset = 0;
    let mut lines = Vec::new();
    for line in text.split_inclusive('\n') {
        lines.push((offset, line));
        offset += line.len();
    }

    let first = lines.iter().position(|(_, line)| is_env_key(line))?;

    // Indented lines and column-0 entries belong to the value. Trailing
    // blank or comment lines stay outside the block.
    let mut last = first;
    for (i, (_, line)) in lines.iter().enumerate().skip(first + 1) {
        if line.starts_with([' ', '\t']) || is_entry(line) {
            last = i;
        } else if !(line.trim().is_empty() || line.starts_with('#')) {
            break;
        }
    }

    let indent = lines[first + 1..=last]
        .iter()
        .map(|(_, line)| *line)
        .find(|line| is_entry(line.trim_start()))
        .map(|line| line[..line.len() - line.trim_start().len()].to_string())
        .unwrap_or_else(|| DEFAULT_INDENT.to_string());

    let (end_offset, end_line) = lines[last];
    Some(EnvBlock {
        start: lines[first].0,
        end: end_offset + end_line.len(),
        indent,
    })
}

fn is_env_key(line: &str) -> bool {
    ["env:", "\"env\":", "'env':"].iter().any(|key| {
        line.strip_prefix(key)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '\t', '\r', '\n', '#']))
    })
}

fn is_entry(line: &str) -> bool {
    !line.starts_with("---") && (line.starts_with("- ") || line.trim_end() == "-")
}

fn without_env(root: &Mapping) -> Mapping {
    let mut root = root.clone();
    root.remove(ENV_KEY);
    root
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentOutcome {
    Unchanged,
    Updated {
        /// Full replacement document.
        text: String,
        lines: Vec<String>,
        change: ChangeKind,
    },
}

impl DocumentOutcome {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReconciliation {
    pub variable: String,
    pub tracked: bool,
    pub outcome: DocumentOutcome,
}

/// Reconcile the `env:` matrix of a CI document against a release.
pub fn reconcile_document(
    text: &str,
    package: &str,
    version: &str,
) -> Result<DocumentReconciliation, MatrixError> {
    let doc = CiDocument::from_yaml(text)?;
    let lines = doc.env_lines()?;
    let result = reconcile(&lines, package, version)?;

    let outcome = match result.outcome {
        Outcome::Unchanged => DocumentOutcome::Unchanged,
        Outcome::Updated { lines, change } => DocumentOutcome::Updated {
            text: doc.with_env(&lines)?,
            lines,
            change,
        },
    };

    Ok(DocumentReconciliation {
        variable: result.variable,
        tracked: result.tracked,
        outcome,
    })
}
