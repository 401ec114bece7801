/// Errors raised while reading a matrix or the document that carries it.
///
/// None of these are recovered inside the crate: a malformed CI file is a
/// precondition failure the caller has to surface.
#[derive(Debug, thiserror::Error)]
pub enum MatrixError {
    /// A matrix line with no assignments at all.
    #[error("matrix line {line} is empty")]
    EmptyLine { line: usize },

    /// A token without `=`, or with nothing before it.
    #[error("matrix line {line}: malformed assignment '{token}' (expected NAME=VALUE)")]
    MalformedLine { line: usize, token: String },

    /// YAML parse / serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The document root is not a mapping.
    #[error("CI document root must be a mapping")]
    NotAMapping,

    /// The document has no `env` key.
    #[error("CI document has no 'env' field")]
    MissingEnv,

    /// `env` exists but is not a list of lines.
    #[error("'env' must be a list of NAME=VALUE lines")]
    EnvNotSequence,

    /// An `env` entry that is not a plain string.
    #[error("'env' entry #{index} is not a string")]
    EnvEntryNotString { index: usize },

    /// `env` is not written as a top-level block key, so it cannot be
    /// replaced without touching the rest of the file.
    #[error("'env' must be a top-level key to be rewritten")]
    EnvNotInBlock,

    /// The rewritten document no longer parses to the same fields.
    #[error("rewriting 'env' would change other fields of the document")]
    RewriteMismatch,
}
