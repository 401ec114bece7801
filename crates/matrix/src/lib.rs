//! `bumpwatch-matrix`: CI build-matrix reconciliation engine.
//!
//! Pure engine crate: receives the existing `env:` matrix, returns either
//! "unchanged" or the regenerated matrix. No network or filesystem access.

pub mod document;
pub mod engine;
pub mod error;
pub mod expand;
pub mod model;
pub mod parse;
pub mod update;

pub use document::{reconcile_document, CiDocument, DocumentOutcome, DocumentReconciliation};
pub use engine::{canonicalize, reconcile};
pub use error::MatrixError;
pub use model::{env_var_name, ChangeKind, Group, GroupKey, Groups, Outcome, Reconciliation};
