use crate::error::MatrixError;
use crate::expand::expand;
use crate::model::{ChangeKind, Outcome, Reconciliation};
use crate::parse::parse_matrix;
use crate::update::add_version;

/// Re-expand a matrix without adding anything: the canonical form of `lines`.
pub fn canonicalize<S: AsRef<str>>(lines: &[S]) -> Result<Vec<String>, MatrixError> {
    Ok(expand(&parse_matrix(lines)?))
}

/// Reconcile a matrix against one release of `package`.
///
/// `Unchanged` only when the regenerated matrix equals the input line for
/// line. A matrix that was merely out of canonical order comes back as
/// `Updated` with [`ChangeKind::Reordered`], because its bytes change.
/// A package no group carries leaves the matrix alone, sorted or not.
pub fn reconcile<S: AsRef<str>>(
    lines: &[S],
    package: &str,
    version: &str,
) -> Result<Reconciliation, MatrixError> {
    let mut groups = parse_matrix(lines)?;
    let canonical_original = expand(&groups);

    let report = add_version(&mut groups, package, version);
    let tracked = report.tracked();
    let updated = if report.added {
        expand(&groups)
    } else {
        canonical_original.clone()
    };

    let outcome = if !tracked || same_lines(&updated, lines) {
        Outcome::Unchanged
    } else {
        let change = if updated == canonical_original {
            ChangeKind::Reordered
        } else {
            ChangeKind::VersionAdded
        };
        Outcome::Updated { lines: updated, change }
    };

    Ok(Reconciliation {
        variable: report.variable,
        tracked,
        outcome,
    })
}

fn same_lines<S: AsRef<str>>(a: &[String], b: &[S]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y.as_ref())
}
