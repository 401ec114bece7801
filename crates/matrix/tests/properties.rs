use std::collections::BTreeSet;

use proptest::prelude::*;

use bumpwatch_matrix::{canonicalize, reconcile, ChangeKind, Outcome};

const NAMES: [&str; 4] = ["_ALPHA", "_BETA", "_GAMMA_X", "_PYYAML"];
const VERSIONS: [&str; 5] = ["1.0", "2.0", "3.9", "3.10", "0.3.0"];

/// One matrix line: a non-empty subset of NAMES, each with some version.
fn line() -> impl Strategy<Value = String> {
    proptest::collection::btree_map(0..NAMES.len(), 0..VERSIONS.len(), 1..=NAMES.len()).prop_map(
        |picks| {
            picks
                .into_iter()
                .map(|(n, v)| format!("{}={}", NAMES[n], VERSIONS[v]))
                .collect::<Vec<_>>()
                .join(" ")
        },
    )
}

fn matrix() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(line(), 1..6)
}

fn names_of(line: &str) -> BTreeSet<&str> {
    line.split_whitespace()
        .filter_map(|t| t.split_once('=').map(|(n, _)| n))
        .collect()
}

proptest! {
    #[test]
    fn canonical_form_is_a_fixed_point(lines in matrix()) {
        let once = canonicalize(&lines).unwrap();
        let twice = canonicalize(&once).unwrap();
        prop_assert_eq!(&once, &twice);

        let mut sorted = once.clone();
        sorted.sort();
        prop_assert_eq!(once, sorted);
    }

    #[test]
    fn known_version_on_canonical_matrix_is_unchanged(lines in matrix()) {
        let canonical = canonicalize(&lines).unwrap();
        // Every generated line carries at least one name; reuse its value.
        let first = canonical[0].split_whitespace().next().unwrap();
        let (name, value) = first.split_once('=').unwrap();

        // Versions are tracked per group, so the value is only known if every
        // group carrying the name already lists it.
        let carrying: BTreeSet<BTreeSet<&str>> = canonical
            .iter()
            .map(|l| names_of(l))
            .filter(|names| names.contains(name))
            .collect();
        let known = carrying.iter().all(|names| {
            canonical
                .iter()
                .any(|l| names_of(l) == *names && l.split_whitespace().any(|t| t == first))
        });
        prop_assume!(known);

        let package = name.trim_start_matches('_').to_lowercase().replace('_', "-");
        let r = reconcile(&canonical, &package, value).unwrap();
        prop_assert!(r.tracked);
        prop_assert_eq!(r.outcome, Outcome::Unchanged);
    }

    #[test]
    fn adding_the_same_version_twice_is_a_noop(lines in matrix()) {
        let canonical = canonicalize(&lines).unwrap();
        let once = match reconcile(&canonical, "alpha", "1.0").unwrap().outcome {
            Outcome::Unchanged => canonical,
            Outcome::Updated { lines, .. } => lines,
        };
        let again = reconcile(&once, "alpha", "1.0").unwrap();
        prop_assert_eq!(again.outcome, Outcome::Unchanged);
    }

    #[test]
    fn new_version_only_grows_the_matrix(lines in matrix()) {
        let canonical = canonicalize(&lines).unwrap();
        let r = reconcile(&canonical, "PyYAML", "99.0").unwrap();
        let tracked = canonical.iter().any(|l| l.contains("_PYYAML="));
        prop_assert_eq!(r.tracked, tracked);

        match r.outcome {
            Outcome::Unchanged => prop_assert!(!tracked),
            Outcome::Updated { lines: updated, change } => {
                prop_assert_eq!(change, ChangeKind::VersionAdded);
                let before: BTreeSet<&String> = canonical.iter().collect();
                let after: BTreeSet<&String> = updated.iter().collect();
                prop_assert!(before.is_subset(&after));
                prop_assert_eq!(after.len(), updated.len());
                prop_assert!(updated.iter().any(|l| l.contains("_PYYAML=99.0")));
            }
        }
    }

    #[test]
    fn expansion_is_a_full_product(values_a in proptest::collection::btree_set(0..VERSIONS.len(), 1..4),
                                   values_b in proptest::collection::btree_set(0..VERSIONS.len(), 1..4)) {
        // Pair the values up line by line so not every combination is written.
        let lines: Vec<String> = values_a
            .iter()
            .zip(values_b.iter().cycle())
            .chain(values_b.iter().map(|b| (values_a.iter().next().unwrap(), b)))
            .map(|(a, b)| format!("_A={} _B={}", VERSIONS[*a], VERSIONS[*b]))
            .collect();

        let canonical = canonicalize(&lines).unwrap();
        prop_assert_eq!(canonical.len(), values_a.len() * values_b.len());
    }
}
