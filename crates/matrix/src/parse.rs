use crate::error::MatrixError;
use crate::model::{GroupKey, Groups};

/// One `NAME=VALUE` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

/// Split a matrix line into its assignments, in the order written.
///
/// `line_no` is 1-based and only used for error messages. A token splits on
/// its first `=`, so values may themselves contain `=`.
pub fn parse_line(text: &str, line_no: usize) -> Result<Vec<Assignment<'_>>, MatrixError> {
    let assignments = text
        .split_whitespace()
        .map(|token| match token.split_once('=') {
            Some((name, value)) if !name.is_empty() => Ok(Assignment { name, value }),
            _ => Err(MatrixError::MalformedLine {
                line: line_no,
                token: token.to_string(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if assignments.is_empty() {
        return Err(MatrixError::EmptyLine { line: line_no });
    }
    Ok(assignments)
}

/// Group the matrix by co-occurring variable names and collect each
/// variable's versions within its group.
pub fn parse_matrix<S: AsRef<str>>(lines: &[S]) -> Result<Groups, MatrixError> {
    let mut groups = Groups::default();

    for (idx, line) in lines.iter().enumerate() {
        let assignments = parse_line(line.as_ref(), idx + 1)?;
        let key = GroupKey::new(assignments.iter().map(|a| a.name));
        let group = groups.entry(key);
        for a in &assignments {
            group.insert(a.name, a.value);
        }
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_equals() {
        let parsed = parse_line("_OPTS=a=b _PYYAML=3.11", 1).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0], Assignment { name: "_OPTS", value: "a=b" });
        assert_eq!(parsed[1].value, "3.11");
    }

    #[test]
    fn tolerates_repeated_whitespace() {
        let parsed = parse_line("  A=1\t B=2 ", 1).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn empty_value_is_allowed() {
        let parsed = parse_line("A=", 1).unwrap();
        assert_eq!(parsed[0].value, "");
    }

    #[test]
    fn token_without_equals_is_rejected() {
        let err = parse_line("A=1 oops", 7).unwrap_err();
        match err {
            MatrixError::MalformedLine { line, token } => {
                assert_eq!(line, 7);
                assert_eq!(token, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(matches!(
            parse_line("=1", 1),
            Err(MatrixError::MalformedLine { .. })
        ));
    }

    #[test]
    fn blank_line_is_rejected() {
        assert!(matches!(parse_line("   ", 3), Err(MatrixError::EmptyLine { line: 3 })));
        assert!(matches!(
            parse_matrix(&["A=1", ""]),
            Err(MatrixError::EmptyLine { line: 2 })
        ));
    }

    #[test]
    fn same_names_share_a_group() {
        let groups = parse_matrix(&["_PYYAML=3.11", "_PYYAML=3.12"]).unwrap();
        assert_eq!(groups.len(), 1);
        let group = groups.get(&GroupKey::new(["_PYYAML"])).unwrap();
        let versions: Vec<&str> = group.versions("_PYYAML").unwrap().iter().map(String::as_str).collect();
        assert_eq!(versions, vec!["3.11", "3.12"]);
    }

    #[test]
    fn overlapping_names_start_a_new_group() {
        let groups = parse_matrix(&["A=1 B=2", "A=3"]).unwrap();
        assert_eq!(groups.len(), 2);

        let pair = groups.get(&GroupKey::new(["A", "B"])).unwrap();
        assert_eq!(pair.versions("A").unwrap().len(), 1);
        let single = groups.get(&GroupKey::new(["A"])).unwrap();
        assert!(single.versions("A").unwrap().contains("3"));
        assert!(!single.versions("A").unwrap().contains("1"));
    }

    #[test]
    fn name_order_does_not_split_groups() {
        let groups = parse_matrix(&["B=2 A=1", "A=3 B=4"]).unwrap();
        assert_eq!(groups.len(), 1);
    }
}
