use crate::model::{Group, Groups};

/// Every combination of the group's versions, one rendered line each.
///
/// Names are emitted in sorted order and the product walks each version set
/// in sorted order, so the output is already sorted for a single group.
pub fn expand_group(group: &Group) -> Vec<String> {
    let axes: Vec<(&str, Vec<&str>)> = group
        .variables()
        .map(|(name, set)| (name, set.iter().map(String::as_str).collect()))
        .collect();

    if axes.is_empty() || axes.iter().any(|(_, values)| values.is_empty()) {
        return Vec::new();
    }

    let mut lines = Vec::with_capacity(group.combinations());
    // Odometer over the axes; the last axis turns fastest.
    let mut cursor = vec![0usize; axes.len()];
    loop {
        let line = axes
            .iter()
            .zip(&cursor)
            .map(|((name, values), &i)| format!("{name}={}", values[i]))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(line);

        let mut axis = axes.len();
        loop {
            if axis == 0 {
                return lines;
            }
            axis -= 1;
            cursor[axis] += 1;
            if cursor[axis] < axes[axis].1.len() {
                break;
            }
            cursor[axis] = 0;
        }
    }
}

/// Expand all groups and merge them into one sorted matrix.
pub fn expand(groups: &Groups) -> Vec<String> {
    let mut lines: Vec<String> = groups
        .iter()
        .flat_map(|(_, group)| expand_group(group))
        .collect();
    lines.sort();
    lines
}
