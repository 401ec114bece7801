use crate::model::{env_var_name, Groups};

/// What [`add_version`] did to the groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    pub variable: String,
    /// Groups that carry the variable.
    pub groups: usize,
    /// True if at least one version set grew.
    pub added: bool,
}

impl UpdateReport {
    pub fn tracked(&self) -> bool {
        self.groups > 0
    }
}

/// Add `version` for `package` to every group that carries its env var.
///
/// A package that no group carries is left alone; the report says so.
pub fn add_version(groups: &mut Groups, package: &str, version: &str) -> UpdateReport {
    let variable = env_var_name(package);
    let mut touched = 0;
    let mut added = false;

    for (key, group) in groups.iter_mut() {
        if key.contains(&variable) {
            touched += 1;
            added |= group.insert(&variable, version);
        }
    }

    UpdateReport {
        variable,
        groups: touched,
        added,
    }
}
