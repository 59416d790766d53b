// Group Domain Model

use serde::{Deserialize, Serialize};

/// Group name (tenant-scoped namespace)
pub type GroupName = String;

/// Token returned when a group is created or refreshed
pub type GroupToken = String;

/// Group as listed by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    #[serde(rename = "Name")]
    pub name: GroupName,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
}

/// Canonical group name: lower-case, `_` instead of spaces, dots and dashes
pub fn normalize_group_name(name: &str) -> GroupName {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if matches!(c, ' ' | '.' | '-') { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_group_name() {
        assert_eq!(normalize_group_name(" Team A.v2-beta "), "team_a_v2_beta");
        assert_eq!(normalize_group_name("teama"), "teama");
    }
}
