//! Declarative access requirements attached to a unit of work.

use serde::{Deserialize, Serialize};

/// How a list of roles or permissions combines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Logical {
    #[default]
    And,
    Or,
}

/// A precondition checked before a guarded operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// Principals proven during this session.
    Authenticated,
    /// A known identity, authenticated now or remembered.
    User,
    /// No identity at all.
    Guest,
    Roles { roles: Vec<String>, logical: Logical },
    Permissions { permissions: Vec<String>, logical: Logical },
    /// Request must originate from one of these hosts.
    Host(Vec<String>),
}

impl Requirement {
    #[must_use]
    pub fn all_roles<'a>(roles: impl IntoIterator<Item = &'a str>) -> Self {
        Self::Roles {
            roles: roles.into_iter().map(ToOwned::to_owned).collect(),
            logical: Logical::And,
        }
    }

    #[must_use]
    pub fn any_role<'a>(roles: impl IntoIterator<Item = &'a str>) -> Self {
        Self::Roles {
            roles: roles.into_iter().map(ToOwned::to_owned).collect(),
            logical: Logical::Or,
        }
    }

    #[must_use]
    pub fn all_permissions<'a>(permissions: impl IntoIterator<Item = &'a str>) -> Self {
        Self::Permissions {
            permissions: permissions.into_iter().map(ToOwned::to_owned).collect(),
            logical: Logical::And,
        }
    }

    #[must_use]
    pub fn any_permission<'a>(permissions: impl IntoIterator<Item = &'a str>) -> Self {
        Self::Permissions {
            permissions: permissions.into_iter().map(ToOwned::to_owned).collect(),
            logical: Logical::Or,
        }
    }

    #[must_use]
    pub fn hosts<'a>(hosts: impl IntoIterator<Item = &'a str>) -> Self {
        Self::Host(hosts.into_iter().map(ToOwned::to_owned).collect())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_logical() {
        assert_eq!(
            Requirement::any_role(["a", "b"]),
            Requirement::Roles {
                roles: vec!["a".to_owned(), "b".to_owned()],
                logical: Logical::Or,
            }
        );
        assert!(matches!(
            Requirement::all_permissions(["doc:read"]),
            Requirement::Permissions { logical: Logical::And, .. }
        ));
    }

    #[test]
    fn requirements_deserialize_from_config() {
        let reqs: Vec<Requirement> = serde_json::from_value(serde_json::json!([
            "authenticated",
            { "roles": { "roles": ["admin"], "logical": "or" } },
            { "host": ["127.0.0.1"] }
        ]))
        .unwrap();
        assert_eq!(reqs[0], Requirement::Authenticated);
        assert_eq!(reqs[1], Requirement::any_role(["admin"]));
        assert_eq!(reqs[2], Requirement::hosts(["127.0.0.1"]));
    }
}
