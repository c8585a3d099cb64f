//! Permissions and wildcard implication.
//!
//! A wildcard permission is a `:`-separated list of parts; each part is a
//! `,`-separated set of tokens. `*` in a part matches any token at that
//! position, and a permission with fewer parts implies anything in the parts
//! it leaves out: `printer` implies `printer:print:lp0`.

use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;

use crate::error::AuthZError;

pub const WILDCARD_TOKEN: &str = "*";
pub const PART_DIVIDER: char = ':';
pub const SUBPART_DIVIDER: char = ',';

/// Something a subject may be allowed to do.
pub trait Permission: fmt::Debug + fmt::Display + Send + Sync {
    /// Whether holding `self` also grants `other`.
    fn implies(&self, other: &dyn Permission) -> bool;

    fn as_any(&self) -> &dyn Any;
}

/// Hierarchical, `:`/`,` delimited permission, e.g. `document:read,write:42`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WildcardPermission {
    parts: Vec<BTreeSet<String>>,
}

impl WildcardPermission {
    /// Parse with case-insensitive tokens.
    ///
    /// # Errors
    ///
    /// [`AuthZError::InvalidPermission`] for empty strings, parts or tokens.
    pub fn parse(s: &str) -> Result<Self, AuthZError> {
        Self::parse_with_case(s, false)
    }

    /// Parse, keeping token case when `case_sensitive` is set.
    ///
    /// # Errors
    ///
    /// [`AuthZError::InvalidPermission`] for empty strings, parts or tokens.
    pub fn parse_with_case(s: &str, case_sensitive: bool) -> Result<Self, AuthZError> {
        let invalid = |reason: &str| AuthZError::InvalidPermission {
            permission: s.to_owned(),
            reason: reason.to_owned(),
        };

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(invalid("permission string is empty"));
        }

        let mut parts = Vec::new();
        for raw_part in trimmed.split(PART_DIVIDER) {
            let mut tokens = BTreeSet::new();
            for raw_token in raw_part.split(SUBPART_DIVIDER) {
                let token = raw_token.trim();
                if token.is_empty() {
                    return Err(invalid("empty part or token"));
                }
                tokens.insert(if case_sensitive {
                    token.to_owned()
                } else {
                    token.to_lowercase()
                });
            }
            parts.push(tokens);
        }
        Ok(Self { parts })
    }

    #[must_use]
    pub fn parts(&self) -> &[BTreeSet<String>] {
        &self.parts
    }

    fn is_wildcard(part: &BTreeSet<String>) -> bool {
        part.contains(WILDCARD_TOKEN)
    }

    /// Wildcard implication between two wildcard permissions.
    #[must_use]
    pub fn implies_wildcard(&self, other: &WildcardPermission) -> bool {
        for (i, other_part) in other.parts.iter().enumerate() {
            let Some(part) = self.parts.get(i) else {
                // fewer parts here: everything deeper is implied
                return true;
            };
            if !Self::is_wildcard(part) && !part.is_superset(other_part) {
                return false;
            }
        }
        self.parts
            .iter()
            .skip(other.parts.len())
            .all(Self::is_wildcard)
    }
}

impl Permission for WildcardPermission {
    fn implies(&self, other: &dyn Permission) -> bool {
        if other.as_any().is::<AllPermission>() {
            return self.parts.iter().all(Self::is_wildcard);
        }
        other
            .as_any()
            .downcast_ref::<WildcardPermission>()
            .is_some_and(|o| self.implies_wildcard(o))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for WildcardPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                write!(f, "{PART_DIVIDER}")?;
            }
            for (j, token) in part.iter().enumerate() {
                if j > 0 {
                    write!(f, "{SUBPART_DIVIDER}")?;
                }
                f.write_str(token)?;
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for WildcardPermission {
    type Err = AuthZError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Implies every permission. For administrative subjects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AllPermission;

impl Permission for AllPermission {
    fn implies(&self, _other: &dyn Permission) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for AllPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(WILDCARD_TOKEN)
    }
}
