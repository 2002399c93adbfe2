//! Roles and authorization requirements.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Roles a principal may hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Any authenticated user.
    #[serde(rename = "user")]
    User,
    /// Manages users; implies every other grantable role.
    #[serde(rename = "userAdmin")]
    UserAdmin,
    /// Manages AU content and its metadata.
    #[serde(rename = "contentAdmin")]
    ContentAdmin,
    /// May access preserved content.
    #[serde(rename = "accessContent")]
    AccessContent,
    /// Manages AU configuration.
    #[serde(rename = "auAdmin")]
    AuAdmin,
    /// Sentinel held by anonymous principals. Never granted through configuration.
    #[serde(rename = "unauthenticated")]
    Unauthenticated,
}

impl Role {
    /// Parse a grantable role from its string form.
    ///
    /// The `unauthenticated` sentinel is rejected: only the authentication gate
    /// mints it.
    pub fn parse(s: &str) -> crate::Result<Self> {
        match s {
            "user" => Ok(Self::User),
            "userAdmin" => Ok(Self::UserAdmin),
            "contentAdmin" => Ok(Self::ContentAdmin),
            "accessContent" => Ok(Self::AccessContent),
            "auAdmin" => Ok(Self::AuAdmin),
            _ => Err(crate::Error::InvalidRole(format!("unknown role: {s}"))),
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::UserAdmin => "userAdmin",
            Self::ContentAdmin => "contentAdmin",
            Self::AccessContent => "accessContent",
            Self::AuAdmin => "auAdmin",
            Self::Unauthenticated => "unauthenticated",
        }
    }

    /// Check if this role implies another role.
    pub fn implies(&self, other: &Self) -> bool {
        match self {
            Self::UserAdmin => !matches!(other, Self::Unauthenticated),
            _ => self == other,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role requirement declared by an endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoleRequirement {
    /// Satisfied by every principal the authentication gate lets through,
    /// including the anonymous sentinel.
    AnyAuthenticated,
    /// Satisfied when the granted roles intersect this set.
    AnyOf(&'static [Role]),
}

impl RoleRequirement {
    /// Requirement for AU metadata writes and deletes.
    ///
    /// The sentinel is listed so that a deployment with authentication switched
    /// off can still administer content. Public routes never declare this
    /// requirement, so a public-route bypass cannot reach it.
    pub const CONTENT_ADMIN: Self = Self::AnyOf(&[Role::ContentAdmin, Role::Unauthenticated]);

    /// Check whether a set of granted roles satisfies this requirement.
    pub fn is_satisfied_by(&self, granted: &HashSet<Role>) -> bool {
        match self {
            Self::AnyAuthenticated => true,
            Self::AnyOf(required) => required
                .iter()
                .any(|r| granted.iter().any(|g| g.implies(r))),
        }
    }
}

impl fmt::Display for RoleRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnyAuthenticated => write!(f, "any authenticated user"),
            Self::AnyOf(roles) => {
                let names: Vec<&str> = roles
                    .iter()
                    .filter(|r| **r != Role::Unauthenticated)
                    .map(Role::as_str)
                    .collect();
                write!(f, "one of [{}]", names.join(", "))
            }
        }
    }
}

/// Parse a list of role strings, failing on the first unknown role.
pub fn parse_roles<S: AsRef<str>>(roles: &[S]) -> crate::Result<HashSet<Role>> {
    roles.iter().map(|r| Role::parse(r.as_ref())).collect()
}
