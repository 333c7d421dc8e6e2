use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of account roles. Stored as SCREAMING_SNAKE_CASE strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Seller,
    Admin,
    SuperAdmin,
    Owner,
}

impl Role {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "USER" => Some(Self::User),
            "SELLER" => Some(Self::Seller),
            "ADMIN" => Some(Self::Admin),
            "SUPER_ADMIN" => Some(Self::SuperAdmin),
            "OWNER" => Some(Self::Owner),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Seller => "SELLER",
            Self::Admin => "ADMIN",
            Self::SuperAdmin => "SUPER_ADMIN",
            Self::Owner => "OWNER",
        }
    }

    /// Roles allowed into the backoffice surface.
    #[must_use]
    pub const fn backoffice_allowed(self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin | Self::Owner)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Account lifecycle status, mutated by the admin approval flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Pending,
    Approved,
    Rejected,
}

impl UserStatus {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Checks whether a granted scope list covers a requested capability.
///
/// A grant matches exactly, or via a trailing wildcard segment:
/// `webhooks:*` covers `webhooks:read`. A bare `*` covers everything.
#[must_use]
pub fn scope_granted(granted: &[String], requested: &str) -> bool {
    granted.iter().any(|g| scope_matches(g, requested))
}

fn scope_matches(granted: &str, requested: &str) -> bool {
    if granted == requested || granted == "*" {
        return true;
    }

    if let Some(prefix) = granted.strip_suffix(":*") {
        return requested
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with(':'));
    }

    false
}

/// Validates a scope string: non-empty lowercase alphanumeric segments
/// separated by `:`, where only the final segment may be `*`.
#[must_use]
pub fn is_valid_scope(scope: &str) -> bool {
    let segments: Vec<&str> = scope.split(':').collect();
    if segments.is_empty() {
        return false;
    }

    segments.iter().enumerate().all(|(i, seg)| {
        if *seg == "*" {
            return i == segments.len() - 1;
        }
        !seg.is_empty()
            && seg
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    })
}
