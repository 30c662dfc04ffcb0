use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ids::{UserId, WorkspaceId};

/// Role a user holds inside a workspace. The set is closed; membership
/// management is reserved to `Owner`, review actions to `ClientReviewer`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Owner,
    Participant,
    Viewer,
    ClientReviewer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError(pub String);

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid role: {}", self.0)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "participant" => Ok(Role::Participant),
            "viewer" => Ok(Role::Viewer),
            "client_reviewer" => Ok(Role::ClientReviewer),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Participant => "participant",
            Role::Viewer => "viewer",
            Role::ClientReviewer => "client_reviewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership row: unique per (workspace, user). The primary key in storage
/// is the final arbiter when two attaches race.
#[derive(Debug, Clone)]
pub struct MembershipRecord {
    pub workspace_id: WorkspaceId,
    pub user_id: UserId,
    pub role: Role,
    pub created_at: i64,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_roundtrip() {
        for role in [
            Role::Owner,
            Role::Participant,
            Role::Viewer,
            Role::ClientReviewer,
        ] {
            let parsed: Role = role.as_str().parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn role_parse_rejects_unknown_values() {
        assert!("admin".parse::<Role>().is_err());
        assert!("Owner".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }
}
