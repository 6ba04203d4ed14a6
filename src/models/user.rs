//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// User role, ordered by privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Athlete,
    Coach,
    Admin,
    Superadmin,
}

impl Role {
    /// True if this role carries admin privileges.
    pub fn is_admin(self) -> bool {
        self >= Role::Admin
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Athlete => "athlete",
            Role::Coach => "coach",
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "athlete" => Ok(Role::Athlete),
            "coach" => Ok(Role::Coach),
            "admin" => Ok(Role::Admin),
            "superadmin" => Ok(Role::Superadmin),
            _ => Err(()),
        }
    }
}

/// User document stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque user ID (also used as document ID)
    pub user_id: String,
    /// Email address
    pub email: String,
    /// Display name shown to other users
    pub display_name: String,
    /// Role (athlete/coach/admin/superadmin)
    pub role: Role,
    /// Assigned coach, for athletes onboarded via a coach invitation
    pub coach_id: Option<String>,
    /// Token hash of the invitation that onboarded this user, if any
    pub invited_by: Option<String>,
    /// When the user was created (RFC3339)
    pub created_at: String,
    /// Last activity timestamp (RFC3339)
    pub last_active: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ordering_matches_privilege() {
        assert!(Role::Superadmin > Role::Admin);
        assert!(Role::Admin > Role::Coach);
        assert!(Role::Coach > Role::Athlete);
    }

    #[test]
    fn only_admin_roles_are_admin() {
        assert!(!Role::Athlete.is_admin());
        assert!(!Role::Coach.is_admin());
        assert!(Role::Admin.is_admin());
        assert!(Role::Superadmin.is_admin());
    }

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Athlete, Role::Coach, Role::Admin, Role::Superadmin] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("owner".parse::<Role>().is_err());
    }
}
