//! Role and provider registries - the closed enumerations everything else
//! branches on.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A role a platform identity can hold.
///
/// Every identity carries an explicit flat set of these; holding `Admin` does
/// not imply holding `Staff`. Authorization checks test membership only.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Applicant,
    Attendee,
    Mentor,
    Sponsor,
    Staff,
    Admin,
}

/// Roles allowed to read other users' grants.
pub const ELEVATED_ROLES: &[Role] = &[Role::Staff, Role::Admin];

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Applicant => "APPLICANT",
            Role::Attendee => "ATTENDEE",
            Role::Mentor => "MENTOR",
            Role::Sponsor => "SPONSOR",
            Role::Staff => "STAFF",
            Role::Admin => "ADMIN",
        }
    }

    pub fn is_elevated(&self) -> bool {
        ELEVATED_ROLES.contains(self)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "APPLICANT" => Ok(Role::Applicant),
            "ATTENDEE" => Ok(Role::Attendee),
            "MENTOR" => Ok(Role::Mentor),
            "SPONSOR" => Ok(Role::Sponsor),
            "STAFF" => Ok(Role::Staff),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// An identity provider this service accepts logins from.
///
/// `Sponsor` is a pseudo-provider: its identities are seeded by the sponsor
/// directory and log in with one-time codes rather than an OAuth redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Github,
    Sponsor,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Github => "github",
            Provider::Sponsor => "sponsor",
        }
    }

    /// Whether the provider participates in the browser redirect flow.
    pub fn is_oauth(&self) -> bool {
        !matches!(self, Provider::Sponsor)
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Provider::Google),
            "github" => Ok(Provider::Github),
            "sponsor" => Ok(Provider::Sponsor),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [
            Role::User,
            Role::Applicant,
            Role::Attendee,
            Role::Mentor,
            Role::Sponsor,
            Role::Staff,
            Role::Admin,
        ] {
            let parsed: Role = role.as_str().parse().unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!("staff".parse::<Role>().unwrap(), Role::Staff);
        assert!("SUPERUSER".parse::<Role>().is_err());
    }

    #[test]
    fn test_elevated_roles() {
        assert!(Role::Staff.is_elevated());
        assert!(Role::Admin.is_elevated());
        assert!(!Role::Attendee.is_elevated());
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!("GitHub".parse::<Provider>().unwrap(), Provider::Github);
        assert!(!Provider::Sponsor.is_oauth());
        assert!("okta".parse::<Provider>().is_err());
    }
}
