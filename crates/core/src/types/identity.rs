//! Session identity: guest or authenticated user.

use serde::{Deserialize, Serialize};

use crate::{Email, UserId};

/// Cart and order key used while no user is signed in.
pub const GUEST_KEY: &str = "guest";

/// The user record returned by the backend on login.
///
/// This is also the record persisted in the session; its absence means the
/// session is a guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    pub email: Email,
}

/// Who the current session belongs to. Exactly one is active at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Identity {
    #[default]
    Guest,
    Authenticated(UserProfile),
}

impl Identity {
    /// Key the backend uses for this identity's cart and orders.
    ///
    /// Guest carts live under [`GUEST_KEY`], user carts under the user ID;
    /// the two collections never overlap.
    #[must_use]
    pub fn cart_key(&self) -> &str {
        match self {
            Self::Guest => GUEST_KEY,
            Self::Authenticated(user) => user.id.as_str(),
        }
    }

    #[must_use]
    pub const fn is_guest(&self) -> bool {
        matches!(self, Self::Guest)
    }

    #[must_use]
    pub const fn profile(&self) -> Option<&UserProfile> {
        match self {
            Self::Guest => None,
            Self::Authenticated(user) => Some(user),
        }
    }
}

impl From<Option<UserProfile>> for Identity {
    fn from(profile: Option<UserProfile>) -> Self {
        profile.map_or(Self::Guest, Self::Authenticated)
    }
}

impl From<UserProfile> for Identity {
    fn from(profile: UserProfile) -> Self {
        Self::Authenticated(profile)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ada() -> UserProfile {
        UserProfile {
            id: UserId::new("u-1"),
            name: "Ada".to_string(),
            email: Email::parse("ada@example.com").unwrap(),
        }
    }

    #[test]
    fn test_cart_key() {
        assert_eq!(Identity::Guest.cart_key(), "guest");
        assert_eq!(Identity::from(ada()).cart_key(), "u-1");
    }

    #[test]
    fn test_from_option() {
        assert!(Identity::from(None).is_guest());
        assert_eq!(Identity::from(Some(ada())).profile(), Some(&ada()));
    }

    #[test]
    fn test_profile_ignores_unknown_fields() {
        let json = r#"{"id": 7, "name": "Ada", "email": "ada@example.com", "created_at": "x"}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.id.as_str(), "7");
    }
}
