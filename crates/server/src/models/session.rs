//! Session-related types.

use serde::{Deserialize, Serialize};

use bazaar_core::{Email, User, UserId};

/// The signed-in user, as remembered by the session.
///
/// Only the identity is stored; the role is read from the user document on
/// every admin request so a demotion takes effect immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActingUser {
    pub id: UserId,
    pub email: Email,
}

impl From<&User> for ActingUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the signed-in user.
    pub const ACTING_USER: &str = "acting_user";
}
