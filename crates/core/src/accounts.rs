//! User documents and the protected root admin.

use chrono::{DateTime, NaiveDate, Utc};

use crate::{Cart, CommerceError, Email, Order, Role, UserId};

/// A stored account with its embedded cart and order history.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    /// Argon2id PHC string. Never leaves the server.
    pub password_hash: String,
    pub date_of_birth: Option<NaiveDate>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub cart: Cart,
    pub orders: Vec<Order>,
}

impl User {
    /// Build a user from a validated signup.
    #[must_use]
    pub fn create(id: UserId, new: NewUser, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            date_of_birth: new.date_of_birth,
            is_admin: new.is_admin,
            created_at,
            cart: Cart::new(),
            orders: Vec::new(),
        }
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        Role::from_admin_flag(self.is_admin)
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("date_of_birth", &self.date_of_birth)
            .field("is_admin", &self.is_admin)
            .field("created_at", &self.created_at)
            .field("cart", &self.cart)
            .field("orders", &self.orders.len())
            .finish()
    }
}

/// Input for creating a user. The password is already hashed.
#[derive(Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub date_of_birth: Option<NaiveDate>,
    pub is_admin: bool,
}

impl NewUser {
    /// Trim the name and require it to be non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::InvalidInput`] for a blank name.
    pub fn validated(mut self) -> Result<Self, CommerceError> {
        self.name = validate_name(&self.name)?;
        Ok(self)
    }
}

/// Trimmed, non-empty display name.
///
/// # Errors
///
/// Returns [`CommerceError::InvalidInput`] for a blank name.
pub fn validate_name(name: &str) -> Result<String, CommerceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CommerceError::InvalidInput("Name is required".to_owned()));
    }
    Ok(name.to_owned())
}

/// The administrator configured by email that cannot be demoted, edited
/// through profile endpoints or deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootAdmin(Email);

impl RootAdmin {
    #[must_use]
    pub const fn new(email: Email) -> Self {
        Self(email)
    }

    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.0
    }

    /// Whether `user` is the root admin.
    #[must_use]
    pub fn is(&self, user: &User) -> bool {
        user.email == self.0
    }

    /// Whether `email` belongs to the root admin.
    #[must_use]
    pub fn owns(&self, email: &Email) -> bool {
        *email == self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_user() -> User {
        User::create(
            UserId::new(1),
            NewUser {
                name: "Customer-6".to_owned(),
                email: Email::parse("customer6@customer.com").unwrap(),
                password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_owned(),
                date_of_birth: None,
                is_admin: false,
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_new_user_starts_empty() {
        let user = sample_user();
        assert!(user.cart.is_empty());
        assert!(user.orders.is_empty());
        assert_eq!(user.role(), Role::Customer);
    }

    #[test]
    fn test_debug_hides_password_hash() {
        let rendered = format!("{:?}", sample_user());
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("argon2id"));
    }

    #[test]
    fn test_blank_name_rejected() {
        assert_eq!(
            validate_name("   "),
            Err(CommerceError::InvalidInput("Name is required".to_owned()))
        );
        assert_eq!(validate_name("  Ada ").unwrap(), "Ada");
    }

    #[test]
    fn test_root_admin_matches_normalized_email() {
        let root = RootAdmin::new(Email::parse("Admin@Example.com").unwrap());
        let mut user = sample_user();
        assert!(!root.is(&user));

        user.email = Email::parse("admin@example.com").unwrap();
        user.is_admin = true;
        assert!(root.is(&user));
        assert!(root.owns(&Email::parse("ADMIN@example.com").unwrap()));
    }
}
