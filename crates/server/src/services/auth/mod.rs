//! Authentication service.
//!
//! Provides password signup and signin. Passwords are stored as Argon2id PHC
//! strings.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;

use bazaar_core::accounts::validate_name;
use bazaar_core::{Email, NewUser, RootAdmin, User};

use crate::db::{RepositoryError, Store};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Display name given to a bootstrapped root admin.
pub const ROOT_ADMIN_NAME: &str = "Root Admin";

/// Signup form.
///
/// Missing fields deserialize as empty so they fail validation with a
/// readable message instead of a parse error.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUp {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
}

/// Signin form.
#[derive(Clone, Default, Deserialize)]
pub struct SignIn {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    store: &'a dyn Store,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Register a customer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidName`, `AuthError::InvalidEmail` or
    /// `AuthError::WeakPassword` for bad input, checked in that order.
    /// Returns `AuthError::EmailTaken` if the email is already registered.
    #[instrument(skip_all)]
    pub async fn signup(&self, form: SignUp) -> Result<User, AuthError> {
        self.register(form, false).await
    }

    /// Register a user with the given role. Used by the CLI to create admins.
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::signup`].
    #[instrument(skip(self, form))]
    pub async fn register(&self, form: SignUp, is_admin: bool) -> Result<User, AuthError> {
        let name = validate_name(&form.name).map_err(|_| AuthError::InvalidName)?;
        let email = Email::parse(&form.email)?;
        validate_password(&form.password)?;
        let password_hash = hash_password(&form.password)?;

        let user = self
            .store
            .insert_user(NewUser {
                name,
                email: email.clone(),
                password_hash,
                date_of_birth: form.date_of_birth,
                is_admin,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken(email.to_string()),
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Check an email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WrongEmail` if no account uses the email.
    /// Returns `AuthError::WrongPassword` if the password does not match.
    #[instrument(skip_all)]
    pub async fn signin(&self, form: &SignIn) -> Result<User, AuthError> {
        let email = Email::parse(&form.email).map_err(|_| AuthError::WrongEmail)?;

        let user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::WrongEmail)?;

        verify_password(&form.password, &user.password_hash)?;

        Ok(user)
    }

    /// Make sure the root admin exists and is an admin.
    ///
    /// Creates the account when it is missing and a password is available,
    /// and restores the admin flag if it was cleared directly in storage.
    /// Returns the account, or `None` if it is missing and no password was
    /// given.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the bootstrap password fails the
    /// policy, or a repository error.
    #[instrument(skip_all, fields(email = %root.email()))]
    pub async fn ensure_root_admin(
        &self,
        root: &RootAdmin,
        password: Option<&str>,
    ) -> Result<Option<User>, AuthError> {
        let mut uow = self.store.begin().await?;
        if let Some(mut user) = uow.user_by_email_for_update(root.email()).await? {
            if !user.is_admin {
                user.is_admin = true;
                uow.save_user(&user).await?;
                tracing::warn!(user_id = %user.id, "root admin flag restored");
            }
            uow.commit().await?;
            return Ok(Some(user));
        }
        uow.rollback().await?;

        let Some(password) = password else {
            return Ok(None);
        };
        let user = self
            .register(
                SignUp {
                    name: ROOT_ADMIN_NAME.to_owned(),
                    email: root.email().to_string(),
                    password: password.to_owned(),
                    date_of_birth: None,
                },
                true,
            )
            .await?;
        Ok(Some(user))
    }
}

/// Check the password policy.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` unless the password has at least
/// [`MIN_PASSWORD_LENGTH`] characters and one each of uppercase, lowercase,
/// digit and special character.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    let long_enough = password.chars().count() >= MIN_PASSWORD_LENGTH;
    let upper = password.chars().any(char::is_uppercase);
    let lower = password.chars().any(char::is_lowercase);
    let digit = password.chars().any(|c| c.is_ascii_digit());
    let special = password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace());

    if long_enough && upper && lower && digit && special {
        Ok(())
    } else {
        Err(AuthError::WeakPassword)
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::WrongPassword)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::WrongPassword)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn signup_form(email: &str) -> SignUp {
        SignUp {
            name: "Customer-4".to_owned(),
            email: email.to_owned(),
            password: "Customer@123".to_owned(),
            date_of_birth: None,
        }
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("Customer@123").is_ok());
        for weak in ["Cu@1", "customer@123", "CUSTOMER@123", "Customer@abc", "Customer1234"] {
            assert!(
                matches!(validate_password(weak), Err(AuthError::WeakPassword)),
                "{weak}"
            );
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Customer@123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Customer@123", &hash).is_ok());
        assert!(matches!(
            verify_password("Customer@124", &hash),
            Err(AuthError::WrongPassword)
        ));
    }

    #[tokio::test]
    async fn test_signup_then_signin() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);

        let user = auth.signup(signup_form(" Customer4@Customer.com ")).await.unwrap();
        assert_eq!(user.email.as_str(), "customer4@customer.com");
        assert!(!user.is_admin);

        let signed_in = auth
            .signin(&SignIn {
                email: "customer4@customer.com".to_owned(),
                password: "Customer@123".to_owned(),
            })
            .await
            .unwrap();
        assert_eq!(signed_in.id, user.id);
    }

    #[tokio::test]
    async fn test_signup_validation_order() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);

        let mut form = signup_form("not-an-email");
        form.name = "  ".to_owned();
        form.password = "weak".to_owned();
        assert!(matches!(auth.signup(form.clone()).await, Err(AuthError::InvalidName)));

        form.name = "Ada".to_owned();
        let err = auth.signup(form.clone()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "User validation failed: email: Please provide a valid email address"
        );

        form.email = "ada@example.com".to_owned();
        assert!(matches!(auth.signup(form).await, Err(AuthError::WeakPassword)));
    }

    #[tokio::test]
    async fn test_duplicate_email_message() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        auth.signup(signup_form("customer4@customer.com")).await.unwrap();

        let err = auth.signup(signup_form("customer4@customer.com")).await.unwrap_err();
        assert_eq!(err.to_string(), "customer4@customer.com: email already exist");
    }

    #[tokio::test]
    async fn test_signin_failures() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        auth.signup(signup_form("customer4@customer.com")).await.unwrap();

        let wrong_email = SignIn {
            email: "nobody@customer.com".to_owned(),
            password: "Customer@123".to_owned(),
        };
        assert!(matches!(auth.signin(&wrong_email).await, Err(AuthError::WrongEmail)));

        let wrong_password = SignIn {
            email: "customer4@customer.com".to_owned(),
            password: "Customer@999".to_owned(),
        };
        assert!(matches!(
            auth.signin(&wrong_password).await,
            Err(AuthError::WrongPassword)
        ));
    }

    #[tokio::test]
    async fn test_ensure_root_admin() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        let root = RootAdmin::new(Email::parse("admin@example.com").unwrap());

        assert!(auth.ensure_root_admin(&root, None).await.unwrap().is_none());

        let created = auth
            .ensure_root_admin(&root, Some("Admin@1234"))
            .await
            .unwrap()
            .unwrap();
        assert!(created.is_admin);
        assert_eq!(created.name, ROOT_ADMIN_NAME);

        let again = auth.ensure_root_admin(&root, None).await.unwrap().unwrap();
        assert_eq!(again.id, created.id);
    }
}
