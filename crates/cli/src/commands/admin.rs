//! Admin account commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an admin account
//! bz-cli admin create -e admin@example.com -n "Admin Name" -p 'S3cure!pass'
//!
//! # Create the root admin (ROOT_ADMIN_EMAIL / ROOT_ADMIN_PASSWORD)
//! bz-cli admin ensure-root
//! ```
//!
//! # Environment Variables
//!
//! - `BAZAAR_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `ROOT_ADMIN_EMAIL`, `ROOT_ADMIN_PASSWORD` - for `ensure-root`

use secrecy::ExposeSecret;
use thiserror::Error;

use bazaar_core::{RootAdmin, UserId};
use bazaar_server::config::{ConfigError, ServerConfig};
use bazaar_server::db::PgStore;
use bazaar_server::services::AuthError;
use bazaar_server::services::auth::{AuthService, SignUp};

use super::{ConnectError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation or storage failure while creating the account.
    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("ROOT_ADMIN_PASSWORD is not set and the root admin does not exist")]
    RootPasswordMissing,
}

/// Create a new admin account.
///
/// The name, email and password go through the same checks as a customer
/// signup.
///
/// # Returns
///
/// The ID of the created account.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<UserId, AdminError> {
    let pool = connect().await?;
    let store = PgStore::new(pool);

    tracing::info!("Creating admin user: {}", email);
    let user = AuthService::new(&store)
        .register(
            SignUp {
                name: name.to_owned(),
                email: email.to_owned(),
                password: password.to_owned(),
                date_of_birth: None,
            },
            true,
        )
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(user.id)
}

/// Create the root admin from the server configuration if it is missing.
pub async fn ensure_root() -> Result<UserId, AdminError> {
    let config = ServerConfig::from_env()?;
    let pool = connect().await?;
    let store = PgStore::new(pool);

    let root = RootAdmin::new(config.root_admin_email.clone());
    let password = config
        .root_admin_password
        .as_ref()
        .map(|p| p.expose_secret().to_owned());

    let user = AuthService::new(&store)
        .ensure_root_admin(&root, password.as_deref())
        .await?
        .ok_or(AdminError::RootPasswordMissing)?;

    tracing::info!("Root admin ready. ID: {}, Email: {}", user.id, user.email);
    Ok(user.id)
}
