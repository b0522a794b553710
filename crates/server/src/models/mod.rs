//! Request and response shapes that are not domain documents.
//!
//! Domain documents (`Item`, `Order`, ...) serialize straight from
//! `bazaar-core`; the types here cover what clients see instead of a stored
//! document (`UserProfile`, `CartLineView`) and what is kept in the session.

pub mod cart;
pub mod session;
pub mod user;

pub use cart::CartLineView;
pub use session::{ActingUser, keys as session_keys};
pub use user::UserProfile;
