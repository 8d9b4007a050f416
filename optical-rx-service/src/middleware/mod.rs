pub mod account;
pub mod admin;

pub use account::{AccountId, ACCOUNT_ID_HEADER};
pub use admin::{admin_auth_middleware, ADMIN_KEY_HEADER};
