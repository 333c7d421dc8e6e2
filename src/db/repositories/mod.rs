pub mod api_key;
pub mod impersonation;
pub mod transaction;
pub mod user;
pub mod wallet;
