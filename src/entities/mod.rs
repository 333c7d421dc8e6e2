pub mod prelude;

pub mod api_keys;
pub mod impersonation_sessions;
pub mod pix_wallets;
pub mod transactions;
pub mod users;
