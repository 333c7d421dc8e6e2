pub use super::api_keys::Entity as ApiKeys;
pub use super::impersonation_sessions::Entity as ImpersonationSessions;
pub use super::pix_wallets::Entity as PixWallets;
pub use super::transactions::Entity as Transactions;
pub use super::users::Entity as Users;
