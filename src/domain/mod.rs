pub mod roles;
pub mod webhook;

pub use roles::{Role, UserStatus, scope_granted};
pub use webhook::{ProviderCallback, TransactionConfirmation};
