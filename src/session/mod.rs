/// Credential persistence - Gateway

mod credentials;
mod store;

pub use credentials::{CredentialPair, Session};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};

#[cfg(test)]
pub(crate) use store::MockTokenStore;
