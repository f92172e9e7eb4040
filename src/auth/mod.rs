pub mod authenticator;
pub mod policy;
pub mod token;

pub use authenticator::{authenticate, CallerIdentity, ServiceStore};
