pub mod identity;
pub mod token_store;

pub use identity::{Identity, IdentityGate, IdentityOrigin, resolve_identity};
