//! Credential types shared by the providers, the store, and the token client.

mod credential;
mod secret;

pub use credential::*;
pub use secret::*;
