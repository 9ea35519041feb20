//! Credential data types: redacted secrets, the access/refresh pair, and storage keys.

pub mod credentials;
pub mod secret;

pub use credentials::*;
pub use secret::*;
