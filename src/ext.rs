//! Public extension contracts that let the presentation layer react to client events.
//!
//! The client never navigates or renders anything itself; it publishes events through these
//! traits and leaves the reaction (e.g. routing to a login view) to the subscriber.

pub mod session_observer;

pub use session_observer::*;
