//! Bearer credential model and token claim helpers.

pub mod claims;
pub mod credential;

pub use claims::*;
pub use credential::*;
