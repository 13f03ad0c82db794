//! Infrastructure layer providing external service integrations.
//!
//! Row sources (files and URLs), layout persistence, CSV export and the
//! system clipboard live here. Everything fallible returns
//! [`InfrastructureError`].

pub mod clipboard;
pub mod errors;
pub mod persistence;
pub mod remote;

pub use clipboard::*;
pub use errors::*;
pub use persistence::*;
pub use remote::*;
