//! Application layer managing state and workflows.
//!
//! This module coordinates between the domain layer and the presentation
//! layer: the pure grid state record, the grid engine that owns rows and
//! callbacks, and the terminal application state.

pub mod app;
pub mod grid;
pub mod state;

pub use app::*;
pub use grid::*;
pub use state::*;
