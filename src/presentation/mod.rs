//! Presentation layer handling terminal UI and user input.
//!
//! This module renders the grid with ratatui, maps keyboard and mouse
//! events onto grid operations and keeps track of where headers were drawn.

pub mod geometry;
pub mod input;
pub mod ui;

pub use geometry::*;
pub use input::*;
pub use ui::*;
