//! agrigrid - Terminal Data Grid Library
//!
//! An interactive tabular grid engine with single-column sorting,
//! per-column filtering, row selection, collapsible grouping and column
//! resize/reorder gestures, plus the terminal front end built on it.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
pub use application::*;
