pub mod models;
pub mod services;
pub mod layout;
pub mod gesture;
pub mod errors;

pub use models::*;
pub use services::*;
pub use layout::*;
pub use gesture::*;
pub use errors::*;
