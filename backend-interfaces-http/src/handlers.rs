pub mod detection_handlers;
pub mod ops_handlers;
pub mod recipe_handlers;

pub use detection_handlers::*;
pub use ops_handlers::*;
pub use recipe_handlers::*;
