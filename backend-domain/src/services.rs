pub mod reconciler;
pub mod recipe_ranking;

pub use reconciler::*;
pub use recipe_ranking::*;
