pub mod detection_queries;
pub mod inventory_queries;
pub mod recipe_queries;
