// Domain entities

pub mod config;
pub mod detection;
pub mod inventory;

pub use config::*;
pub use detection::*;
pub use inventory::*;
