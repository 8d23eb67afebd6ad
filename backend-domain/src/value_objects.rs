// Domain value objects
pub mod apply_sign;
pub mod identifiers;
pub mod inventory_key;
pub mod storage_location;

pub use apply_sign::*;
pub use identifiers::*;
pub use inventory_key::*;
pub use storage_location::*;
