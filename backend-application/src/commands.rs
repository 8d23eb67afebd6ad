pub mod detection_commands;
pub mod inventory_commands;
