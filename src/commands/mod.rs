pub mod inventory;
pub mod status;
pub mod structure;
