pub mod address;
pub mod enums;
pub mod profile;
pub mod settings;
