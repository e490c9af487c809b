pub mod claim;
pub mod config;
pub mod general;
pub mod language;
pub mod utils;
