pub mod config;
pub mod errors;
pub mod events;
pub mod ids;
pub mod model;
