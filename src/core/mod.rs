pub mod config;
pub mod constants;
pub mod geo;
pub mod map;
pub mod mercator;
pub mod stats;
pub mod viewport;
