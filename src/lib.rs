pub mod capacity;
pub mod errors;
pub mod message;
pub mod model;
pub mod overflow;
pub mod scenario;
pub mod sim_config;
pub mod state;
pub mod tokens;
pub mod ui;
