//! Port traits the core is driven through.

pub mod config_port;
pub mod data_port;
