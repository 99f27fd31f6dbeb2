//! breakout — daily breakout strategy simulator.
//!
//! Hexagonal architecture: the simulation core lives in [`domain`], port traits
//! in [`ports`], concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
