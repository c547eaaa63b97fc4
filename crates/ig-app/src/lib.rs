pub mod account;
pub mod config;
pub mod error;
pub mod events;
pub mod generator;
pub mod job;
pub mod state;
