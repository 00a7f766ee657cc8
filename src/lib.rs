pub mod bootstrap;
pub mod common;
pub mod config;
pub mod workflow;
