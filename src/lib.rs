pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod model;
pub mod repl;
pub mod sandbox;
