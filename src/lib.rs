pub mod analyzers;
pub mod config;
pub mod error;
pub mod infra;
pub mod output;
pub mod parser;
pub mod services;
pub mod table;
