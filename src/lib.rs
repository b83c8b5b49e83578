pub mod backend;
pub mod config;
pub mod due;
pub mod error;
pub mod fetch;
pub mod fleet;
pub mod history;
pub mod models;
pub mod observations;
pub mod order_number;
pub mod output;
