pub mod accessibility;
pub mod board;
pub mod config;
pub mod controller;
pub mod error;
pub mod eta;
pub mod feeds;
pub mod fetch;
pub mod models;
pub mod output;
pub mod parser;
pub mod session;
pub mod stations;
pub mod trip_id;
