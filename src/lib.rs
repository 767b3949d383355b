pub mod config;
pub mod error;
pub mod import;
pub mod output;
pub mod scoring;
pub mod table;
pub mod text;
