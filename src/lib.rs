pub mod artifact;
pub mod classify;
pub mod clean_sheets;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod gameweek;
pub mod http_client;
pub mod locate;
pub mod manifest;
pub mod matrix;
pub mod pipeline;
