pub mod cli;
pub mod cmd;
pub mod config;
pub mod context;
pub mod delegate;
pub mod extension;
pub mod firmware;
pub mod passthrough;
pub mod rawimage;
pub mod report;
pub mod util;
