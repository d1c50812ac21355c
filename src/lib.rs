pub mod cli;
pub mod config;
pub mod deployment;
pub mod diagnose;
pub mod report;
pub mod teamcity_client;
pub mod types;

pub use types::DeployError;
