// Library exports for the Warden service supervisor

pub mod cli;
pub mod config;
pub mod error;
pub mod exit;
pub mod health;
pub mod monitor;
pub mod process;
