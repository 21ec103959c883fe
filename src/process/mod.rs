// Process module - lifecycle of the single supervised service

mod controller;
pub mod spawner;
mod types;

pub use controller::ProcessController;
pub use spawner::spawn_service;
pub use types::{ServiceStatus, SupervisedProcess};
