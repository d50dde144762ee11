// src/commands/mod.rs
pub mod init;
pub mod helpers;
mod api;

pub use api::{Deliberation, MotherCore, Perception, Reply, TurnState};

pub use init::{InitReport, ensure_initialized, mothercore_root};
