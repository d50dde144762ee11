//! MotherCore: a small deliberation core for safe-agent experiments.
//!
//! One user turn flows `perceive → protect → route → compose → disclose`, and every
//! significant event lands in an append-only audit trail. Planning runs beside it:
//! a goal becomes a fixed reversible-first plan whose approval is gated on risk.
//!
//! Start from [`MotherCore::open`].

pub mod commands;
pub mod config;
pub mod constitution;
pub mod error;
pub mod services;
pub mod utils;

pub use commands::{MotherCore, Reply};
pub use error::CoreError;
