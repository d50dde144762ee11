// src/services/mod.rs

pub mod affect;
pub mod audit;
pub mod guardian;     // pure risk scoring; no I/O
pub mod memory;       // the ONLY writer of the memory file
pub mod oversight;
pub mod planner;
pub mod skills;

// Public API
pub use affect::{AffectDelta, AffectState};
pub use audit::AuditLog;
pub use guardian::{Guardian, RiskLevel, RiskReport};
pub use memory::{MemoryItem, MemoryKind, MemoryStore};
pub use oversight::{Oversight, OversightAck};
pub use planner::{Plan, PlanArchive, Planner, Step};
pub use skills::{SkillContext, Skills, Toolkit};
