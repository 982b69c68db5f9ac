//! Orchestration of the daily newsletter run
//! Mail source → dedup gate → archive → optimizer → storage upserts

pub mod daily;

pub use daily::{DailyOrchestrator, RunOutcome};
