//! Shared test utilities for engine integration tests
#![allow(dead_code)]

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;

use fluency_progress::progress::{CefrLevel, ManualClock, ProgressEngine, Session};
use fluency_progress::{EngineConfig, JsonFileStore, MemoryStore};

/// Config pinned to UTC so day boundaries do not depend on the host
pub fn utc_config() -> EngineConfig {
    EngineConfig {
        utc_offset_minutes: Some(0),
        ..EngineConfig::default()
    }
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// In-memory engine with a manual clock and a seeded generator
pub fn memory_engine(start: DateTime<Utc>) -> (ProgressEngine<MemoryStore>, ManualClock) {
    let clock = ManualClock::new(start);
    let engine = ProgressEngine::new(MemoryStore::new(), "learner", utc_config())
        .with_clock(Box::new(clock.clone()))
        .with_rng(Box::new(Mcg128Xsl64::seed_from_u64(42)));
    (engine, clock)
}

/// File-backed engine over `dir`
pub fn file_engine(dir: &Path, clock: &ManualClock) -> ProgressEngine<JsonFileStore> {
    ProgressEngine::new(JsonFileStore::new(dir), "learner", utc_config())
        .with_clock(Box::new(clock.clone()))
        .with_rng(Box::new(Mcg128Xsl64::seed_from_u64(42)))
}

pub fn session(activity: &str) -> Session {
    Session::new(CefrLevel::B1, activity, "travel")
}
