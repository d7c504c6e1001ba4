//! Burp-style attack request generation and replay.
//!
//! A [`RequestTemplate`](template::RequestTemplate) plus a set of insertion
//! points and payload lists form an [`AttackPlan`](generate::AttackPlan);
//! the plan enumerates mutated requests lazily under one of four strategies
//! and the [`Intruder`](attack::Intruder) replays them through a transport
//! with rate limiting and cancellation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

pub mod attack;
pub mod generate;
pub mod template;

pub use attack::{AttackRecord, CancelHandle, Intruder, Progress};
pub use generate::AttackPlan;
pub use template::{InsertionPoint, PointKind, RequestTemplate, Section};

/// Payload-cycling strategy, mirroring the classic intruder modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackType {
    /// One point at a time; all others keep their original bytes.
    Sniper,
    /// The same payload substituted into every point simultaneously.
    BatteringRam,
    /// Payload lists walked in lockstep, one index per iteration.
    Pitchfork,
    /// Full Cartesian product; the last point advances fastest.
    ClusterBomb,
}

impl AttackType {
    pub fn name(&self) -> &'static str {
        match self {
            AttackType::Sniper => "sniper",
            AttackType::BatteringRam => "battering-ram",
            AttackType::Pitchfork => "pitchfork",
            AttackType::ClusterBomb => "cluster-bomb",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sniper" => Some(AttackType::Sniper),
            "battering-ram" | "battering_ram" => Some(AttackType::BatteringRam),
            "pitchfork" => Some(AttackType::Pitchfork),
            "cluster-bomb" | "cluster_bomb" => Some(AttackType::ClusterBomb),
            _ => None,
        }
    }
}

/// Load one payload per non-empty line from a wordlist file.
pub fn load_payload_file(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read payload file {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
