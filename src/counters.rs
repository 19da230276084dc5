//! Counters (component G): per-table `(lookups, matches)` and per-entry
//! `(packets, bytes, install_time)`. Every operation is an individual
//! atomic increment; there is no lock and no reset except on entry/table
//! deletion (spec §4.G, §5).

use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonic install sequence number, standing in for wall-clock
/// `install_time` (DESIGN.md Open Question 3): deterministic in tests,
/// still totally ordered across adds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct InstallSeq(pub u64);

/// A synthetic, stable identity assigned to a flow entry at add time
/// (DESIGN.md Design Note 1): counters are keyed by this, not by entry
/// contents, so `modify` preserves them without structural hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(pub u64);

/// Per-table lookup/match counters.
#[derive(Debug, Default)]
pub struct TableCounters {
    lookups: AtomicU64,
    matches: AtomicU64,
}

impl TableCounters {
    pub fn record_lookup(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_match(&self) {
        self.matches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    pub fn matches(&self) -> u64 {
        self.matches.load(Ordering::Relaxed)
    }
}

/// Per-entry packet/byte counters, created when the entry is installed and
/// removed when the entry is deleted (including supersession by add).
#[derive(Debug)]
pub struct EntryCounters {
    packets: AtomicU64,
    bytes: AtomicU64,
    install_time: InstallSeq,
}

impl EntryCounters {
    pub fn new(install_time: InstallSeq) -> Self {
        EntryCounters {
            packets: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            install_time,
        }
    }

    pub fn record_hit(&self, bytes: u64) {
        self.packets.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn packets(&self) -> u64 {
        self.packets.load(Ordering::Relaxed)
    }

    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    pub fn install_time(&self) -> InstallSeq {
        self.install_time
    }

    /// `reset_counts` flag semantics (DESIGN.md Open Question 4):
    /// zero the packet/byte counters, leave `install_time` untouched.
    pub fn reset(&self) {
        self.packets.store(0, Ordering::Relaxed);
        self.bytes.store(0, Ordering::Relaxed);
    }
}
