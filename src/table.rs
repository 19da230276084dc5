//! The flow table (component E): an ordered collection of flow entries by
//! priority, with overlap-checked add and subset-compatible modify/delete.
//!
//! This module is the pure data-structure layer: it has no notion of
//! concurrency (that's [`crate::registry`], which wraps a `Table` in a
//! lock) and no notion of which table is "current" in a pipeline traversal
//! (that's [`crate::pipeline`]).

use std::sync::Arc;

use crate::counters::{EntryCounters, EntryId, InstallSeq, TableCounters};
use crate::error::ModifyFlowError;
use crate::instruction::Instruction;
use crate::oxm::{self, Oxm};

/// A table id, `0..MAX_TABLES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableId(pub u8);

/// How a table handles a packet that matches no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissConfig {
    #[default]
    Drop,
    Controller,
    Continue,
}

/// Flags carried by a flow-mod, as named in spec §4.E/§7/§9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlowModFlags {
    /// `add` is refused if this is set and the overlap predicate fires.
    pub check_overlap: bool,
    /// On `modify`/`modify_strict`, reset the matched entries' packet/byte
    /// counters to zero (DESIGN.md Open Question 4).
    pub reset_counts: bool,
}

/// A flow entry resident in a table.
#[derive(Debug, Clone)]
pub struct FlowEntry {
    pub id: EntryId,
    pub priority: u16,
    pub match_fields: Vec<Oxm>,
    pub instructions: Vec<Instruction>,
    pub cookie: u64,
    pub flags: FlowModFlags,
    pub counters: Arc<EntryCounters>,
}

/// The specification for a new flow entry, as carried by an `add` flow-mod.
#[derive(Debug, Clone)]
pub struct FlowEntrySpec {
    pub priority: u16,
    pub match_fields: Vec<Oxm>,
    pub instructions: Vec<Instruction>,
    pub cookie: u64,
    pub flags: FlowModFlags,
}

/// The selector used by `modify`/`delete` commands to pick which entries
/// to act on.
#[derive(Debug, Clone)]
pub struct FlowSelector {
    pub match_fields: Vec<Oxm>,
    /// `Some(priority)` for the strict commands (exact `(match, priority)`
    /// pair); `None` for the loose commands (every field-equal superset,
    /// any priority).
    pub priority: Option<u16>,
}

/// Exact structural equality of two match sets (class, field, value, mask
/// of every `Oxm`), independent of field order. Used wherever a command
/// asks for the *same* match set rather than a field-equal superset/subset
/// of it — `field_equal`'s masked, asymmetric comparison is the wrong tool
/// there, since it applies `self`'s mask and isn't commutative.
fn same_match_fields(a: &[Oxm], b: &[Oxm]) -> bool {
    a.len() == b.len() && a.iter().all(|f| b.contains(f))
}

impl FlowSelector {
    /// Whether `entry` is selected, per DESIGN.md Open Question 2: loose
    /// selection uses the same field-equality rule as the match evaluator,
    /// applied to match sets instead of packets. Strict selection requires
    /// the selector's match set to be exactly the entry's, not just
    /// field-equal to it.
    fn selects(&self, entry: &FlowEntry) -> bool {
        if let Some(priority) = self.priority {
            priority == entry.priority && same_match_fields(&self.match_fields, &entry.match_fields)
        } else {
            oxm::matches(&self.match_fields, &entry.match_fields)
        }
    }
}

/// An ordered bag of flow entries with a miss policy (spec §3 "Flow table").
#[derive(Debug)]
pub struct Table {
    pub id: TableId,
    /// Invariant: sorted by non-increasing priority at all times; ties
    /// broken by insertion order.
    entries: Vec<FlowEntry>,
    pub miss_config: MissConfig,
    pub counters: Arc<TableCounters>,
}

impl Table {
    pub fn new(id: TableId) -> Self {
        Table {
            id,
            entries: Vec::new(),
            miss_config: MissConfig::default(),
            counters: Arc::new(TableCounters::default()),
        }
    }

    pub fn entries(&self) -> &[FlowEntry] {
        &self.entries
    }

    /// Two entries collide on the overlap predicate this core implements
    /// (DESIGN.md Open Question 1: priority equality is the minimum
    /// conformance check spec §4.E names; field-set overlap is also
    /// conformant but not implemented here).
    fn overlaps(&self, priority: u16) -> bool {
        self.entries.iter().any(|e| e.priority == priority)
    }

    /// `add`: insert a new entry, maintaining priority-descending order
    /// and insertion-order among ties. Rejects with `overlap` if
    /// `flags.check_overlap` is set and the priority collides. An existing
    /// entry sharing this entry's exact `(match, priority)` is superseded:
    /// removed, counters and all, before the new entry (with fresh
    /// counters) is installed, keeping the no-two-entries-share-
    /// `(match, priority)` invariant across repeated `add`s.
    pub fn add(&mut self, spec: FlowEntrySpec, id: EntryId, install_time: InstallSeq) -> Result<EntryId, ModifyFlowError> {
        if spec.flags.check_overlap && self.overlaps(spec.priority) {
            return Err(ModifyFlowError::Overlap { priority: spec.priority });
        }

        self.entries
            .retain(|e| !(e.priority == spec.priority && same_match_fields(&e.match_fields, &spec.match_fields)));

        let entry = FlowEntry {
            id,
            priority: spec.priority,
            match_fields: spec.match_fields,
            instructions: spec.instructions,
            cookie: spec.cookie,
            flags: spec.flags,
            counters: Arc::new(EntryCounters::new(install_time)),
        };

        // Insert after the last entry with equal-or-greater priority, so
        // the list stays non-increasing and ties land after existing equals.
        let position = self
            .entries
            .iter()
            .position(|e| e.priority < entry.priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(position, entry);
        Ok(id)
    }

    /// `modify` / `modify_strict`: update `instructions` (and, per
    /// `reset_counts`, reset the counters) of every selected entry.
    /// Returns the number of entries updated.
    pub fn modify(&mut self, selector: &FlowSelector, instructions: Vec<Instruction>, reset_counts: bool) -> usize {
        let mut updated = 0;
        for entry in self.entries.iter_mut().filter(|e| selector.selects(e)) {
            entry.instructions = instructions.clone();
            if reset_counts {
                entry.counters.reset();
            }
            updated += 1;
        }
        updated
    }

    /// `delete` / `delete_strict`: remove every selected entry and its
    /// counter record (dropping the last `Arc<EntryCounters>` reference).
    /// Returns the number of entries removed.
    pub fn delete(&mut self, selector: &FlowSelector) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !selector.selects(e));
        before - self.entries.len()
    }

    /// Invariant check usable from tests: entries are non-increasingly
    /// ordered by priority, and no two entries share `(match, priority)`.
    #[cfg(test)]
    fn check_invariants(&self) {
        for pair in self.entries.windows(2) {
            assert!(pair[0].priority >= pair[1].priority);
        }
        for (i, a) in self.entries.iter().enumerate() {
            for b in self.entries.iter().skip(i + 1) {
                if a.priority == b.priority {
                    assert!(
                        !same_match_fields(&a.match_fields, &b.match_fields),
                        "duplicate (match, priority) pair"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(priority: u16, fields: Vec<Oxm>, check_overlap: bool) -> FlowEntrySpec {
        FlowEntrySpec {
            priority,
            match_fields: fields,
            instructions: vec![],
            cookie: 0,
            flags: FlowModFlags {
                check_overlap,
                reset_counts: false,
            },
        }
    }

    #[test]
    fn add_keeps_priority_descending_order() {
        let mut table = Table::new(TableId(0));
        table.add(spec(100, vec![], false), EntryId(1), InstallSeq(1)).unwrap();
        table.add(spec(200, vec![], false), EntryId(2), InstallSeq(2)).unwrap();
        table.add(spec(150, vec![], false), EntryId(3), InstallSeq(3)).unwrap();
        let priorities: Vec<u16> = table.entries().iter().map(|e| e.priority).collect();
        assert_eq!(priorities, vec![200, 150, 100]);
        table.check_invariants();
    }

    #[test]
    fn overlap_rejected_when_flagged() {
        let mut table = Table::new(TableId(0));
        table
            .add(spec(50, vec![oxm::fields::in_port(1)], false), EntryId(1), InstallSeq(1))
            .unwrap();
        let before_len = table.entries().len();
        let result = table.add(
            spec(50, vec![oxm::fields::in_port(2)], true),
            EntryId(2),
            InstallSeq(2),
        );
        assert_eq!(result, Err(ModifyFlowError::Overlap { priority: 50 }));
        assert_eq!(table.entries().len(), before_len);
    }

    #[test]
    fn add_supersedes_existing_entry_with_same_match_and_priority() {
        let mut table = Table::new(TableId(0));
        let fields = vec![oxm::fields::in_port(1)];
        table
            .add(spec(50, fields.clone(), false), EntryId(1), InstallSeq(1))
            .unwrap();
        table.entries()[0].counters.record_hit(64);

        table.add(spec(50, fields, false), EntryId(2), InstallSeq(2)).unwrap();

        assert_eq!(table.entries().len(), 1);
        assert_eq!(table.entries()[0].id, EntryId(2));
        assert_eq!(table.entries()[0].counters.packets(), 0);
        table.check_invariants();
    }

    #[test]
    fn add_does_not_supersede_different_match_at_same_priority() {
        let mut table = Table::new(TableId(0));
        table
            .add(spec(50, vec![oxm::fields::in_port(1)], false), EntryId(1), InstallSeq(1))
            .unwrap();
        table
            .add(spec(50, vec![oxm::fields::in_port(2)], false), EntryId(2), InstallSeq(2))
            .unwrap();
        assert_eq!(table.entries().len(), 2);
        table.check_invariants();
    }

    #[test]
    fn strict_selector_does_not_match_differently_masked_entry() {
        let mut table = Table::new(TableId(0));
        let masked = Oxm::masked(oxm::consts::IN_PORT, oxm::OxmValue::U32(0x0102_0304), oxm::OxmValue::U32(0x00ff_ffff));
        table.add(spec(10, vec![masked], false), EntryId(1), InstallSeq(1)).unwrap();

        let selector = FlowSelector {
            match_fields: vec![oxm::fields::in_port(0x0102_0304)],
            priority: Some(10),
        };
        assert_eq!(table.delete(&selector), 0);
        assert_eq!(table.entries().len(), 1);
    }

    #[test]
    fn add_then_delete_restores_entry_set() {
        let mut table = Table::new(TableId(0));
        let fields = vec![oxm::fields::in_port(1)];
        table.add(spec(10, fields.clone(), false), EntryId(1), InstallSeq(1)).unwrap();
        assert_eq!(table.entries().len(), 1);

        let selector = FlowSelector {
            match_fields: fields,
            priority: Some(10),
        };
        let removed = table.delete(&selector);
        assert_eq!(removed, 1);
        assert!(table.entries().is_empty());
    }

    #[test]
    fn modify_loose_matches_subset_selector() {
        let mut table = Table::new(TableId(0));
        let fields = vec![oxm::fields::in_port(1), oxm::fields::ip_protocol(6)];
        table.add(spec(10, fields, false), EntryId(1), InstallSeq(1)).unwrap();

        let selector = FlowSelector {
            match_fields: vec![oxm::fields::in_port(1)],
            priority: None,
        };
        let updated = table.modify(&selector, vec![Instruction::ClearActions], false);
        assert_eq!(updated, 1);
        assert!(matches!(table.entries()[0].instructions[0], Instruction::ClearActions));
    }

    #[test]
    fn modify_preserves_counters() {
        let mut table = Table::new(TableId(0));
        table.add(spec(10, vec![], false), EntryId(1), InstallSeq(1)).unwrap();
        table.entries()[0].counters.record_hit(64);

        let selector = FlowSelector {
            match_fields: vec![],
            priority: Some(10),
        };
        table.modify(&selector, vec![Instruction::ClearActions], false);
        assert_eq!(table.entries()[0].counters.packets(), 1);
    }

    #[test]
    fn reset_counts_flag_zeroes_counters_on_modify() {
        let mut table = Table::new(TableId(0));
        table.add(spec(10, vec![], false), EntryId(1), InstallSeq(1)).unwrap();
        table.entries()[0].counters.record_hit(64);

        let selector = FlowSelector {
            match_fields: vec![],
            priority: Some(10),
        };
        table.modify(&selector, vec![], true);
        assert_eq!(table.entries()[0].counters.packets(), 0);
    }
}
