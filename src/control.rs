//! The control-plane surface (component H): applies flow-mods and table-mods,
//! returns errors, and exposes read-only stats snapshots.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{info, trace};

use crate::counters::{EntryId, InstallSeq};
use crate::error::{ModifyFlowError, ModifyFlowResult};
use crate::instruction::Instruction;
use crate::oxm::Oxm;
use crate::registry::{TableRegistry, DEFAULT_MAX_TABLES};
use crate::table::{FlowEntrySpec, FlowModFlags, FlowSelector, MissConfig, TableId};

/// The flow-mod command kinds (spec §4.E, §6).
#[derive(Debug, Clone)]
pub enum FlowModCommand {
    Add,
    Modify,
    ModifyStrict,
    Delete,
    DeleteStrict,
}

/// `flow_mod = {table_id, command, priority, match, instructions, flags, cookie, timeouts}`.
#[derive(Debug, Clone)]
pub struct FlowMod {
    pub table_id: TableId,
    pub command: FlowModCommand,
    pub priority: u16,
    pub match_fields: Vec<Oxm>,
    pub instructions: Vec<Instruction>,
    pub flags: FlowModFlags,
    pub cookie: u64,
    /// Carried through to the installed entry but not enforced by this
    /// core (spec Non-goals: "flow expiration timers ... beyond exposing
    /// the fields").
    pub idle_timeout: u16,
    pub hard_timeout: u16,
}

/// `table_mod`: sets `miss_config` of a table.
#[derive(Debug, Clone)]
pub struct TableMod {
    pub table_id: TableId,
    pub miss_config: MissConfig,
}

/// Read-only snapshot of a table's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableStats {
    pub table_id: TableId,
    pub lookups: u64,
    pub matches: u64,
}

/// Read-only snapshot of one flow entry's counters, for a flow-stats reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowStats {
    pub priority: u16,
    pub cookie: u64,
    pub packets: u64,
    pub bytes: u64,
    pub install_time: InstallSeq,
}

/// An aggregate over a set of flow entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AggregateStats {
    pub packet_count: u64,
    pub byte_count: u64,
    pub flow_count: u64,
}

/// Empty-shell stats types (spec §4.H: "the other stats accessors return
/// empty shells" — group tables, meters, queues, and port statistics are
/// out of scope, §1). Kept as real, stable types rather than `todo!()` so
/// a controller collaborator built against this surface doesn't need a
/// feature flag to find out they're unimplemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DescStats;
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortStats;
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueueStats;
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupStats;

/// The control-plane surface over one table registry.
pub struct ControlPlane {
    registry: TableRegistry,
    next_entry_id: AtomicU64,
    next_install_seq: AtomicU64,
}

impl ControlPlane {
    pub fn new() -> Self {
        Self::with_max_tables(DEFAULT_MAX_TABLES)
    }

    pub fn with_max_tables(max_tables: usize) -> Self {
        ControlPlane {
            registry: TableRegistry::new(max_tables),
            next_entry_id: AtomicU64::new(0),
            next_install_seq: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    fn alloc_entry_id(&self) -> EntryId {
        EntryId(self.next_entry_id.fetch_add(1, Ordering::Relaxed))
    }

    fn alloc_install_seq(&self) -> InstallSeq {
        InstallSeq(self.next_install_seq.fetch_add(1, Ordering::Relaxed))
    }

    /// Apply one flow-mod command. Errors leave the targeted table
    /// byte-identical to its prior state (spec §7: atomic rejection) since
    /// every error path here returns before taking the table's write lock.
    pub fn modify_flow(&self, flow_mod: FlowMod) -> ModifyFlowResult {
        let table_lock = self.registry.table(flow_mod.table_id)?;

        match flow_mod.command {
            FlowModCommand::Add => {
                let spec = FlowEntrySpec {
                    priority: flow_mod.priority,
                    match_fields: flow_mod.match_fields,
                    instructions: flow_mod.instructions,
                    cookie: flow_mod.cookie,
                    flags: flow_mod.flags,
                };
                let id = self.alloc_entry_id();
                let install_time = self.alloc_install_seq();
                table_lock.write().add(spec, id, install_time).map(|_| ())?;
                trace!(table_id = ?flow_mod.table_id, priority = flow_mod.priority, "flow entry added");
                Ok(())
            }
            FlowModCommand::Modify | FlowModCommand::ModifyStrict => {
                let strict = matches!(flow_mod.command, FlowModCommand::ModifyStrict);
                let selector = FlowSelector {
                    match_fields: flow_mod.match_fields,
                    priority: if strict { Some(flow_mod.priority) } else { None },
                };
                table_lock
                    .write()
                    .modify(&selector, flow_mod.instructions, flow_mod.flags.reset_counts);
                Ok(())
            }
            FlowModCommand::Delete | FlowModCommand::DeleteStrict => {
                let strict = matches!(flow_mod.command, FlowModCommand::DeleteStrict);
                let selector = FlowSelector {
                    match_fields: flow_mod.match_fields,
                    priority: if strict { Some(flow_mod.priority) } else { None },
                };
                table_lock.write().delete(&selector);
                Ok(())
            }
        }
    }

    /// `modify_table(table_mod)`: sets `miss_config` of a table.
    pub fn modify_table(&self, table_mod: TableMod) -> ModifyFlowResult {
        self.registry.set_miss_config(table_mod.table_id, table_mod.miss_config)?;
        info!(table_id = ?table_mod.table_id, miss_config = ?table_mod.miss_config, "table miss policy updated");
        Ok(())
    }

    /// Read-only per-table counter snapshot.
    pub fn table_stats(&self, table_id: TableId) -> Result<TableStats, ModifyFlowError> {
        let table = self.registry.table(table_id)?.read();
        Ok(TableStats {
            table_id,
            lookups: table.counters.lookups(),
            matches: table.counters.matches(),
        })
    }

    /// Read-only per-entry counter snapshots for every entry in `table_id`.
    pub fn flow_stats(&self, table_id: TableId) -> Result<Vec<FlowStats>, ModifyFlowError> {
        let table = self.registry.table(table_id)?.read();
        Ok(table
            .entries()
            .iter()
            .map(|e| FlowStats {
                priority: e.priority,
                cookie: e.cookie,
                packets: e.counters.packets(),
                bytes: e.counters.bytes(),
                install_time: e.counters.install_time(),
            })
            .collect())
    }

    /// Aggregate counters over every entry in `table_id`.
    pub fn aggregate_stats(&self, table_id: TableId) -> Result<AggregateStats, ModifyFlowError> {
        let table = self.registry.table(table_id)?.read();
        let mut stats = AggregateStats::default();
        for entry in table.entries() {
            stats.packet_count += entry.counters.packets();
            stats.byte_count += entry.counters.bytes();
            stats.flow_count += 1;
        }
        Ok(stats)
    }

    pub fn desc_stats(&self) -> DescStats {
        DescStats
    }

    pub fn port_stats(&self) -> Vec<PortStats> {
        Vec::new()
    }

    pub fn queue_stats(&self) -> Vec<QueueStats> {
        Vec::new()
    }

    pub fn group_stats(&self) -> Vec<GroupStats> {
        Vec::new()
    }
}

impl Default for ControlPlane {
    fn default() -> Self {
        Self::new()
    }
}
