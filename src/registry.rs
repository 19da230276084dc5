//! The table registry: `table_id -> Table`, `0..max_tables`.
//!
//! Concurrency policy (spec §5, design note 2 strategy (a)): every table
//! is preallocated at construction and wrapped in its own
//! `parking_lot::RwLock`. A packet traversal takes the read side only long
//! enough to clone the entries snapshot, then drops it before running
//! match/instruction evaluation — so a traversal never holds a lock across
//! a `goto` into another table, and two concurrent flow-mods against
//! different tables never contend with each other. Flow-mods against the
//! *same* table take the write side for the duration of the
//! add/modify/delete, which is what makes two concurrent flow-mods against
//! one table totally ordered.

use parking_lot::RwLock;

use crate::error::ModifyFlowError;
use crate::table::{MissConfig, Table, TableId};

/// Default number of flow tables (spec §6: "default 256 per OpenFlow 1.2").
pub const DEFAULT_MAX_TABLES: usize = 256;

/// The fixed-size table space. Table ids are `0..max_tables`; table 0
/// always exists (trivially, since every table is preallocated).
pub struct TableRegistry {
    tables: Vec<RwLock<Table>>,
}

impl TableRegistry {
    /// Preallocate `max_tables` empty tables (`miss_config = drop`).
    /// `max_tables` is clamped to 256 (the id space a `u8` can address).
    pub fn new(max_tables: usize) -> Self {
        let max_tables = max_tables.clamp(1, DEFAULT_MAX_TABLES);
        let tables = (0..max_tables)
            .map(|id| RwLock::new(Table::new(TableId(id as u8))))
            .collect();
        TableRegistry { tables }
    }

    /// The default OpenFlow 1.2+ table count.
    pub fn default_size() -> Self {
        Self::new(DEFAULT_MAX_TABLES)
    }

    pub fn max_tables(&self) -> usize {
        self.tables.len()
    }

    pub fn table(&self, id: TableId) -> Result<&RwLock<Table>, ModifyFlowError> {
        self.tables
            .get(id.0 as usize)
            .ok_or(ModifyFlowError::BadTableId(id))
    }

    pub fn set_miss_config(&self, id: TableId, miss_config: MissConfig) -> Result<(), ModifyFlowError> {
        let table = self.table(id)?;
        table.write().miss_config = miss_config;
        Ok(())
    }
}
