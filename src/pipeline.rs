//! The pipeline driver (component F): iterates tables starting at table 0,
//! dispatches on match/miss, implements miss-policy and goto chaining.

use tracing::{debug, warn};

use crate::action::OutputEffect;
use crate::action_set::ActionSet;
use crate::collaborator::{ControllerSink, EgressSink};
use crate::instruction::{self, NextStep};
use crate::oxm;
use crate::packet::Packet;
use crate::registry::TableRegistry;
use crate::table::{MissConfig, TableId};

/// The ultimate disposition of a `route` call (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteResult {
    Drop,
    Controller,
    Output,
}

/// Drives one packet through the table registry. Borrowed, not owned: a
/// driver is cheap to construct per traversal, and holds no state of its
/// own beyond the collaborator references.
pub struct PipelineDriver<'a> {
    registry: &'a TableRegistry,
    egress: &'a dyn EgressSink,
    controller: &'a dyn ControllerSink,
}

impl<'a> PipelineDriver<'a> {
    pub fn new(registry: &'a TableRegistry, egress: &'a dyn EgressSink, controller: &'a dyn ControllerSink) -> Self {
        PipelineDriver {
            registry,
            egress,
            controller,
        }
    }

    /// `route(packet)`: the ingress entry point, always starting at table 0.
    pub fn route(&self, packet: &mut Packet) -> RouteResult {
        self.route_from(TableId(0), packet)
    }

    fn route_from(&self, table_id: TableId, packet: &mut Packet) -> RouteResult {
        let table = match self.registry.table(table_id) {
            Ok(table) => table,
            // Missing table: fail-safe drop (spec §4.F step 1).
            Err(_) => {
                warn!(?table_id, "pipeline reached a nonexistent table, dropping");
                return RouteResult::Drop;
            }
        };

        // Snapshot the entries and miss policy under the read lock, then
        // drop the lock before running match/instruction evaluation, so a
        // traversal never blocks a concurrent flow-mod against this table
        // and never holds a lock across a recursive goto.
        let (entries, miss_config, counters) = {
            let guard = table.read();
            (guard.entries().to_vec(), guard.miss_config, guard.counters.clone())
        };

        counters.record_lookup();

        for entry in &entries {
            if oxm::matches(&entry.match_fields, packet.fields()) {
                counters.record_match();
                entry.counters.record_hit(packet.size);

                let (next, immediate_effect) = instruction::evaluate(&entry.instructions, packet, self.egress, self.controller);
                return match next {
                    NextStep::Output => self.execute_action_set(packet, immediate_effect),
                    NextStep::Goto(next_table) => {
                        if next_table.0 > table_id.0 {
                            self.route_from(next_table, packet)
                        } else {
                            warn!(?table_id, ?next_table, "goto-table did not advance, dropping");
                            RouteResult::Drop
                        }
                    }
                };
            }
        }

        // Table miss: only the lookup counter was incremented above.
        debug!(?table_id, ?miss_config, "table miss");
        match miss_config {
            MissConfig::Drop => RouteResult::Drop,
            MissConfig::Controller => {
                self.controller.send(packet.snapshot());
                RouteResult::Controller
            }
            MissConfig::Continue => match table_id.0.checked_add(1) {
                Some(next_id) if (next_id as usize) < self.registry.max_tables() => {
                    self.route_from(TableId(next_id), packet)
                }
                // No next table to continue into: behave as if its
                // miss_config were `drop` (spec §9 design note).
                _ => RouteResult::Drop,
            },
        }
    }

    /// `immediate_effect` is what an `apply-actions` instruction already
    /// did via the egress/controller sinks, independent of whatever ended
    /// up in the deferred action set. A controller-bound output (either
    /// immediate or from the action set) takes precedence over a plain
    /// egress output when reporting the overall disposition.
    fn execute_action_set(&self, packet: &mut Packet, immediate_effect: OutputEffect) -> RouteResult {
        let action_set: ActionSet = packet.action_set.clone();
        let mut effect = action_set.execute(packet, self.egress, self.controller);
        effect.merge(immediate_effect);
        if effect.controller {
            RouteResult::Controller
        } else if effect.egress {
            RouteResult::Output
        } else {
            RouteResult::Drop
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborator::test_support::{RecordingController, RecordingEgress};
    use crate::counters::{EntryId, InstallSeq};
    use crate::instruction::Instruction;
    use crate::oxm;
    use crate::port::PortNumber;
    use crate::table::{FlowEntrySpec, FlowModFlags};
    use crate::action::Action;

    fn packet_with(fields: Vec<oxm::Oxm>) -> Packet {
        Packet::new(PortNumber::Regular(1), 128, fields, vec![])
    }

    fn no_flags() -> FlowModFlags {
        FlowModFlags::default()
    }

    // Scenario 1: table-miss drop.
    #[test]
    fn table_miss_drop() {
        let registry = TableRegistry::new(4);
        let egress = RecordingEgress::default();
        let controller = RecordingController::default();
        let driver = PipelineDriver::new(&registry, &egress, &controller);

        let mut packet = packet_with(vec![]);
        let result = driver.route(&mut packet);

        assert_eq!(result, RouteResult::Drop);
        let table = registry.table(TableId(0)).unwrap().read();
        assert_eq!(table.counters.lookups(), 1);
        assert_eq!(table.counters.matches(), 0);
    }

    // Scenario 2: single match -> output.
    #[test]
    fn single_match_outputs_and_updates_counters() {
        let registry = TableRegistry::new(4);
        {
            let mut table = registry.table(TableId(0)).unwrap().write();
            table
                .add(
                    FlowEntrySpec {
                        priority: 100,
                        match_fields: vec![oxm::fields::in_port(1)],
                        instructions: vec![Instruction::ApplyActions(vec![Action::Output(PortNumber::Regular(2))])],
                        cookie: 0,
                        flags: no_flags(),
                    },
                    EntryId(1),
                    InstallSeq(1),
                )
                .unwrap();
        }

        let egress = RecordingEgress::default();
        let controller = RecordingController::default();
        let driver = PipelineDriver::new(&registry, &egress, &controller);

        let mut packet = Packet::new(PortNumber::Regular(1), 64, vec![oxm::fields::in_port(1)], vec![]);
        let result = driver.route(&mut packet);

        assert_eq!(result, RouteResult::Output);
        assert_eq!(egress.emitted().len(), 1);
        assert_eq!(egress.emitted()[0].0, PortNumber::Regular(2));

        let table = registry.table(TableId(0)).unwrap().read();
        assert_eq!(table.counters.lookups(), 1);
        assert_eq!(table.counters.matches(), 1);
        assert_eq!(table.entries()[0].counters.packets(), 1);
        assert_eq!(table.entries()[0].counters.bytes(), 64);
    }

    // Scenario 3: priority precedence.
    #[test]
    fn higher_priority_entry_wins() {
        let registry = TableRegistry::new(4);
        {
            let mut table = registry.table(TableId(0)).unwrap().write();
            table
                .add(
                    FlowEntrySpec {
                        priority: 200,
                        match_fields: vec![oxm::fields::in_port(1)],
                        instructions: vec![],
                        cookie: 0,
                        flags: no_flags(),
                    },
                    EntryId(1),
                    InstallSeq(1),
                )
                .unwrap();
            table
                .add(
                    FlowEntrySpec {
                        priority: 100,
                        match_fields: vec![oxm::fields::in_port(1)],
                        instructions: vec![],
                        cookie: 0,
                        flags: no_flags(),
                    },
                    EntryId(2),
                    InstallSeq(2),
                )
                .unwrap();
        }

        let egress = RecordingEgress::default();
        let controller = RecordingController::default();
        let driver = PipelineDriver::new(&registry, &egress, &controller);
        let mut packet = packet_with(vec![oxm::fields::in_port(1)]);
        driver.route(&mut packet);

        let table = registry.table(TableId(0)).unwrap().read();
        assert_eq!(table.entries()[0].priority, 200);
        assert_eq!(table.entries()[0].counters.packets(), 1);
        assert_eq!(table.entries()[1].counters.packets(), 0);
    }

    // Scenario 4: goto chain.
    #[test]
    fn goto_chain_reaches_table_one() {
        let registry = TableRegistry::new(4);
        {
            let mut t0 = registry.table(TableId(0)).unwrap().write();
            t0.add(
                FlowEntrySpec {
                    priority: 1,
                    match_fields: vec![],
                    instructions: vec![Instruction::GotoTable(TableId(1))],
                    cookie: 0,
                    flags: no_flags(),
                },
                EntryId(1),
                InstallSeq(1),
            )
            .unwrap();
        }
        {
            let mut t1 = registry.table(TableId(1)).unwrap().write();
            t1.add(
                FlowEntrySpec {
                    priority: 1,
                    match_fields: vec![],
                    instructions: vec![Instruction::ApplyActions(vec![Action::Output(PortNumber::Regular(3))])],
                    cookie: 0,
                    flags: no_flags(),
                },
                EntryId(2),
                InstallSeq(2),
            )
            .unwrap();
        }

        let egress = RecordingEgress::default();
        let controller = RecordingController::default();
        let driver = PipelineDriver::new(&registry, &egress, &controller);
        let mut packet = packet_with(vec![]);
        let result = driver.route(&mut packet);

        assert_eq!(result, RouteResult::Output);
        assert_eq!(registry.table(TableId(0)).unwrap().read().counters.matches(), 1);
        assert_eq!(registry.table(TableId(1)).unwrap().read().counters.matches(), 1);
    }

    // Scenario 5: write-then-execute action set, canonical order.
    #[test]
    fn write_actions_then_execute_in_canonical_order() {
        let registry = TableRegistry::new(4);
        {
            let mut table = registry.table(TableId(0)).unwrap().write();
            table
                .add(
                    FlowEntrySpec {
                        priority: 1,
                        match_fields: vec![],
                        instructions: vec![Instruction::WriteActions(vec![
                            Action::SetField(oxm::fields::eth_dst(smoltcp::wire::EthernetAddress([1, 2, 3, 4, 5, 6]))),
                            Action::Output(PortNumber::Regular(4)),
                        ])],
                        cookie: 0,
                        flags: no_flags(),
                    },
                    EntryId(1),
                    InstallSeq(1),
                )
                .unwrap();
        }

        let egress = RecordingEgress::default();
        let controller = RecordingController::default();
        let driver = PipelineDriver::new(&registry, &egress, &controller);
        let mut packet = packet_with(vec![]);
        let result = driver.route(&mut packet);

        assert_eq!(result, RouteResult::Output);
        let emitted = egress.emitted();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].0, PortNumber::Regular(4));
        assert!(emitted[0]
            .1
            .fields
            .iter()
            .any(|f| f.field_equal(&oxm::fields::eth_dst(smoltcp::wire::EthernetAddress([1, 2, 3, 4, 5, 6])))));
    }

    // Scenario: miss_config continue recurses to the next table.
    #[test]
    fn miss_continue_recurses_to_next_table() {
        let registry = TableRegistry::new(4);
        registry.set_miss_config(TableId(0), MissConfig::Continue).unwrap();
        {
            let mut t1 = registry.table(TableId(1)).unwrap().write();
            t1.add(
                FlowEntrySpec {
                    priority: 1,
                    match_fields: vec![],
                    instructions: vec![Instruction::ApplyActions(vec![Action::Output(PortNumber::Regular(9))])],
                    cookie: 0,
                    flags: no_flags(),
                },
                EntryId(1),
                InstallSeq(1),
            )
            .unwrap();
        }

        let egress = RecordingEgress::default();
        let controller = RecordingController::default();
        let driver = PipelineDriver::new(&registry, &egress, &controller);
        let mut packet = packet_with(vec![]);
        let result = driver.route(&mut packet);

        assert_eq!(result, RouteResult::Output);
        assert_eq!(registry.table(TableId(0)).unwrap().read().counters.lookups(), 1);
        assert_eq!(registry.table(TableId(0)).unwrap().read().counters.matches(), 0);
    }

    #[test]
    fn miss_controller_sends_snapshot() {
        let registry = TableRegistry::new(4);
        registry.set_miss_config(TableId(0), MissConfig::Controller).unwrap();
        let egress = RecordingEgress::default();
        let controller = RecordingController::default();
        let driver = PipelineDriver::new(&registry, &egress, &controller);
        let mut packet = packet_with(vec![]);
        let result = driver.route(&mut packet);

        assert_eq!(result, RouteResult::Controller);
        assert_eq!(controller.received().len(), 1);
    }
}
