//! The action-set manager (component C): merges, clears, and executes the
//! deferred action set carried with a packet.
//!
//! At most one action per [`ActionKind`](crate::action::ActionKind) is
//! kept; `write_actions` replaces by type key, and `execute_action_set`
//! always runs in OpenFlow-canonical order, regardless of the order
//! actions were written in.

use crate::action::{apply_actions, Action, ActionKind, OutputEffect};
use crate::collaborator::{ControllerSink, EgressSink};
use crate::packet::Packet;

/// Canonical execution order (spec §4.C): `copy_ttl_in, pop, push_mpls/vlan,
/// dec_ttl, set_field, set_queue, group, output-last`. Ties within a rank
/// execute in the order they appear in the set (insertion order), since
/// at most one action of a given kind can exist.
fn canonical_rank(kind: &ActionKind) -> u8 {
    match kind {
        ActionKind::CopyTtlIn => 0,
        ActionKind::PopVlan | ActionKind::PopMpls => 1,
        ActionKind::PushMpls | ActionKind::PushVlan => 2,
        ActionKind::CopyTtlOut => 3,
        ActionKind::DecMplsTtl | ActionKind::DecNwTtl => 4,
        ActionKind::SetMplsTtl | ActionKind::SetNwTtl => 4,
        ActionKind::SetField(_, _) => 5,
        ActionKind::SetQueue => 6,
        ActionKind::Group => 7,
        ActionKind::Experimenter => 8,
        ActionKind::Output => 9,
    }
}

/// The packet's deferred action set: at most one action per type.
#[derive(Debug, Clone, Default)]
pub struct ActionSet {
    actions: Vec<Action>,
}

impl ActionSet {
    pub fn new() -> Self {
        ActionSet { actions: Vec::new() }
    }

    /// `write_actions(new)`: for each action, replace any existing action
    /// of the same type key, else insert.
    pub fn write_actions(&mut self, new: &[Action]) {
        for action in new {
            let kind = action.kind();
            if let Some(existing) = self.actions.iter_mut().find(|a| a.kind() == kind) {
                *existing = *action;
            } else {
                self.actions.push(*action);
            }
        }
    }

    /// `clear-actions`: empty the set.
    pub fn clear(&mut self) {
        self.actions.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Whether the set contains an `output` action (used by the pipeline
    /// driver to decide `output` vs. `drop` disposition at termination).
    pub fn has_output(&self) -> bool {
        self.actions.iter().any(|a| a.kind() == ActionKind::Output)
    }

    /// `execute_action_set`: run the set in canonical order via the action
    /// evaluator (component B). Output, if present, always runs last.
    pub fn execute(&self, packet: &mut Packet, egress: &dyn EgressSink, controller: &dyn ControllerSink) -> OutputEffect {
        let mut ordered: Vec<Action> = self.actions.clone();
        ordered.sort_by_key(|a| canonical_rank(&a.kind()));
        apply_actions(&ordered, packet, egress, controller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborator::test_support::{RecordingController, RecordingEgress};
    use crate::oxm;
    use crate::port::PortNumber;

    #[test]
    fn write_actions_replaces_by_type() {
        let mut set = ActionSet::new();
        set.write_actions(&[Action::Output(PortNumber::Regular(1))]);
        set.write_actions(&[Action::Output(PortNumber::Regular(2))]);
        assert_eq!(set.actions.len(), 1);
        assert_eq!(set.actions[0], Action::Output(PortNumber::Regular(2)));
    }

    #[test]
    fn clear_after_writes_empties_set() {
        let mut set = ActionSet::new();
        set.write_actions(&[Action::Output(PortNumber::Regular(1)), Action::DecNwTtl]);
        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn execute_runs_set_field_before_output() {
        let mut set = ActionSet::new();
        set.write_actions(&[
            Action::Output(PortNumber::Regular(4)),
            Action::SetField(oxm::fields::eth_type(0x0800)),
        ]);
        let mut packet = Packet::new(PortNumber::Regular(1), 64, vec![], vec![]);
        let egress = RecordingEgress::default();
        let controller = RecordingController::default();
        let effect = set.execute(&mut packet, &egress, &controller);
        assert_eq!(effect, OutputEffect { egress: true, controller: false });

        let emitted = egress.emitted();
        assert_eq!(emitted.len(), 1);
        assert!(emitted[0]
            .1
            .fields
            .iter()
            .any(|f| f.field_equal(&oxm::fields::eth_type(0x0800))));
    }

    #[test]
    fn has_output_reflects_set_contents() {
        let mut set = ActionSet::new();
        assert!(!set.has_output());
        set.write_actions(&[Action::Output(PortNumber::Regular(1))]);
        assert!(set.has_output());
    }
}
