//! The instruction evaluator (component D): walks the instruction sequence
//! of a matched entry, updating the packet, the action set, metadata, and
//! the next-hop decision.

use crate::action::{apply_actions, Action, OutputEffect};
use crate::collaborator::{ControllerSink, EgressSink};
use crate::packet::Packet;
use crate::table::TableId;

/// A single instruction, in the order OpenFlow allows them to appear in a
/// flow entry.
#[derive(Debug, Clone)]
pub enum Instruction {
    ApplyActions(Vec<Action>),
    ClearActions,
    WriteActions(Vec<Action>),
    WriteMetadata { value: u64, mask: u64 },
    GotoTable(TableId),
}

/// The pipeline driver's next step after an entry's instructions run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    Output,
    Goto(TableId),
}

/// Process `instructions` against `packet`, in entry-specified order,
/// maintaining `(packet, next_step)`. Never fails: a malformed instruction
/// is upstream's problem to catch at admission time (spec §7); here it
/// would simply not be representable as an [`Instruction`] variant.
///
/// Returns `(next_step, immediate_effect)`, where `immediate_effect` is
/// what an `apply-actions` instruction's `output` action did — the packet
/// is already gone out the egress or controller sink regardless of what
/// ends up in the deferred action set.
pub fn evaluate(
    instructions: &[Instruction],
    packet: &mut Packet,
    egress: &dyn EgressSink,
    controller: &dyn ControllerSink,
) -> (NextStep, OutputEffect) {
    let mut next_step = NextStep::Output;
    let mut immediate_effect = OutputEffect::default();
    for instruction in instructions {
        match instruction {
            Instruction::ApplyActions(actions) => {
                immediate_effect.merge(apply_actions(actions, packet, egress, controller));
            }
            Instruction::ClearActions => packet.action_set.clear(),
            Instruction::WriteActions(actions) => packet.action_set.write_actions(actions),
            Instruction::WriteMetadata { value, mask } => packet.write_metadata(*value, *mask),
            Instruction::GotoTable(id) => next_step = NextStep::Goto(*id),
        }
    }
    (next_step, immediate_effect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborator::test_support::{RecordingController, RecordingEgress};
    use crate::oxm;
    use crate::port::PortNumber;

    fn packet() -> Packet {
        Packet::new(PortNumber::Regular(1), 64, vec![], vec![])
    }

    #[test]
    fn default_next_step_is_output() {
        let mut p = packet();
        let egress = RecordingEgress::default();
        let controller = RecordingController::default();
        let (next, _) = evaluate(&[], &mut p, &egress, &controller);
        assert_eq!(next, NextStep::Output);
    }

    #[test]
    fn goto_table_overrides_next_step() {
        let mut p = packet();
        let egress = RecordingEgress::default();
        let controller = RecordingController::default();
        let (next, _) = evaluate(&[Instruction::GotoTable(TableId(3))], &mut p, &egress, &controller);
        assert_eq!(next, NextStep::Goto(TableId(3)));
    }

    #[test]
    fn write_actions_then_clear_actions_empties_set() {
        let mut p = packet();
        let egress = RecordingEgress::default();
        let controller = RecordingController::default();
        evaluate(
            &[
                Instruction::WriteActions(vec![Action::Output(PortNumber::Regular(2))]),
                Instruction::ClearActions,
            ],
            &mut p,
            &egress,
            &controller,
        );
        assert!(p.action_set.is_empty());
    }

    #[test]
    fn apply_actions_runs_immediately_in_list_order() {
        let mut p = packet();
        let egress = RecordingEgress::default();
        let controller = RecordingController::default();
        evaluate(
            &[Instruction::ApplyActions(vec![Action::SetField(oxm::fields::ip_dscp(5))])],
            &mut p,
            &egress,
            &controller,
        );
        assert!(p.fields()[0].field_equal(&oxm::fields::ip_dscp(5)));
    }

    #[test]
    fn apply_actions_output_controller_reports_controller_effect() {
        let mut p = packet();
        let egress = RecordingEgress::default();
        let controller = RecordingController::default();
        let (_, effect) = evaluate(
            &[Instruction::ApplyActions(vec![Action::Output(PortNumber::Controller)])],
            &mut p,
            &egress,
            &controller,
        );
        assert_eq!(effect, OutputEffect { egress: false, controller: true });
        assert_eq!(controller.received().len(), 1);
    }

    #[test]
    fn write_metadata_instruction_masks_value() {
        let mut p = packet();
        let egress = RecordingEgress::default();
        let controller = RecordingController::default();
        evaluate(
            &[Instruction::WriteMetadata { value: 0xff, mask: 0x0f }],
            &mut p,
            &egress,
            &controller,
        );
        assert_eq!(p.metadata, 0x0f);
    }
}
