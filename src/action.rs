//! The action evaluator (component B): applies an ordered action list to a
//! packet, in list order, with side effects going through the egress
//! collaborator.

use crate::collaborator::{ControllerSink, EgressSink};
use crate::oxm::Oxm;
use crate::packet::Packet;
use crate::port::PortNumber;

/// A single OpenFlow action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Output(PortNumber),
    Group(u32),
    SetQueue(u32),
    SetMplsTtl(u8),
    DecMplsTtl,
    SetNwTtl(u8),
    DecNwTtl,
    CopyTtlOut,
    CopyTtlIn,
    PushVlan { ethertype: u16 },
    PopVlan,
    PushMpls { ethertype: u16 },
    PopMpls { ethertype: u16 },
    SetField(Oxm),
    /// Vendor extension; always a no-op in this core.
    Experimenter(u32),
}

/// The canonical action-type key used by the action-set manager's
/// "at most one action per type" rule (spec §4.C). Two actions with the
/// same discriminant share a key regardless of their payload, except
/// `SetField`, which is additionally keyed by the OXM field it targets
/// (OpenFlow allows e.g. `set_field(eth_dst)` and `set_field(ip_dscp)` to
/// coexist in one action set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Output,
    Group,
    SetQueue,
    SetMplsTtl,
    DecMplsTtl,
    SetNwTtl,
    DecNwTtl,
    CopyTtlOut,
    CopyTtlIn,
    PushVlan,
    PopVlan,
    PushMpls,
    PopMpls,
    SetField(u16, u8),
    Experimenter,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match *self {
            Action::Output(_) => ActionKind::Output,
            Action::Group(_) => ActionKind::Group,
            Action::SetQueue(_) => ActionKind::SetQueue,
            Action::SetMplsTtl(_) => ActionKind::SetMplsTtl,
            Action::DecMplsTtl => ActionKind::DecMplsTtl,
            Action::SetNwTtl(_) => ActionKind::SetNwTtl,
            Action::DecNwTtl => ActionKind::DecNwTtl,
            Action::CopyTtlOut => ActionKind::CopyTtlOut,
            Action::CopyTtlIn => ActionKind::CopyTtlIn,
            Action::PushVlan { .. } => ActionKind::PushVlan,
            Action::PopVlan => ActionKind::PopVlan,
            Action::PushMpls { .. } => ActionKind::PushMpls,
            Action::PopMpls { .. } => ActionKind::PopMpls,
            Action::SetField(oxm) => {
                let (class, field) = oxm.key();
                ActionKind::SetField(class, field)
            }
            Action::Experimenter(_) => ActionKind::Experimenter,
        }
    }
}

/// What happened to the packet as a direct result of running an action
/// list: whether it was handed to the egress sink, the controller sink,
/// both (two distinct `output` actions in one list), or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputEffect {
    pub egress: bool,
    pub controller: bool,
}

impl OutputEffect {
    pub fn any(&self) -> bool {
        self.egress || self.controller
    }

    pub fn merge(&mut self, other: OutputEffect) {
        self.egress |= other.egress;
        self.controller |= other.controller;
    }
}

/// Run `actions` against `packet`, in list order, mutating it in place.
/// `output` submits a snapshot to `egress` but never terminates the list;
/// later actions still run on the (unmodified-by-output) packet.
/// `output(CONTROLLER)` is special-cased to route to `controller` instead
/// of `egress` (spec §6: "`controller.send` ... for ... explicit
/// `output(CONTROLLER)` actions"). Returns what happened, so a caller
/// without its own notion of the action set (see
/// [`crate::instruction::evaluate`]) can still tell where the packet went.
pub fn apply_actions(actions: &[Action], packet: &mut Packet, egress: &dyn EgressSink, controller: &dyn ControllerSink) -> OutputEffect {
    let mut effect = OutputEffect::default();
    for action in actions {
        match *action {
            Action::Output(PortNumber::Controller) => {
                controller.send(packet.snapshot());
                effect.controller = true;
            }
            Action::Output(port) => {
                egress.emit(port, packet.snapshot());
                effect.egress = true;
            }
            Action::Group(_) | Action::SetQueue(_) => {
                // Stubbed collaborator touch-points (spec §4.B); accepted without error.
            }
            Action::SetMplsTtl(ttl) => packet.set_mpls_ttl(ttl),
            Action::DecMplsTtl => packet.dec_mpls_ttl(),
            Action::SetNwTtl(ttl) => packet.set_nw_ttl(ttl),
            Action::DecNwTtl => packet.dec_nw_ttl(),
            Action::CopyTtlOut => packet.copy_ttl_out(),
            Action::CopyTtlIn => packet.copy_ttl_in(),
            Action::PushVlan { ethertype } => packet.push_vlan(ethertype),
            Action::PopVlan => packet.pop_vlan(),
            Action::PushMpls { ethertype } => packet.push_mpls(ethertype),
            Action::PopMpls { ethertype } => packet.pop_mpls(ethertype),
            Action::SetField(oxm) => packet.set_field(oxm),
            Action::Experimenter(_) => {}
        }
    }
    effect
}
