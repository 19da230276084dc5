//! A userspace OpenFlow-compatible flow-table pipeline and flow-mod core:
//! match evaluation, action and instruction evaluation, flow tables with
//! priority/overlap discipline, a multi-table pipeline driver, per-table
//! and per-entry counters, and the control-plane surface
//! ([`control::ControlPlane`]) that ties them together.
//!
//! Port I/O, the controller transport, group/meter/queue tables, OpenFlow
//! wire-protocol decode, and hardware offload are out of scope; see
//! [`collaborator`] for the traits a caller implements to plug this core
//! into an actual switch.

extern crate core;
extern crate smoltcp;

pub mod action;
pub mod action_set;
pub mod collaborator;
pub mod control;
pub mod counters;
pub mod error;
pub mod instruction;
pub mod oxm;
pub mod packet;
mod port;
pub mod pipeline;
pub mod registry;
pub mod table;

pub use action::Action;
pub use action_set::ActionSet;
pub use collaborator::{ControllerSink, EgressSink};
pub use control::{
    AggregateStats, ControlPlane, DescStats, FlowMod, FlowModCommand, FlowStats, GroupStats,
    PortStats, QueueStats, TableMod, TableStats,
};
pub use counters::{EntryCounters, EntryId, InstallSeq, TableCounters};
pub use error::{ModifyFlowError, ModifyFlowResult};
pub use instruction::Instruction;
pub use oxm::{Oxm, OxmValue};
pub use packet::{Packet, PacketSnapshot};
pub use pipeline::{PipelineDriver, RouteResult};
pub use port::PortNumber;
pub use registry::TableRegistry;
pub use table::{FlowEntry, FlowEntrySpec, FlowModFlags, FlowSelector, MissConfig, TableId};
