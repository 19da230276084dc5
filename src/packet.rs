//! The in-flight packet (spec §3 "Packet").
//!
//! A `Packet` is constructed by the I/O layer (out of scope here), mutated
//! only through the instruction/action evaluators, and destroyed after
//! pipeline completion. It owns a decoded OXM field bag, a 64-bit
//! `metadata` register, a deferred action set, and the handful of header
//! attributes (TTLs, tag stacks) the action evaluator mutates that are not
//! themselves OXM-matchable fields in OpenFlow.

use crate::action_set::ActionSet;
use crate::oxm::Oxm;
use crate::port::PortNumber;

/// A VLAN tag, as pushed/popped by `push_vlan`/`pop_vlan`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VlanTag {
    pub id: u16,
    pub priority: u8,
}

/// An MPLS label stack entry, as pushed/popped by `push_mpls`/`pop_mpls`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MplsTag {
    pub label: u32,
    pub tc: u8,
    pub ttl: u8,
}

/// An in-flight packet traversing the pipeline.
///
/// Owned exclusively by the pipeline driver for one traversal; never
/// shared across traversals (spec §5).
#[derive(Debug, Clone)]
pub struct Packet {
    /// Ingress port, fixed for the lifetime of one traversal.
    pub in_port: PortNumber,
    /// Byte size of the packet, used for counter accounting.
    pub size: u64,
    /// Decoded OXM header fields, mutated by `set_field` and by the
    /// push/pop tag actions.
    fields: Vec<Oxm>,
    /// The mutable 64-bit metadata register (`write-metadata`).
    pub metadata: u64,
    /// The deferred action set (component C).
    pub action_set: ActionSet,
    /// IP TTL. Not an OXM-matchable field in OpenFlow; only settable via
    /// `set_nw_ttl`/`dec_nw_ttl` and readable by `copy_ttl_*`.
    pub nw_ttl: u8,
    /// Innermost pushed VLAN tag, if any (top of stack = index 0).
    vlan_stack: Vec<VlanTag>,
    /// Innermost pushed MPLS label, if any (top of stack = index 0).
    mpls_stack: Vec<MplsTag>,
    /// Opaque payload reference; this core never inspects its contents.
    pub payload: Vec<u8>,
}

impl Packet {
    /// Construct a packet as the I/O layer would hand it to `route`: zero
    /// metadata, an empty action set, and the given ingress port/fields.
    pub fn new(in_port: PortNumber, size: u64, fields: Vec<Oxm>, payload: Vec<u8>) -> Self {
        Packet {
            in_port,
            size,
            fields,
            metadata: 0,
            action_set: ActionSet::new(),
            nw_ttl: 0,
            vlan_stack: Vec::new(),
            mpls_stack: Vec::new(),
            payload,
        }
    }

    /// The packet's OXM field set, as seen by the match evaluator.
    pub fn fields(&self) -> &[Oxm] {
        &self.fields
    }

    /// `set_field`: overwrite the matching OXM in the field set by
    /// `(class, field)` key, adding it if absent.
    pub fn set_field(&mut self, field: Oxm) {
        if let Some(existing) = self.fields.iter_mut().find(|f| f.key() == field.key()) {
            *existing = field;
        } else {
            self.fields.push(field);
        }
    }

    /// `write-metadata(value, mask)`: `metadata := (metadata & !mask) | (value & mask)`.
    pub fn write_metadata(&mut self, value: u64, mask: u64) {
        self.metadata = (self.metadata & !mask) | (value & mask);
    }

    pub fn vlan_stack(&self) -> &[VlanTag] {
        &self.vlan_stack
    }

    pub fn mpls_stack(&self) -> &[MplsTag] {
        &self.mpls_stack
    }

    /// `push_vlan(ethertype)`: push a new outermost (default) VLAN tag and
    /// set `eth_type` to the pushed ethertype, per OpenFlow spec.
    pub fn push_vlan(&mut self, ethertype: u16) {
        self.vlan_stack.insert(0, VlanTag { id: 0, priority: 0 });
        self.set_field(crate::oxm::fields::eth_type(ethertype));
        self.sync_vlan_field();
    }

    /// `pop_vlan`: pop the outermost VLAN tag, if any.
    pub fn pop_vlan(&mut self) {
        if !self.vlan_stack.is_empty() {
            self.vlan_stack.remove(0);
        }
        self.sync_vlan_field();
    }

    /// `push_mpls(ethertype)`: push a new outermost MPLS label and set
    /// `eth_type` to the pushed ethertype. `copy_ttl_out` is expected to
    /// run first if the caller wants the new label to inherit the IP TTL;
    /// this matches the OpenFlow action ordering convention of
    /// `copy_ttl_out, push_mpls` in `apply-actions`.
    pub fn push_mpls(&mut self, ethertype: u16) {
        self.mpls_stack.insert(
            0,
            MplsTag {
                label: 0,
                tc: 0,
                ttl: self.nw_ttl,
            },
        );
        self.set_field(crate::oxm::fields::eth_type(ethertype));
        self.sync_mpls_fields();
    }

    /// `pop_mpls(ethertype)`: pop the outermost MPLS label and restore
    /// `eth_type` to the ethertype of the new outermost header.
    pub fn pop_mpls(&mut self, ethertype: u16) {
        if !self.mpls_stack.is_empty() {
            self.mpls_stack.remove(0);
        }
        self.set_field(crate::oxm::fields::eth_type(ethertype));
        self.sync_mpls_fields();
    }

    /// `set_mpls_ttl`: mutate the outermost MPLS tag's TTL if present.
    pub fn set_mpls_ttl(&mut self, ttl: u8) {
        if let Some(tag) = self.mpls_stack.first_mut() {
            tag.ttl = ttl;
            self.sync_mpls_fields();
        }
    }

    /// `dec_mpls_ttl`: decrement the outermost MPLS tag's TTL, clamped at 0.
    pub fn dec_mpls_ttl(&mut self) {
        if let Some(tag) = self.mpls_stack.first_mut() {
            tag.ttl = tag.ttl.saturating_sub(1);
            self.sync_mpls_fields();
        }
    }

    /// `set_nw_ttl`: mutate the IP TTL.
    pub fn set_nw_ttl(&mut self, ttl: u8) {
        self.nw_ttl = ttl;
    }

    /// `dec_nw_ttl`: decrement the IP TTL, clamped at 0.
    pub fn dec_nw_ttl(&mut self) {
        self.nw_ttl = self.nw_ttl.saturating_sub(1);
    }

    /// `copy_ttl_out`: copy the IP TTL into the outermost MPLS tag's TTL,
    /// if one is present (moving the TTL "outward" onto the new outer
    /// label).
    pub fn copy_ttl_out(&mut self) {
        let ttl = self.nw_ttl;
        if let Some(tag) = self.mpls_stack.first_mut() {
            tag.ttl = ttl;
            self.sync_mpls_fields();
        }
    }

    /// `copy_ttl_in`: copy the outermost MPLS tag's TTL "inward" onto the
    /// IP TTL, if an MPLS tag is present.
    pub fn copy_ttl_in(&mut self) {
        if let Some(tag) = self.mpls_stack.first() {
            self.nw_ttl = tag.ttl;
        }
    }

    fn sync_vlan_field(&mut self) {
        match self.vlan_stack.first().copied() {
            Some(tag) => {
                self.set_field(crate::oxm::fields::vlan_id(tag.id));
                self.set_field(crate::oxm::fields::vlan_priority(tag.priority));
            }
            None => {
                self.fields
                    .retain(|f| f.field != crate::oxm::consts::VLAN_ID && f.field != crate::oxm::consts::VLAN_PRIORITY);
            }
        }
    }

    fn sync_mpls_fields(&mut self) {
        match self.mpls_stack.first().copied() {
            Some(tag) => {
                self.set_field(crate::oxm::fields::mpls_label(tag.label));
                self.set_field(crate::oxm::fields::mpls_tc(tag.tc));
            }
            None => {
                self.fields
                    .retain(|f| f.field != crate::oxm::consts::MPLS_LABEL && f.field != crate::oxm::consts::MPLS_TC);
            }
        }
    }

    /// A cheap owned copy handed to the egress/controller collaborators
    /// (spec §6 "packet_snapshot"). Collaborators never see the live
    /// packet under pipeline mutation.
    pub fn snapshot(&self) -> PacketSnapshot {
        PacketSnapshot {
            in_port: self.in_port,
            size: self.size,
            fields: self.fields.clone(),
            metadata: self.metadata,
            payload: self.payload.clone(),
        }
    }
}

/// An immutable, owned snapshot of a packet's observable state, passed to
/// `egress.emit` and `controller.send`.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketSnapshot {
    pub in_port: PortNumber,
    pub size: u64,
    pub fields: Vec<Oxm>,
    pub metadata: u64,
    pub payload: Vec<u8>,
}
