//! OXM (OpenFlow eXtensible Match) field representation and the match
//! evaluator (component A of the pipeline).
//!
//! An OXM field is `(class, field-id, value[, mask])`. This core never
//! encodes or decodes the wire TLV for these fields (that is out of
//! scope); it only needs the in-memory representation and the
//! field-equality predicate that both the match evaluator and
//! `set_field`/flow-mod admission rely on.
//!
//! # Message structure (reference; not encoded by this crate)
//!
//! ```no_rust
//! 0                       16             23  24             32
//! +------------------------+-------------+----+-------------+
//! |       oxm_class        |  oxm_field  | HM |  oxm_length |
//! +------------------------+-------------+----+-------------+
//! |                     value and/or mask                   |
//! +---------------------------------------------------------+
//! ```

pub mod consts;

use smoltcp::wire::{EthernetAddress, Ipv4Address};

/// Basic class for OpenFlow flow match fields.
pub const CLASS_OPEN_FLOW_BASIC: u16 = 0x8000;
/// Experimenter class.
pub const CLASS_EXPERIMENTER: u16 = 0xFFFF;

/// The value carried by an [`Oxm`] field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OxmValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Mac(EthernetAddress),
    Ipv4(Ipv4Address),
}

impl OxmValue {
    /// Widen to a `u64` so masked equality can be computed uniformly.
    /// Lossless for every variant: the widest (`Mac`, 48 bits) still fits.
    fn as_u64(&self) -> u64 {
        match *self {
            OxmValue::U8(v) => v as u64,
            OxmValue::U16(v) => v as u64,
            OxmValue::U32(v) => v as u64,
            OxmValue::U64(v) => v,
            OxmValue::Mac(addr) => {
                let b = addr.as_bytes();
                let mut out = 0u64;
                for byte in b {
                    out = (out << 8) | *byte as u64;
                }
                out
            }
            OxmValue::Ipv4(addr) => u32::from_be_bytes(addr.0) as u64,
        }
    }
}

/// A single OXM field: `(class, field-id, value[, mask])`.
///
/// Equality semantics (component A): two fields are field-equal when class
/// and field-id agree, and `self`'s value — after applying `self`'s mask,
/// if any — equals the identically-masked value of the other field. `self`
/// is conventionally the flow entry's (or `set_field`'s) field, since only
/// the match/rewrite side of a comparison carries a mask in this model;
/// packet fields are always exact values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Oxm {
    pub class: u16,
    pub field: u8,
    pub value: OxmValue,
    pub mask: Option<OxmValue>,
}

impl Oxm {
    pub fn new(field: u8, value: OxmValue) -> Self {
        Oxm {
            class: CLASS_OPEN_FLOW_BASIC,
            field,
            value,
            mask: None,
        }
    }

    pub fn masked(field: u8, value: OxmValue, mask: OxmValue) -> Self {
        Oxm {
            class: CLASS_OPEN_FLOW_BASIC,
            field,
            value,
            mask: Some(mask),
        }
    }

    /// The `(class, field)` identity used as the key by `set_field`'s
    /// "overwrite the matching OXM, adding it if absent" rule.
    pub fn key(&self) -> (u16, u8) {
        (self.class, self.field)
    }

    /// The match evaluator's field-equality predicate (spec §4.A): class
    /// and field-id agree, and the (optionally masked) values agree.
    pub fn field_equal(&self, packet_field: &Oxm) -> bool {
        if self.key() != packet_field.key() {
            return false;
        }
        let mine = self.value.as_u64();
        let theirs = packet_field.value.as_u64();
        match self.mask {
            Some(mask) => {
                let m = mask.as_u64();
                (mine & m) == (theirs & m)
            }
            None => mine == theirs,
        }
    }
}

/// The match evaluator (component A): `entry` matches `packet` iff every
/// field `entry` specifies has a field-equal counterpart in `packet`. An
/// empty `entry` set matches every packet (the table-miss wildcard, by
/// convention installed only as an explicit lowest-priority catch-all).
pub fn matches(entry: &[Oxm], packet: &[Oxm]) -> bool {
    entry.iter().all(|f| packet.iter().any(|g| f.field_equal(g)))
}

/// Typed constructors for the common flow match fields, grounded in the
/// field catalogue of the OpenFlow basic OXM class. These just build
/// [`Oxm`] values; there's no separate typed enum to keep in sync with the
/// generic representation above.
pub mod fields {
    use super::*;
    use crate::oxm::consts::*;

    pub fn in_port(port: u32) -> Oxm {
        Oxm::new(IN_PORT, OxmValue::U32(port))
    }

    pub fn in_physical_port(port: u32) -> Oxm {
        Oxm::new(IN_PHYSICAL_PORT, OxmValue::U32(port))
    }

    pub fn eth_dst(addr: EthernetAddress) -> Oxm {
        Oxm::new(ETHERNET_DESTINATION, OxmValue::Mac(addr))
    }

    pub fn eth_dst_masked(addr: EthernetAddress, mask: EthernetAddress) -> Oxm {
        Oxm::masked(ETHERNET_DESTINATION, OxmValue::Mac(addr), OxmValue::Mac(mask))
    }

    pub fn eth_src(addr: EthernetAddress) -> Oxm {
        Oxm::new(ETHERNET_SOURCE, OxmValue::Mac(addr))
    }

    pub fn eth_type(ethertype: u16) -> Oxm {
        Oxm::new(ETHERNET_TYPE, OxmValue::U16(ethertype))
    }

    pub fn vlan_id(id: u16) -> Oxm {
        Oxm::new(VLAN_ID, OxmValue::U16(id))
    }

    pub fn vlan_priority(pcp: u8) -> Oxm {
        Oxm::new(VLAN_PRIORITY, OxmValue::U8(pcp))
    }

    pub fn ip_dscp(dscp: u8) -> Oxm {
        Oxm::new(IP_DSCP, OxmValue::U8(dscp))
    }

    pub fn ip_ecn(ecn: u8) -> Oxm {
        Oxm::new(IP_ECN, OxmValue::U8(ecn))
    }

    pub fn ip_protocol(proto: u8) -> Oxm {
        Oxm::new(IP_PROTOCOL, OxmValue::U8(proto))
    }

    pub fn ipv4_src(addr: Ipv4Address) -> Oxm {
        Oxm::new(IPV4_SOURCE, OxmValue::Ipv4(addr))
    }

    pub fn ipv4_src_masked(addr: Ipv4Address, mask: Ipv4Address) -> Oxm {
        Oxm::masked(IPV4_SOURCE, OxmValue::Ipv4(addr), OxmValue::Ipv4(mask))
    }

    pub fn ipv4_dst(addr: Ipv4Address) -> Oxm {
        Oxm::new(IPV4_DESTINATION, OxmValue::Ipv4(addr))
    }

    pub fn ipv4_dst_masked(addr: Ipv4Address, mask: Ipv4Address) -> Oxm {
        Oxm::masked(IPV4_DESTINATION, OxmValue::Ipv4(addr), OxmValue::Ipv4(mask))
    }

    pub fn tcp_src(port: u16) -> Oxm {
        Oxm::new(TCP_SOURCE, OxmValue::U16(port))
    }

    pub fn tcp_dst(port: u16) -> Oxm {
        Oxm::new(TCP_DESTINATION, OxmValue::U16(port))
    }

    pub fn udp_src(port: u16) -> Oxm {
        Oxm::new(UDP_SOURCE, OxmValue::U16(port))
    }

    pub fn udp_dst(port: u16) -> Oxm {
        Oxm::new(UDP_DESTINATION, OxmValue::U16(port))
    }

    pub fn arp_op_code(op: u16) -> Oxm {
        Oxm::new(ARP_OP_CODE, OxmValue::U16(op))
    }

    pub fn mpls_label(label: u32) -> Oxm {
        Oxm::new(MPLS_LABEL, OxmValue::U32(label))
    }

    pub fn mpls_tc(tc: u8) -> Oxm {
        Oxm::new(MPLS_TC, OxmValue::U8(tc))
    }

    pub fn tunnel_id(id: u64) -> Oxm {
        Oxm::new(TUNNEL_ID, OxmValue::U64(id))
    }

    pub fn tunnel_id_masked(id: u64, mask: u64) -> Oxm {
        Oxm::masked(TUNNEL_ID, OxmValue::U64(id), OxmValue::U64(mask))
    }
}
