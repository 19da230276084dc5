//! OXM field-id constants for the `CLASS_OPEN_FLOW_BASIC` class.
//!
//! Kept from the wire-format layer this crate grew out of: the field ids
//! are part of the OpenFlow wire spec and don't change just because this
//! core no longer decodes the TLV encoding itself.

/// Switch input port
pub const IN_PORT: u8 = 0;
/// Switch physical input port
pub const IN_PHYSICAL_PORT: u8 = 1;
/// Ethernet destination address
pub const ETHERNET_DESTINATION: u8 = 3;
/// Ethernet source address
pub const ETHERNET_SOURCE: u8 = 4;
/// Ethernet frame type
pub const ETHERNET_TYPE: u8 = 5;
/// VLAN id
pub const VLAN_ID: u8 = 6;
/// VLAN priority
pub const VLAN_PRIORITY: u8 = 7;
/// IP DSCP (6 bits in TOS field)
pub const IP_DSCP: u8 = 8;
/// IP ECN (2 bits in TOS field)
pub const IP_ECN: u8 = 9;
/// IP protocol
pub const IP_PROTOCOL: u8 = 10;
/// IPv4 source address
pub const IPV4_SOURCE: u8 = 11;
/// IPv4 destination address
pub const IPV4_DESTINATION: u8 = 12;
/// TCP source port
pub const TCP_SOURCE: u8 = 13;
/// TCP destination port
pub const TCP_DESTINATION: u8 = 14;
/// UDP source port
pub const UDP_SOURCE: u8 = 15;
/// UDP destination port
pub const UDP_DESTINATION: u8 = 16;
/// ARP op code
pub const ARP_OP_CODE: u8 = 21;
/// MPLS label
pub const MPLS_LABEL: u8 = 34;
/// MPLS traffic class
pub const MPLS_TC: u8 = 35;
/// Logical port metadata (tunnel id)
pub const TUNNEL_ID: u8 = 38;
