#![warn(rust_2018_idioms)]
#![allow(dead_code)]

//! RTCP (RFC 3550 §6) packet types: parsing and serialization for every
//! compound-packet member the sender/receiver stack in this workspace
//! produces or consumes.
//!
//! Every variant implements [`packet::Packet`] plus the `shared::marshal`
//! trio ([`shared::marshal::Marshal`], [`shared::marshal::MarshalSize`],
//! [`shared::marshal::Unmarshal`]); [`packet::unmarshal_compound`] walks a
//! datagram and returns every packet it could parse plus a count of blocks
//! it had to skip, rather than failing the whole buffer on one bad block.

pub mod compound;
pub mod extended_reports;
pub mod goodbye;
pub mod header;
pub mod packet;
pub mod payload_feedbacks;
pub mod receiver_report;
pub mod reception_report;
pub mod sender_report;
pub mod source_description;
pub mod transport_feedbacks;

pub use packet::{Packet, marshal_compound, unmarshal_compound};
