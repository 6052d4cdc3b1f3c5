#![warn(rust_2018_idioms)]
#![allow(dead_code)]

//! RTP packet model: header parsing/serialization and the header-extension
//! registry. Media-codec framing (payloading/depayloading per codec) and
//! sequence-number assignment for a sender's egress path live elsewhere;
//! this crate only carries the generic RTP envelope.

pub mod extension;
pub mod header;
pub mod packet;

pub use header::Header;
pub use packet::Packet;
