//! RTP header extensions with a fixed wire layout (RFC 8285 payloads).
//!
//! Each submodule is one logical extension type from the registry: a small
//! struct plus `marshal`/`unmarshal` methods operating directly on the
//! extension's raw payload bytes (the id/length framing itself lives in
//! [`crate::header::Header`], not here).

pub mod abs_capture_time_extension;
pub mod abs_send_time_extension;
pub mod playout_delay_extension;
pub mod sdes_extension;
pub mod transmission_offset_extension;
pub mod transport_cc_extension;
