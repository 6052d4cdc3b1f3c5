//! The common `Packet` trait every RTCP variant implements, plus the
//! compound-packet reader/writer that glues them together on the wire.

use std::any::Any;
use std::fmt::Debug;

use bytes::{Buf, Bytes, BytesMut};
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize, Unmarshal};

use crate::extended_reports::ExtendedReport;
use crate::goodbye::Goodbye;
use crate::header::{self, Header, PacketType};
use crate::payload_feedbacks::full_intra_request::FullIntraRequest;
use crate::payload_feedbacks::loss_notification::LossNotification;
use crate::payload_feedbacks::picture_loss_indication::PictureLossIndication;
use crate::payload_feedbacks::receiver_estimated_maximum_bitrate::ReceiverEstimatedMaximumBitrate;
use crate::receiver_report::ReceiverReport;
use crate::sender_report::SenderReport;
use crate::source_description::SourceDescription;
use crate::transport_feedbacks::transport_layer_cc::TransportLayerCc;
use crate::transport_feedbacks::transport_layer_nack::TransportLayerNack;
use crate::transport_feedbacks::{Tmmbn, Tmmbr};

/// Implemented by every RTCP packet variant (SR, RR, SDES, BYE, NACK, PLI,
/// FIR, REMB, TMMBR/TMMBN, XR, TransportLayerCc, LossNotification).
///
/// Object-safe so a compound packet can hold a heterogeneous
/// `Vec<Box<dyn Packet>>`.
pub trait Packet: Marshal + Debug {
    /// The SSRC(s) this packet concerns, used only for logging/diagnostics.
    fn destination_ssrc(&self) -> Vec<u32>;

    fn as_any(&self) -> &dyn Any;

    fn equal(&self, other: &dyn Packet) -> bool;

    fn clone_packet(&self) -> Box<dyn Packet>;
}

/// Parses every RTCP packet in a compound datagram, skipping (and counting)
/// any block whose header or body fails to parse rather than aborting the
/// whole buffer. A block that fails to parse is still skipped by its own
/// declared length, so one corrupt block never poisons the rest of the
/// datagram; only a block that is itself truncated (not enough bytes left
/// to honor its declared length) ends the walk. Returns `(packets, skipped)`.
pub fn unmarshal_compound(raw: &Bytes) -> (Vec<Box<dyn Packet>>, usize) {
    let mut buf = raw.clone();
    let mut packets: Vec<Box<dyn Packet>> = Vec::new();
    let mut skipped = 0usize;

    while buf.has_remaining() {
        if buf.remaining() < header::HEADER_LENGTH {
            skipped += 1;
            break;
        }
        let Some(block) = take_block(&mut buf) else {
            skipped += 1;
            break;
        };
        match unmarshal_block(&block.header, block.body) {
            Ok(packet) => packets.push(packet),
            Err(_) => skipped += 1,
        }
    }
    (packets, skipped)
}

struct Block {
    header: Header,
    body: Bytes,
}

/// Reads one header-prefixed block (header + its declared-length body) off
/// the front of `buf`, advancing past it. Returns `None` only when the
/// buffer doesn't contain enough bytes to honor the header's declared
/// length — a terminal condition, since there's no well-defined next offset
/// to resume at.
fn take_block<B: Buf>(buf: &mut B) -> Option<Block> {
    let mut peek = {
        let mut tmp = BytesMut::with_capacity(header::HEADER_LENGTH);
        for _ in 0..header::HEADER_LENGTH {
            tmp.put_u8(buf.chunk()[0]);
            buf.advance(1);
        }
        Bytes::from(tmp)
    };
    let header = Header::unmarshal(&mut peek).ok()?;
    let body_len = (header.length as usize) * 4;
    if buf.remaining() < body_len {
        return None;
    }
    let body = buf.copy_to_bytes(body_len);
    Some(Block { header, body })
}

/// Parses exactly one packet's body given its already-consumed header.
fn unmarshal_block(hdr: &Header, body: Bytes) -> Result<Box<dyn Packet>> {
    match hdr.packet_type() {
        PacketType::SenderReport => Ok(Box::new(SenderReport::unmarshal_body(hdr, body)?)),
        PacketType::ReceiverReport => Ok(Box::new(ReceiverReport::unmarshal_body(hdr, body)?)),
        PacketType::SourceDescription => {
            Ok(Box::new(SourceDescription::unmarshal_body(hdr, body)?))
        }
        PacketType::Goodbye => Ok(Box::new(Goodbye::unmarshal_body(hdr, body)?)),
        PacketType::TransportSpecificFeedback => match hdr.count {
            1 => Ok(Box::new(TransportLayerNack::unmarshal_body(hdr, body)?)),
            3 => Ok(Box::new(Tmmbr::unmarshal_body(hdr, body)?)),
            4 => Ok(Box::new(Tmmbn::unmarshal_body(hdr, body)?)),
            15 => Ok(Box::new(TransportLayerCc::unmarshal_body(hdr, body)?)),
            fmt => Err(Error::OtherRtcpErr(format!(
                "unsupported transport feedback fmt {fmt}"
            ))),
        },
        PacketType::PayloadSpecificFeedback => match hdr.count {
            1 => Ok(Box::new(PictureLossIndication::unmarshal_body(
                hdr, body,
            )?)),
            4 => Ok(Box::new(FullIntraRequest::unmarshal_body(hdr, body)?)),
            15 => match LossNotification::unmarshal_body(hdr, body.clone()) {
                Ok(ln) => Ok(Box::new(ln)),
                Err(_) => Ok(Box::new(ReceiverEstimatedMaximumBitrate::unmarshal_body(
                    hdr, body,
                )?)),
            },
            fmt => Err(Error::OtherRtcpErr(format!(
                "unsupported payload feedback fmt {fmt}"
            ))),
        },
        PacketType::ExtendedReport => Ok(Box::new(ExtendedReport::unmarshal_body(hdr, body)?)),
        PacketType::ApplicationDefined | PacketType::Unsupported => Err(Error::OtherRtcpErr(
            format!("unsupported rtcp packet type {}", hdr.packet_type_raw),
        )),
    }
}

/// Writes one or more packets into a single compound datagram, failing if
/// the combined size would exceed `max_size`. Callers that need
/// fragmentation drive [`crate::compound::CompoundBuilder`] instead.
pub fn marshal_compound(packets: &[Box<dyn Packet>]) -> Result<Bytes> {
    let mut buf = BytesMut::new();
    for packet in packets {
        packet.marshal_to(&mut buf)?;
    }
    Ok(buf.freeze())
}
