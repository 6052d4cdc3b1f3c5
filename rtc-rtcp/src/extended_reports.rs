//! Extended Reports (RFC 3611): a variable-length sequence of typed report
//! blocks following the sender SSRC. Only the blocks this stack produces or
//! consumes are parsed structurally (Receiver Reference Time, Delay since
//! Last RR, and the Google target-bitrate extension); any other block type
//! round-trips as an opaque payload so a relay never drops information it
//! doesn't understand.

use std::any::Any;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize, Unmarshal, require_remaining};

use crate::header::{self, Header, PacketType};
use crate::packet::Packet;

const XR_BLOCK_HEADER_LENGTH: usize = 4;
const RRTR_BLOCK_TYPE: u8 = 4;
const DLRR_BLOCK_TYPE: u8 = 5;
const TARGET_BITRATE_BLOCK_TYPE: u8 = 42;
const DLRR_SUBBLOCK_LENGTH: usize = 12;
const TARGET_BITRATE_ITEM_LENGTH: usize = 4;

/// Receiver Reference Time Report block (RFC 3611 §4.4): the 64-bit NTP
/// timestamp at which the receiver generated this report, echoed back in a
/// later [`Dlrr`] for round-trip time estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rrtr {
    pub ntp_timestamp: u64,
}

/// One sub-block of a [`Dlrr`]: the SSRC this delay is reported for, the NTP
/// mid-32-bits of the RRTR it is replying to, and the delay since then in
/// 1/65536-second units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DlrrReport {
    pub ssrc: u32,
    pub last_rr: u32,
    pub dlrr: u32,
}

/// Delay since Last RR block (RFC 3611 §4.5): carries one [`DlrrReport`] per
/// sender this receiver is reporting round-trip delay for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dlrr {
    pub reports: Vec<DlrrReport>,
}

/// One layer's encoder target in the Google target-bitrate extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TargetBitrateItem {
    pub spatial_layer: u8,
    pub temporal_layer: u8,
    pub target_bitrate_kbps: u32,
}

/// Per-layer encoder bitrate targets, used by simulcast/SVC senders to
/// advertise the rate each spatial/temporal layer was encoded at.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TargetBitrate {
    pub items: Vec<TargetBitrateItem>,
}

/// A single report block within an [`ExtendedReport`]. Unrecognized block
/// types are preserved verbatim so they survive a parse/marshal round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XrBlock {
    Rrtr(Rrtr),
    Dlrr(Dlrr),
    TargetBitrate(TargetBitrate),
    Unknown { block_type: u8, type_specific: u8, raw: Bytes },
}

impl XrBlock {
    fn marshal_to(&self, buf: &mut BytesMut) -> Result<()> {
        match self {
            XrBlock::Rrtr(r) => {
                buf.put_u8(RRTR_BLOCK_TYPE);
                buf.put_u8(0);
                buf.put_u16(2);
                buf.put_u64(r.ntp_timestamp);
            }
            XrBlock::Dlrr(d) => {
                buf.put_u8(DLRR_BLOCK_TYPE);
                buf.put_u8(0);
                buf.put_u16((d.reports.len() * 3) as u16);
                for r in &d.reports {
                    buf.put_u32(r.ssrc);
                    buf.put_u32(r.last_rr);
                    buf.put_u32(r.dlrr);
                }
            }
            XrBlock::TargetBitrate(t) => {
                buf.put_u8(TARGET_BITRATE_BLOCK_TYPE);
                buf.put_u8(0);
                buf.put_u16(t.items.len() as u16);
                for item in &t.items {
                    if item.spatial_layer > 0xF || item.temporal_layer > 0xF {
                        return Err(Error::OtherRtcpErr(
                            "target bitrate layer index exceeds 4 bits".to_owned(),
                        ));
                    }
                    buf.put_u8((item.spatial_layer << 4) | item.temporal_layer);
                    buf.put_uint(item.target_bitrate_kbps as u64, 3);
                }
            }
            XrBlock::Unknown {
                block_type,
                type_specific,
                raw,
            } => {
                buf.put_u8(*block_type);
                buf.put_u8(*type_specific);
                buf.put_u16((raw.len() / 4) as u16);
                buf.put_slice(raw);
            }
        }
        Ok(())
    }

    fn unmarshal<B: Buf>(buf: &mut B) -> Result<Self> {
        require_remaining(buf, XR_BLOCK_HEADER_LENGTH, "xr block header")?;
        let block_type = buf.get_u8();
        let type_specific = buf.get_u8();
        let word_count = buf.get_u16() as usize;
        let body_len = word_count * 4;
        require_remaining(buf, body_len, "xr block body")?;
        let mut body = buf.copy_to_bytes(body_len);

        Ok(match block_type {
            RRTR_BLOCK_TYPE => {
                require_remaining(&body, 8, "rrtr block")?;
                XrBlock::Rrtr(Rrtr {
                    ntp_timestamp: body.get_u64(),
                })
            }
            DLRR_BLOCK_TYPE => {
                if body.remaining() % DLRR_SUBBLOCK_LENGTH != 0 {
                    return Err(Error::OtherRtcpErr(
                        "dlrr block length not a multiple of 12".to_owned(),
                    ));
                }
                let mut reports = Vec::with_capacity(body.remaining() / DLRR_SUBBLOCK_LENGTH);
                while body.has_remaining() {
                    reports.push(DlrrReport {
                        ssrc: body.get_u32(),
                        last_rr: body.get_u32(),
                        dlrr: body.get_u32(),
                    });
                }
                XrBlock::Dlrr(Dlrr { reports })
            }
            TARGET_BITRATE_BLOCK_TYPE => {
                if body.remaining() % TARGET_BITRATE_ITEM_LENGTH != 0 {
                    return Err(Error::OtherRtcpErr(
                        "target bitrate block length not a multiple of 4".to_owned(),
                    ));
                }
                let mut items = Vec::with_capacity(body.remaining() / TARGET_BITRATE_ITEM_LENGTH);
                while body.has_remaining() {
                    let layers = body.get_u8();
                    let target_bitrate_kbps = body.get_uint(3) as u32;
                    items.push(TargetBitrateItem {
                        spatial_layer: layers >> 4,
                        temporal_layer: layers & 0xF,
                        target_bitrate_kbps,
                    });
                }
                XrBlock::TargetBitrate(TargetBitrate { items })
            }
            other => XrBlock::Unknown {
                block_type: other,
                type_specific,
                raw: body,
            },
        })
    }

    fn marshal_size(&self) -> usize {
        let body_len = match self {
            XrBlock::Rrtr(_) => 8,
            XrBlock::Dlrr(d) => d.reports.len() * DLRR_SUBBLOCK_LENGTH,
            XrBlock::TargetBitrate(t) => t.items.len() * TARGET_BITRATE_ITEM_LENGTH,
            XrBlock::Unknown { raw, .. } => raw.len(),
        };
        XR_BLOCK_HEADER_LENGTH + body_len
    }
}

/// Extended Report packet (RFC 3611 §4): a sender SSRC followed by zero or
/// more typed report blocks, most commonly coalesced [`Rrtr`]/[`Dlrr`]/
/// [`TargetBitrate`] blocks from a single scheduling pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtendedReport {
    pub sender_ssrc: u32,
    pub reports: Vec<XrBlock>,
}

impl ExtendedReport {
    pub(crate) fn unmarshal_body(hdr: &Header, mut body: Bytes) -> Result<Self> {
        require_remaining(&body, 4, "extended report sender ssrc")?;
        let sender_ssrc = body.get_u32();
        if hdr.padding {
            let n = header::get_padding(body.len(), &body)?;
            body.truncate(body.len() - n);
        }
        let mut reports = Vec::new();
        while body.has_remaining() {
            reports.push(XrBlock::unmarshal(&mut body)?);
        }
        Ok(ExtendedReport {
            sender_ssrc,
            reports,
        })
    }
}

impl MarshalSize for ExtendedReport {
    fn marshal_size(&self) -> usize {
        header::HEADER_LENGTH
            + 4
            + self.reports.iter().map(XrBlock::marshal_size).sum::<usize>()
    }
}

impl Marshal for ExtendedReport {
    fn marshal_to(&self, buf: &mut BytesMut) -> Result<usize> {
        let body_len = 4 + self.reports.iter().map(XrBlock::marshal_size).sum::<usize>();
        let hdr = Header {
            padding: false,
            count: 0,
            packet_type_raw: PacketType::ExtendedReport.into(),
            length: (body_len / 4) as u16,
        };
        let start = buf.len();
        hdr.marshal_to(buf)?;
        buf.put_u32(self.sender_ssrc);
        for report in &self.reports {
            report.marshal_to(buf)?;
        }
        Ok(buf.len() - start)
    }
}

impl Unmarshal for ExtendedReport {
    fn unmarshal<B>(buf: &mut B) -> Result<Self>
    where
        B: Buf,
    {
        let hdr = Header::unmarshal(buf)?;
        let body = buf.copy_to_bytes((hdr.length as usize) * 4);
        Self::unmarshal_body(&hdr, body)
    }
}

impl Packet for ExtendedReport {
    fn destination_ssrc(&self) -> Vec<u32> {
        self.reports
            .iter()
            .filter_map(|r| match r {
                XrBlock::Dlrr(d) => Some(d.reports.iter().map(|r| r.ssrc).collect::<Vec<_>>()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equal(&self, other: &dyn Packet) -> bool {
        other
            .as_any()
            .downcast_ref::<ExtendedReport>()
            .is_some_and(|o| o == self)
    }

    fn clone_packet(&self) -> Box<dyn Packet> {
        Box::new(self.clone())
    }
}
