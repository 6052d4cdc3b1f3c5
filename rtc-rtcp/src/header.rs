//! The 4-byte common header every RTCP packet begins with (RFC 3550 §6.1).

use bytes::{Buf, BufMut, Bytes, BytesMut};
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize, Unmarshal, require_remaining};

pub const RTCP_VERSION: u8 = 2;
pub const HEADER_LENGTH: usize = 4;
/// Count/format field is 5 bits; padding and the common header occupy the rest.
pub const COUNT_MAX: u8 = 31;

/// The packet type carried in byte 1 of the common header.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PacketType {
    Unsupported,
    SenderReport,
    ReceiverReport,
    SourceDescription,
    Goodbye,
    ApplicationDefined,
    TransportSpecificFeedback,
    PayloadSpecificFeedback,
    ExtendedReport,
}

impl From<u8> for PacketType {
    fn from(b: u8) -> Self {
        match b {
            200 => PacketType::SenderReport,
            201 => PacketType::ReceiverReport,
            202 => PacketType::SourceDescription,
            203 => PacketType::Goodbye,
            204 => PacketType::ApplicationDefined,
            205 => PacketType::TransportSpecificFeedback,
            206 => PacketType::PayloadSpecificFeedback,
            207 => PacketType::ExtendedReport,
            _ => PacketType::Unsupported,
        }
    }
}

impl From<PacketType> for u8 {
    fn from(p: PacketType) -> u8 {
        match p {
            PacketType::SenderReport => 200,
            PacketType::ReceiverReport => 201,
            PacketType::SourceDescription => 202,
            PacketType::Goodbye => 203,
            PacketType::ApplicationDefined => 204,
            PacketType::TransportSpecificFeedback => 205,
            PacketType::PayloadSpecificFeedback => 206,
            PacketType::ExtendedReport => 207,
            PacketType::Unsupported => 0,
        }
    }
}

/// Feedback message format carried in the transport/payload-specific feedback
/// packet types, stored in the same 5-bit field as `count` on report packets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FormatType {
    Unsupported,
    Nack,
    Tmmbr,
    Tmmbn,
    Rrtr,
    TransportCc,
    Pli,
    Sli,
    Rpsi,
    Fir,
    Afb,
    Remb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub padding: bool,
    pub count: u8,
    pub packet_type_raw: u8,
    /// Length of the payload in 32-bit words, not counting the 4-byte common
    /// header itself (the on-the-wire `length` field is this value).
    pub length: u16,
}

impl Header {
    pub fn packet_type(&self) -> PacketType {
        PacketType::from(self.packet_type_raw)
    }
}

impl MarshalSize for Header {
    fn marshal_size(&self) -> usize {
        HEADER_LENGTH
    }
}

impl Marshal for Header {
    fn marshal_to(&self, buf: &mut BytesMut) -> Result<usize> {
        if self.count > COUNT_MAX {
            return Err(Error::OtherRtcpErr(format!(
                "invalid header count/format {}",
                self.count
            )));
        }
        if buf.len() < HEADER_LENGTH {
            buf.resize(HEADER_LENGTH, 0);
        }
        buf[0] = (RTCP_VERSION << 6) | ((self.padding as u8) << 5) | (self.count & 0x1F);
        buf[1] = self.packet_type_raw;
        buf[2..4].copy_from_slice(&self.length.to_be_bytes());
        Ok(HEADER_LENGTH)
    }
}

impl Unmarshal for Header {
    fn unmarshal<B>(buf: &mut B) -> Result<Self>
    where
        B: Buf,
    {
        require_remaining(buf, HEADER_LENGTH, "rtcp common header")?;
        let b0 = buf.get_u8();
        let version = b0 >> 6;
        if version != RTCP_VERSION {
            return Err(Error::OtherRtcpErr(format!(
                "unsupported RTCP version {version}"
            )));
        }
        let padding = (b0 >> 5) & 0x1 != 0;
        let count = b0 & 0x1F;
        let packet_type_raw = buf.get_u8();
        let length = buf.get_u16();
        Ok(Header {
            padding,
            count,
            packet_type_raw,
            length,
        })
    }
}

/// Reads and strips the trailing padding byte count for a packet whose
/// header claims `padding`, validating it fits within `payload_len`.
pub fn get_padding(payload_len: usize, raw: &Bytes) -> Result<usize> {
    if raw.is_empty() {
        return Err(Error::OtherRtcpErr("empty padded payload".to_owned()));
    }
    let n = raw[raw.len() - 1] as usize;
    if n == 0 || n > payload_len {
        return Err(Error::OtherRtcpErr(format!(
            "invalid padding length {n} for payload of {payload_len} bytes"
        )));
    }
    Ok(n)
}

pub(crate) fn put_padding(buf: &mut BytesMut, n: usize) {
    if n == 0 {
        return;
    }
    let start = buf.len();
    buf.resize(start + n, 0);
    buf[start + n - 1] = n as u8;
}
