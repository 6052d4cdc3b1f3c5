//! A single report block (RFC 3550 §6.4.1), embedded 0..31 times in a
//! SenderReport or ReceiverReport.

use bytes::{Buf, BufMut, BytesMut};
use shared::error::Result;
use shared::marshal::{Marshal, MarshalSize, Unmarshal, require_remaining};

pub const RECEPTION_REPORT_LENGTH: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReceptionReport {
    pub ssrc: u32,
    pub fraction_lost: u8,
    /// Signed 24-bit cumulative number of packets lost.
    pub total_lost: u32,
    /// High 16 bits: cycle count; low 16 bits: last-seen sequence number.
    pub last_sequence_number: u32,
    pub jitter: u32,
    pub last_sender_report: u32,
    /// Delay since the last SR was received, in 1/65536-second units.
    pub delay: u32,
}

impl MarshalSize for ReceptionReport {
    fn marshal_size(&self) -> usize {
        RECEPTION_REPORT_LENGTH
    }
}

impl Marshal for ReceptionReport {
    fn marshal_to(&self, buf: &mut BytesMut) -> Result<usize> {
        let start = buf.len();
        buf.put_u32(self.ssrc);
        buf.put_u8(self.fraction_lost);
        let lost = self.total_lost.to_be_bytes();
        buf.put_slice(&lost[1..4]);
        buf.put_u32(self.last_sequence_number);
        buf.put_u32(self.jitter);
        buf.put_u32(self.last_sender_report);
        buf.put_u32(self.delay);
        Ok(buf.len() - start)
    }
}

impl Unmarshal for ReceptionReport {
    fn unmarshal<B>(buf: &mut B) -> Result<Self>
    where
        B: Buf,
    {
        require_remaining(buf, RECEPTION_REPORT_LENGTH, "reception report")?;
        let ssrc = buf.get_u32();
        let fraction_lost = buf.get_u8();
        let mut lost = [0u8; 4];
        lost[1] = buf.get_u8();
        lost[2] = buf.get_u8();
        lost[3] = buf.get_u8();
        let total_lost = u32::from_be_bytes(lost);
        let last_sequence_number = buf.get_u32();
        let jitter = buf.get_u32();
        let last_sender_report = buf.get_u32();
        let delay = buf.get_u32();
        Ok(ReceptionReport {
            ssrc,
            fraction_lost,
            total_lost,
            last_sequence_number,
            jitter,
            last_sender_report,
            delay,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reception_report_round_trip() {
        let rr = ReceptionReport {
            ssrc: 0x1234,
            fraction_lost: 5,
            total_lost: 0x00ABCDEF,
            last_sequence_number: 0x0001_0020,
            jitter: 42,
            last_sender_report: 7,
            delay: 99,
        };
        let raw = rr.marshal().unwrap();
        let mut buf = raw.clone();
        assert_eq!(rr, ReceptionReport::unmarshal(&mut buf).unwrap());
    }
}
