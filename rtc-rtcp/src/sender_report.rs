//! Sender Report (RFC 3550 §6.4.1): sender-side stream statistics plus zero
//! or more reception report blocks about streams this sender is receiving.

use std::any::Any;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use shared::error::Result;
use shared::marshal::{Marshal, MarshalSize, Unmarshal, require_remaining};

use crate::header::{self, Header, PacketType, get_padding};
use crate::packet::Packet;
use crate::reception_report::{RECEPTION_REPORT_LENGTH, ReceptionReport};

pub const SENDER_INFO_LENGTH: usize = 20;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SenderReport {
    pub ssrc: u32,
    pub ntp_time: u64,
    pub rtp_time: u32,
    pub packet_count: u32,
    pub octet_count: u32,
    pub reports: Vec<ReceptionReport>,
}

impl SenderReport {
    pub(crate) fn unmarshal_body(hdr: &Header, mut body: Bytes) -> Result<Self> {
        require_remaining(&body, 4 + SENDER_INFO_LENGTH, "sender report")?;
        let ssrc = body.get_u32();
        let ntp_time = body.get_u64();
        let rtp_time = body.get_u32();
        let packet_count = body.get_u32();
        let octet_count = body.get_u32();

        let mut reports = Vec::with_capacity(hdr.count as usize);
        for _ in 0..hdr.count {
            reports.push(ReceptionReport::unmarshal(&mut body)?);
        }

        if hdr.padding {
            get_padding(body.len(), &body)?;
        }

        Ok(SenderReport {
            ssrc,
            ntp_time,
            rtp_time,
            packet_count,
            octet_count,
            reports,
        })
    }
}

impl MarshalSize for SenderReport {
    fn marshal_size(&self) -> usize {
        header::HEADER_LENGTH + 4 + SENDER_INFO_LENGTH + self.reports.len() * RECEPTION_REPORT_LENGTH
    }
}

impl Marshal for SenderReport {
    fn marshal_to(&self, buf: &mut BytesMut) -> Result<usize> {
        let body_len = 4 + SENDER_INFO_LENGTH + self.reports.len() * RECEPTION_REPORT_LENGTH;
        let hdr = Header {
            padding: false,
            count: self.reports.len() as u8,
            packet_type_raw: PacketType::SenderReport.into(),
            length: (body_len / 4) as u16,
        };
        let start = buf.len();
        hdr.marshal_to(buf)?;
        buf.put_u32(self.ssrc);
        buf.put_u64(self.ntp_time);
        buf.put_u32(self.rtp_time);
        buf.put_u32(self.packet_count);
        buf.put_u32(self.octet_count);
        for report in &self.reports {
            report.marshal_to(buf)?;
        }
        Ok(buf.len() - start)
    }
}

impl Unmarshal for SenderReport {
    fn unmarshal<B>(buf: &mut B) -> Result<Self>
    where
        B: Buf,
    {
        let hdr = Header::unmarshal(buf)?;
        let body = buf.copy_to_bytes((hdr.length as usize) * 4);
        Self::unmarshal_body(&hdr, body)
    }
}

impl Packet for SenderReport {
    fn destination_ssrc(&self) -> Vec<u32> {
        self.reports.iter().map(|r| r.ssrc).collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equal(&self, other: &dyn Packet) -> bool {
        other
            .as_any()
            .downcast_ref::<SenderReport>()
            .is_some_and(|o| o == self)
    }

    fn clone_packet(&self) -> Box<dyn Packet> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_report_round_trip_no_reports() {
        let sr = SenderReport {
            ssrc: 0x1234,
            ntp_time: 0x1122_3344_5566_7788,
            rtp_time: 5000,
            packet_count: 10,
            octet_count: 2000,
            reports: Vec::new(),
        };
        let raw = sr.marshal().unwrap();
        let mut buf = raw.clone();
        assert_eq!(sr, SenderReport::unmarshal(&mut buf).unwrap());
    }

    #[test]
    fn test_sender_report_round_trip_with_reports() {
        let sr = SenderReport {
            ssrc: 0x1234,
            ntp_time: 99,
            rtp_time: 5000,
            packet_count: 10,
            octet_count: 2000,
            reports: vec![ReceptionReport {
                ssrc: 0x5678,
                fraction_lost: 1,
                total_lost: 2,
                last_sequence_number: 3,
                jitter: 4,
                last_sender_report: 5,
                delay: 6,
            }],
        };
        let raw = sr.marshal().unwrap();
        let mut buf = raw.clone();
        assert_eq!(sr, SenderReport::unmarshal(&mut buf).unwrap());
    }
}
