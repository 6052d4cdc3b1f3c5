//! Receiver Report (RFC 3550 §6.4.2): zero or more reception report blocks
//! from a participant that is not itself an active sender.

use std::any::Any;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use shared::error::Result;
use shared::marshal::{Marshal, MarshalSize, Unmarshal, require_remaining};

use crate::header::{self, Header, PacketType, get_padding};
use crate::packet::Packet;
use crate::reception_report::{RECEPTION_REPORT_LENGTH, ReceptionReport};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReceiverReport {
    pub ssrc: u32,
    pub reports: Vec<ReceptionReport>,
}

impl ReceiverReport {
    pub(crate) fn unmarshal_body(hdr: &Header, mut body: Bytes) -> Result<Self> {
        require_remaining(&body, 4, "receiver report")?;
        let ssrc = body.get_u32();

        let mut reports = Vec::with_capacity(hdr.count as usize);
        for _ in 0..hdr.count {
            reports.push(ReceptionReport::unmarshal(&mut body)?);
        }

        if hdr.padding {
            get_padding(body.len(), &body)?;
        }

        Ok(ReceiverReport { ssrc, reports })
    }
}

impl MarshalSize for ReceiverReport {
    fn marshal_size(&self) -> usize {
        header::HEADER_LENGTH + 4 + self.reports.len() * RECEPTION_REPORT_LENGTH
    }
}

impl Marshal for ReceiverReport {
    fn marshal_to(&self, buf: &mut BytesMut) -> Result<usize> {
        let body_len = 4 + self.reports.len() * RECEPTION_REPORT_LENGTH;
        let hdr = Header {
            padding: false,
            count: self.reports.len() as u8,
            packet_type_raw: PacketType::ReceiverReport.into(),
            length: (body_len / 4) as u16,
        };
        let start = buf.len();
        hdr.marshal_to(buf)?;
        buf.put_u32(self.ssrc);
        for report in &self.reports {
            report.marshal_to(buf)?;
        }
        Ok(buf.len() - start)
    }
}

impl Unmarshal for ReceiverReport {
    fn unmarshal<B>(buf: &mut B) -> Result<Self>
    where
        B: Buf,
    {
        let hdr = Header::unmarshal(buf)?;
        let body = buf.copy_to_bytes((hdr.length as usize) * 4);
        Self::unmarshal_body(&hdr, body)
    }
}

impl Packet for ReceiverReport {
    fn destination_ssrc(&self) -> Vec<u32> {
        self.reports.iter().map(|r| r.ssrc).collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equal(&self, other: &dyn Packet) -> bool {
        other
            .as_any()
            .downcast_ref::<ReceiverReport>()
            .is_some_and(|o| o == self)
    }

    fn clone_packet(&self) -> Box<dyn Packet> {
        Box::new(self.clone())
    }
}
