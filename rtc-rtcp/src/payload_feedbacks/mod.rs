//! Payload-specific feedback packets (RFC 4585 §6.3): PLI, FIR, REMB, and the
//! loss-notification application-layer feedback message.

pub mod full_intra_request;
pub mod loss_notification;
pub mod picture_loss_indication;
pub mod receiver_estimated_maximum_bitrate;

use bytes::{Buf, BufMut, BytesMut};
use shared::error::Result;
use shared::marshal::require_remaining;

pub(crate) const COMMON_FEEDBACK_LENGTH: usize = 8;

/// The sender/media SSRC pair every payload-specific (and transport-specific)
/// feedback packet carries right after the RTCP common header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct CommonFeedback {
    pub sender_ssrc: u32,
    pub media_ssrc: u32,
}

impl CommonFeedback {
    pub(crate) fn marshal_to(&self, buf: &mut BytesMut) {
        buf.put_u32(self.sender_ssrc);
        buf.put_u32(self.media_ssrc);
    }

    pub(crate) fn unmarshal<B: Buf>(buf: &mut B) -> Result<Self> {
        require_remaining(buf, COMMON_FEEDBACK_LENGTH, "payload feedback common header")?;
        Ok(Self {
            sender_ssrc: buf.get_u32(),
            media_ssrc: buf.get_u32(),
        })
    }
}
