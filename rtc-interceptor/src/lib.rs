#![warn(rust_2018_idioms)]
#![allow(dead_code)]

//! Composable chain-of-responsibility processors for outgoing and incoming
//! RTP/RTCP packets.
//!
//! Every interceptor implements [`Interceptor`], a sans-IO surface: it accepts
//! packets and timeouts via `handle_*`, and the host drains produced packets
//! and deadlines via `poll_*`. Interceptors are composed innermost-first with
//! [`Registry`], starting from [`NoopInterceptor`].

mod egress;
mod fec;
mod history;
mod noop;
mod pacer;
mod registry;
mod rtcp_receiver;
mod rtcp_sender;
mod sequencer;
mod statistician;

pub mod nack;
pub mod report;
pub mod stream_info;
pub mod twcc;

pub use egress::{EgressConfig, RtpSenderEgress, SendCounters};
pub use fec::{UlpFecDecoder, UlpFecEncoder, UlpFecParams};
pub use history::PacketHistory;
pub use interceptor_derive::{Interceptor, interceptor};
pub use nack::generator::{NackGeneratorBuilder, NackGeneratorInterceptor};
pub use nack::responder::{NackResponderBuilder, NackResponderInterceptor};
pub use noop::NoopInterceptor;
pub use pacer::{PacedSender, PacerConfig, PacketPriority};
pub use registry::Registry;
pub use report::receiver::{ReceiverReportBuilder, ReceiverReportInterceptor};
pub use report::sender::{SenderReportBuilder, SenderReportInterceptor};
pub use rtcp_receiver::{RtcpEvent, RtcpReceiver};
pub use rtcp_sender::{RtcpSender, RtcpSenderConfig};
pub use sequencer::Sequencer;
pub use statistician::{PacketResult, TransportFeedbackStatistician, TransportPacketsFeedback};
pub use stream_info::{RTCPFeedback, RTPHeaderExtension, StreamInfo};
pub use twcc::receiver::{TwccReceiverBuilder, TwccReceiverInterceptor};
pub use twcc::sender::{TwccSenderBuilder, TwccSenderInterceptor};

use shared::TransportContext;
use std::time::Instant;

/// A parsed RTP packet, or a batch of RTCP packets forming one compound
/// datagram.
#[derive(Debug)]
pub enum Packet {
    Rtp(rtp::Packet),
    Rtcp(Vec<Box<dyn rtcp::packet::Packet>>),
}

impl Clone for Packet {
    fn clone(&self) -> Self {
        match self {
            Packet::Rtp(p) => Packet::Rtp(p.clone()),
            Packet::Rtcp(v) => Packet::Rtcp(v.iter().map(|p| p.clone_packet()).collect()),
        }
    }
}

impl PartialEq for Packet {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Packet::Rtp(a), Packet::Rtp(b)) => a == b,
            (Packet::Rtcp(a), Packet::Rtcp(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|(x, y)| x.equal(y.as_ref()))
            }
            _ => false,
        }
    }
}

/// A [`Packet`] tagged with the transport it arrived on or is destined for,
/// and the time it was observed.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedPacket {
    pub now: Instant,
    pub transport: TransportContext,
    pub message: Packet,
}

/// The trait every interceptor in a chain implements.
///
/// `handle_read`/`handle_write` accept a packet moving in that direction;
/// `poll_read`/`poll_write` drain packets this interceptor is done with.
/// `handle_timeout`/`poll_timeout` drive time-based work (RTCP scheduling,
/// pacing, history eviction) without this crate ever touching a clock or a
/// socket itself — the host owns both.
pub trait Interceptor {
    type Error;

    fn handle_read(&mut self, msg: TaggedPacket) -> Result<(), Self::Error>;
    fn poll_read(&mut self) -> Option<TaggedPacket>;

    fn handle_write(&mut self, msg: TaggedPacket) -> Result<(), Self::Error>;
    fn poll_write(&mut self) -> Option<TaggedPacket>;

    fn handle_timeout(&mut self, now: Instant) -> Result<(), Self::Error>;
    fn poll_timeout(&mut self) -> Option<Instant>;

    fn bind_local_stream(&mut self, info: &StreamInfo);
    fn unbind_local_stream(&mut self, info: &StreamInfo);
    fn bind_remote_stream(&mut self, info: &StreamInfo);
    fn unbind_remote_stream(&mut self, info: &StreamInfo);

    fn close(&mut self) -> Result<(), Self::Error>;
}

/// Implemented by every interceptor that wraps another one via a `#[next]`
/// field; generated by `#[derive(Interceptor)]`. The `#[interceptor]`
/// attribute macro uses it to synthesize forwarding bodies for whichever
/// [`Interceptor`] methods a wrapper doesn't override.
pub trait NextInterceptor {
    type Next: Interceptor;

    fn next_mut(&mut self) -> &mut Self::Next;
    fn next_ref(&self) -> &Self::Next;
}
