//! # lumen-net
//!
//! OSC transport for the Lumen registry. Controllers send OSC messages to an
//! [`OscBridge`]; the bridge applies them to the registry on the tick thread
//! and sends parameter changes back as feedback, coalesced and rate limited.

pub mod bridge;
pub mod osc;
pub mod outbound;
pub mod rate_limit;

pub use bridge::OscBridge;
pub use osc::{InboundMessage, OscConvertError};
pub use outbound::OutboundQueue;
pub use rate_limit::RateLimiter;
