//! Market Data Service
//!
//! The security information processor (SIP): consumes latency-delayed
//! per-market quotes and maintains the national best bid and offer across
//! every tracked market. Quote arrival order is not guaranteed under
//! latency, so out-of-order updates are detected by quote time and
//! discarded as stale — an expected occurrence, not an error.

pub mod sip;

pub use sip::{Sip, SipOutcome};
