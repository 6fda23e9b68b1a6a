//! HTTP client subsystem.
//!
//! # Data Flow
//! ```text
//! Request<B>
//!     → client.rs (User-Agent, snapshot, send with timeout)
//!     → hyper-util pooled client → network
//!     → response headers: transfer opened
//!     → body.rs (CountingBody counts frames as the caller reads)
//!     → end of stream / error / drop: transfer closed and logged
//! ```

pub mod body;
pub mod client;

pub use body::CountingBody;
pub use client::{ClientError, InstrumentedClient};
