//! Transfer statistics subsystem.
//!
//! # Data Flow
//! ```text
//! caller
//!     → tag.rs (attach correlation key to the request)
//!     → RequestSnapshot captured as the request is sent
//!
//! response headers arrive
//!     → correlator.rs open_transfer (request + partial response records)
//!
//! response body consumed (or dropped)
//!     → correlator.rs close_transfer (counted size, stop instant)
//!     → emitter.rs (one line to the sink installed via logger.rs)
//! ```
//!
//! # Design Decisions
//! - Everything is a no-op until `StatsLogger::enable` installs a sink
//! - Instrumentation never returns errors to the request path

pub mod correlator;
pub mod emitter;
pub mod head;
pub mod logger;
pub mod record;
pub mod tag;

pub use correlator::{TransferCorrelator, TransferId};
pub use emitter::LineSink;
pub use logger::StatsLogger;
pub use record::{StatsRecord, Transfer, UNTAGGED_KEY};
pub use tag::{request_key, tag_request, RequestSnapshot};
