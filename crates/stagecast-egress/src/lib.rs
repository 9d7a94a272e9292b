//! Destination fan-out.
//!
//! When the studio goes live, the program stream is restreamed to every
//! enabled destination over one egress job each. Jobs fail independently;
//! the fan-out report tells the operator which destinations made it.

mod fanout;
mod job;

pub use fanout::FanoutController;
pub use job::{EgressJob, EgressJobState};
