//! Request lifecycle
//!
//! Every externally-facing request is registered with its response sink and
//! cancellation token. An out-of-band interrupt cancels the token and closes
//! the sink with a terminal notice.

mod channel_sink;
pub mod frames;
mod registry;
mod request;
mod sink;


pub use channel_sink::{ChannelSink, SinkOutput};
pub use registry::{InterruptOutcome, RequestGuard, RequestRegistry};
pub use request::ActiveRequest;
pub use sink::{Finale, ResponseSink};
