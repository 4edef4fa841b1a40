mod error;
mod filter;
mod reader;
mod tail;

pub use error::LogsError;
pub use filter::{filter_lines, format_summary, FilterOutcome};
pub use reader::{read_last_lines, read_new_lines, LineBatch};
pub use tail::{tail_logs, LogStream};

/// Capacity of the per-stream line channel. A slow consumer applies
/// backpressure to emission once this many lines are buffered.
pub const LINE_CHANNEL_CAPACITY: usize = 100;
