use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::{reader, LogsError, LINE_CHANNEL_CAPACITY};

/// Handle to a live tail of a single log file.
///
/// Lines arrive through a bounded channel in file order. Dropping the
/// handle or calling [`close`](Self::close) stops the background producer;
/// the stream is finished once [`next_line`](Self::next_line) returns
/// `None`.
#[derive(Debug)]
pub struct LogStream {
    file: PathBuf,
    rx: mpsc::Receiver<String>,
    cancel: CancellationToken,
}

impl LogStream {
    /// Path of the file being tailed.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Next line of the stream, or `None` once the producer has stopped and
    /// all buffered lines are drained.
    pub async fn next_line(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Stop the background producer. Idempotent and fire-and-forget: the
    /// task exits within one poll interval plus one channel send, observable
    /// as the channel closing.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

impl Drop for LogStream {
    fn drop(&mut self) {
        // A handle with no consumer left means the stream is dead.
        self.cancel.cancel();
    }
}

/// Start tailing `path`: replay the last `initial_lines` lines, then poll
/// the file every `interval` for appended content.
///
/// The file must exist at call time. The replay window is computed on the
/// caller's task before the producer is spawned. `interval` must be
/// nonzero (as with a ticker, a zero interval is a caller contract
/// violation and panics).
pub async fn tail_logs(
    path: &Path,
    initial_lines: usize,
    interval: Duration,
) -> Result<LogStream, LogsError> {
    let meta = std::fs::metadata(path).map_err(|e| LogsError::from_io(e, path))?;
    let replay = reader::read_last_lines(path, initial_lines)?;

    // Content before this point is covered by the replay window; polling
    // only surfaces bytes appended after it.
    let initial_size = meta.len();

    let (tx, rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
    let cancel = CancellationToken::new();

    let file = path.to_path_buf();
    tracing::info!(file = %file.display(), replay = replay.len(), "Tail started");

    tokio::spawn(run_producer(
        file.clone(),
        replay,
        initial_size,
        interval,
        tx,
        cancel.clone(),
    ));

    Ok(LogStream { file, rx, cancel })
}

/// Background producer task. Owns the cursor exclusively; exits on
/// cancellation or when the consumer goes away, dropping the sender and
/// thereby closing the channel exactly once.
async fn run_producer(
    path: PathBuf,
    replay: Vec<String>,
    initial_size: u64,
    interval: Duration,
    tx: mpsc::Sender<String>,
    cancel: CancellationToken,
) {
    for line in replay {
        if !send_line(&tx, &cancel, line).await {
            return;
        }
    }

    let mut offset = initial_size;
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(file = %path.display(), "Tail stopped");
                return;
            }
            _ = ticker.tick() => {}
        }

        // Errors inside the loop never kill the stream: a file briefly
        // missing during rotation must survive until the next tick.
        let size = match std::fs::metadata(&path) {
            Ok(m) => m.len(),
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Tail: stat failed, skipping tick");
                continue;
            }
        };

        if size < offset {
            // Truncation heuristic: a shrunk file is re-read from the top.
            // This cannot tell truncation apart from replacement with a
            // same-name file and favors re-reading over missing data.
            tracing::info!(
                file = %path.display(),
                old_offset = offset,
                new_size = size,
                "Tail: file truncated, restarting from byte 0"
            );
            offset = 0;
        }

        if size > offset {
            let batch = match reader::read_new_lines(&path, offset) {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "Tail: read failed, skipping tick");
                    continue;
                }
            };

            for line in batch.lines {
                if !send_line(&tx, &cancel, line).await {
                    return;
                }
            }

            // Advance to the position after the last complete line, not to
            // the file size: trailing partial bytes stay unconsumed so the
            // next tick picks the finished line up whole.
            tracing::debug!(
                file = %path.display(),
                from = offset,
                to = batch.next_offset,
                size,
                "Tail: cursor advanced"
            );
            offset = batch.next_offset;
        }
    }
}

/// Send one line, racing the cancellation token. Biased so cancellation
/// wins when both are ready and a blocked send cannot outlive a cancel.
/// Returns `false` when the producer should exit.
async fn send_line(tx: &mpsc::Sender<String>, cancel: &CancellationToken, line: String) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        res = tx.send(line) => res.is_ok(),
    }
}
