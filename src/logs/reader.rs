use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use super::LogsError;

/// Complete lines read from a file plus the byte offset reached after the
/// last fully consumed line.
#[derive(Debug)]
pub struct LineBatch {
    pub lines: Vec<String>,
    /// Exact position after the final `\n` consumed. Equal to the input
    /// offset when no complete line was found.
    pub next_offset: u64,
}

/// Read every complete newline-terminated line from `offset` to the current
/// end of file.
///
/// A trailing line without a terminator is neither returned nor counted as
/// consumed, so re-reading from `next_offset` on a later call picks it up
/// once its newline arrives. The file handle is opened and closed within
/// this call.
pub fn read_new_lines(path: &Path, offset: u64) -> Result<LineBatch, LogsError> {
    let file = File::open(path).map_err(|e| LogsError::from_io(e, path))?;
    let size = file.metadata().map_err(LogsError::ReadFailure)?.len();
    if offset > size {
        return Err(LogsError::InvalidOffset { offset, size });
    }

    let mut reader = BufReader::new(file);
    reader.seek(SeekFrom::Start(offset))?;

    let mut lines = Vec::new();
    let mut next_offset = offset;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            break;
        }
        if buf.last() != Some(&b'\n') {
            // Partial line at EOF: leave it for a later read.
            break;
        }
        next_offset += n as u64;
        lines.push(decode_line(&buf[..n - 1]));
    }

    Ok(LineBatch { lines, next_offset })
}

/// Read the final `n` lines of a file, in file order.
///
/// Unlike `read_new_lines`, a trailing unterminated line counts as a line
/// here: for a whole-file scan there is no later read to pick it up.
pub fn read_last_lines(path: &Path, n: usize) -> Result<Vec<String>, LogsError> {
    let file = File::open(path).map_err(|e| LogsError::from_io(e, path))?;
    let mut reader = BufReader::new(file);

    let mut all = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf)?;
        if read == 0 {
            break;
        }
        let end = if buf.last() == Some(&b'\n') {
            read - 1
        } else {
            read
        };
        all.push(decode_line(&buf[..end]));
    }

    if all.len() <= n {
        return Ok(all);
    }
    let tail_start = all.len() - n;
    Ok(all.split_off(tail_start))
}

/// Lossy UTF-8 decode with a trailing `\r` stripped (CRLF normalization).
fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
