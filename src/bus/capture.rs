//! Line capture adapter.
//!
//! Turns any line-oriented byte source (a redirected stdout/stderr pipe, an
//! OS log export, a child process) into queued events.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::logger::Logger;
use crate::core::OSLOG_ECHO_PREFIX;
use crate::message::{Event, Level, Origin};

/// Level assigned to captured lines from `origin`.
pub fn captured_level(origin: Origin) -> Level {
    match origin {
        Origin::Stderr => Level::Error,
        _ => Level::Info,
    }
}

/// Read `reader` to the end, queueing one event per non-empty line.
///
/// Lines echoing OS log output (prefixed `OSLOG-`) are skipped since they are
/// captured separately. Returns the number of events queued.
pub async fn capture_lines<R>(reader: R, origin: Origin, logger: &Logger) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut captured = 0u64;
    let level = captured_level(origin);

    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(OSLOG_ECHO_PREFIX) {
            continue;
        }
        logger.emit(Event::log(level, line).with_origin(origin));
        captured += 1;
    }

    Ok(captured)
}
