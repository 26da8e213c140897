//! Stdin acquisition
//!
//! A terminal on stdin means nothing was piped in, so it is never read. Piped
//! input is read on a helper thread so a writer that never closes the pipe
//! produces a `Timeout` instead of a hang.

use std::io::{self, IsTerminal, Read};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StdinError {
    #[error("Timed out after {0:?} waiting for stdin to close")]
    Timeout(Duration),

    #[error("Failed to read stdin: {0}")]
    Io(#[from] io::Error),
}

/// Read all of stdin, or return `""` when stdin is a terminal
pub fn read_stdin(timeout: Duration) -> Result<String, StdinError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        debug!("read_stdin: stdin is a terminal, skipping");
        return Ok(String::new());
    }
    read_with_timeout(stdin, timeout)
}

/// Read `reader` to the end on a helper thread, waiting at most `timeout`
pub fn read_with_timeout<R>(mut reader: R, timeout: Duration) -> Result<String, StdinError>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut content = String::new();
        let result = reader.read_to_string(&mut content).map(|_| content);
        let _ = tx.send(result);
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            let content = result?;
            debug!(bytes = content.len(), "read_with_timeout: done");
            Ok(content)
        }
        Err(RecvTimeoutError::Timeout) => Err(StdinError::Timeout(timeout)),
        Err(RecvTimeoutError::Disconnected) => Err(StdinError::Io(io::Error::other("stdin reader exited early"))),
    }
}
