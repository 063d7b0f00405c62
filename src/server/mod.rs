//! Stdio match server
//!
//! Lets an editor keep one `pathrank serve` process alive and send it
//! requests over a pipe instead of spawning a process per keystroke. Every
//! request is still independent: nothing is cached between requests.

pub mod protocol;

use std::io::{self, Read, Write};
use std::time::Instant;

use tracing::{debug, info};

use crate::api::handle_request;
use protocol::{read_frame, write_message};

/// Answer framed requests from `reader` on `writer` until end of stream.
///
/// Returns the number of requests served. Malformed requests get an error
/// response; only I/O failures end the loop early.
pub fn serve<R: Read, W: Write>(reader: &mut R, writer: &mut W) -> io::Result<u64> {
    let mut served = 0u64;
    info!("match server ready");

    while let Some(frame) = read_frame(reader)? {
        let start = Instant::now();
        let response = handle_request(&frame);
        write_message(writer, &response)?;
        served += 1;
        debug!(
            request = served,
            bytes = frame.len(),
            matches = response.matches.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "request served"
        );
    }

    info!(served, "match server stopped");
    Ok(served)
}

/// Serve on the process's stdin and stdout
pub fn serve_stdio() -> io::Result<u64> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    serve(&mut stdin.lock(), &mut stdout.lock())
}
