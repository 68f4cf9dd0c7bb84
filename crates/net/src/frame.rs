//! CRLF line framing
//!
//! Outbound lines are capped at 512 bytes including CRLF; an overlong
//! trailing parameter is cut at a character boundary. Inbound lines may be
//! longer when the server sends message tags.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::protocol::Message;

/// Maximum outbound line length, CRLF included
pub const MAX_LINE: usize = 512;

/// Sanity limit for inbound lines (tags + message)
const MAX_INBOUND_LINE: usize = 8191 + MAX_LINE;

/// Partially read inbound line, kept between reads
#[derive(Debug, Default)]
pub struct LineBuffer {
    bytes: Vec<u8>,
    /// Dropping the tail of an overlong line up to its newline
    discarding: bool,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Read the next non-empty line and parse it.
///
/// `line` holds a partially read line between calls, so the future may be
/// dropped in a `select!` and polled again without losing data. A line is
/// never buffered past `MAX_INBOUND_LINE`; the rest of it is skipped.
pub async fn read_message<R: AsyncBufRead + Unpin>(reader: &mut R, line: &mut LineBuffer) -> Result<Message> {
    loop {
        let available = reader.fill_buf().await?;
        let eof = available.is_empty();
        let (consumed, complete) = match available.iter().position(|&b| b == b'\n') {
            Some(i) => (i + 1, true),
            None => (available.len(), false),
        };
        if !line.discarding {
            line.bytes.extend_from_slice(&available[..consumed]);
        }
        reader.consume(consumed);

        if line.discarding {
            if eof {
                line.discarding = false;
                return Err(Error::ConnectionClosed);
            }
            line.discarding = !complete;
            continue;
        }

        if line.bytes.len() > MAX_INBOUND_LINE {
            line.bytes.clear();
            line.discarding = !complete;
            return Err(Error::Protocol(format!(
                "Line too long (max {} bytes)",
                MAX_INBOUND_LINE
            )));
        }
        if !complete && !eof {
            continue;
        }
        if eof && line.bytes.is_empty() {
            return Err(Error::ConnectionClosed);
        }

        let text = String::from_utf8_lossy(&line.bytes).into_owned();
        line.bytes.clear();

        if text.trim().is_empty() {
            continue;
        }
        return Message::parse(&text)
            .ok_or_else(|| Error::Protocol(format!("Malformed line: {}", text.trim_end())));
    }
}

/// Write one message followed by CRLF
pub async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, msg: &Message) -> Result<()> {
    let line = fit_line(msg.to_string());
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\r\n").await?;
    writer.flush().await?;
    Ok(())
}

fn fit_line(mut line: String) -> String {
    let limit = MAX_LINE - 2;
    if line.len() <= limit {
        return line;
    }
    let mut cut = limit;
    while !line.is_char_boundary(cut) {
        cut -= 1;
    }
    line.truncate(cut);
    line
}
