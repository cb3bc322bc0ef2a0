//! DAP protocol framing IO.
//! - read_message: parse Content-Length payload
//! - write_message: emit payload
//! - write_protocol_log: optional transcript logging

use std::io::{self, BufRead, Write};

const CONTENT_LENGTH: &str = "Content-Length";
/// Largest body accepted from a client.
pub(super) const MAX_CONTENT_LENGTH: usize = 16 * 1024 * 1024;

/// Reads one framed message. `Ok(None)` means the stream closed cleanly
/// between messages.
pub(super) fn read_message<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut content_length = None;
    let mut line = String::new();
    let mut saw_header = false;

    loop {
        line.clear();
        let bytes = reader.read_line(&mut line)?;
        if bytes == 0 {
            if saw_header {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream closed inside message header",
                ));
            }
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            if saw_header {
                break;
            }
            continue;
        }
        saw_header = true;
        if let Some((name, value)) = trimmed.split_once(':') {
            if name.trim().eq_ignore_ascii_case(CONTENT_LENGTH) {
                if let Ok(length) = value.trim().parse::<usize>() {
                    content_length = Some(length);
                }
            }
        }
    }

    let length = content_length.ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidData, "missing Content-Length header")
    })?;
    if length > MAX_CONTENT_LENGTH {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Content-Length {length} exceeds {MAX_CONTENT_LENGTH} bytes"),
        ));
    }

    let mut buffer = vec![0u8; length];
    reader.read_exact(&mut buffer)?;
    let payload = String::from_utf8(buffer)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "invalid utf-8 payload"))?;
    Ok(Some(payload))
}

pub(super) fn write_message<W: Write>(writer: &mut W, payload: &str) -> io::Result<()> {
    let length = payload.len();
    write!(writer, "Content-Length: {length}\r\n\r\n")?;
    writer.write_all(payload.as_bytes())?;
    writer.flush()
}

pub(super) fn write_protocol_log<W: Write>(
    logger: &mut W,
    direction: &str,
    payload: &str,
) -> io::Result<()> {
    writeln!(logger, "{direction} {payload}")?;
    logger.flush()
}
