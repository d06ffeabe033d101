//! Canonical framing of one file for hashing and signing.
//!
//! A frame is the logical name's UTF-8 bytes, a single `0x00` terminator,
//! the content length as a little-endian `u64`, then the raw content. Signer
//! and verifier must agree on this layout byte for byte; changing any part
//! of it invalidates every signature issued so far.

use super::logical_path::LogicalPath;
use super::members::{FileRecord, MemberSet};
use crate::error::{Result, SealError};
use log::debug;
use std::fs;
use std::io::{self, Read, Write};

/// Block size used when streaming file content into a frame.
pub const FRAME_BLOCK_SIZE: usize = 8192;

/// Terminator written between the logical name and the length field.
const NAME_TERMINATOR: u8 = 0;

/// Write the frame header: name, terminator, and length.
///
/// # Errors
///
/// Propagates any error returned by `sink`.
pub fn write_header<W: Write + ?Sized>(
    logical: &LogicalPath,
    content_len: u64,
    sink: &mut W,
) -> io::Result<()> {
    sink.write_all(logical.as_bytes())?;
    sink.write_all(&[NAME_TERMINATOR])?;
    sink.write_all(&content_len.to_le_bytes())
}

/// Write a complete frame, streaming exactly `content_len` bytes from
/// `content` in [`FRAME_BLOCK_SIZE`] blocks.
///
/// # Errors
///
/// Returns [`io::ErrorKind::UnexpectedEof`] if `content` yields fewer than
/// `content_len` bytes, or propagates read/write failures.
pub fn write_frame<R: Read, W: Write + ?Sized>(
    logical: &LogicalPath,
    content_len: u64,
    content: R,
    sink: &mut W,
) -> io::Result<()> {
    write_header(logical, content_len, sink)?;

    let mut limited = content.take(content_len);
    let mut buffer = [0u8; FRAME_BLOCK_SIZE];
    let mut copied: u64 = 0;
    loop {
        let read = limited.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        let block = buffer.get(..read).unwrap_or_default();
        sink.write_all(block)?;
        copied += block.len() as u64;
    }

    if copied == content_len {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("{logical}: expected {content_len} bytes, read {copied}"),
        ))
    }
}

/// Frame in-memory content. Used for small payloads and tests.
#[must_use]
pub fn frame_bytes(logical: &LogicalPath, content: &[u8]) -> Vec<u8> {
    let name = logical.as_bytes();
    let mut framed = Vec::with_capacity(name.len() + 9 + content.len());
    framed.extend_from_slice(name);
    framed.push(NAME_TERMINATOR);
    framed.extend_from_slice(&(content.len() as u64).to_le_bytes());
    framed.extend_from_slice(content);
    framed
}

/// Frame a single record, reading its content from the record's source.
///
/// # Errors
///
/// Returns [`SealError::Io`] if the source cannot be opened or read, or if
/// `sink` rejects the bytes.
pub fn frame_record<W: Write + ?Sized>(record: &FileRecord, sink: &mut W) -> Result<()> {
    let source = record.source();
    let file = fs::File::open(source).map_err(SealError::io("open", source))?;
    let len = file
        .metadata()
        .map_err(SealError::io("stat", source))?
        .len();
    debug!("framing {} ({len} bytes from {source})", record.logical());
    write_frame(record.logical(), len, file, sink).map_err(SealError::io("frame", source))
}

/// Frame every member of `members` into `sink` in logical-name order.
///
/// # Errors
///
/// Returns the first error raised by [`frame_record`].
pub fn frame_members<W: Write + ?Sized>(members: &MemberSet, sink: &mut W) -> Result<()> {
    for record in members.records() {
        frame_record(record, sink)?;
    }
    Ok(())
}
