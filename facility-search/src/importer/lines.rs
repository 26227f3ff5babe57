//! Line reading shared by the import passes.

use std::io::{self, BufRead};

/// Data lines of a stream with their 1-based line numbers.
///
/// The first line is the header and is always skipped. Blank lines are dropped.
/// Bytes that are not valid UTF-8 are replaced rather than failing the stream.
pub(crate) fn data_lines<R: BufRead>(
    reader: R,
) -> impl Iterator<Item = (usize, io::Result<String>)> {
    reader
        .split(b'\n')
        .enumerate()
        .skip(1)
        .map(|(index, bytes)| (index + 1, bytes.map(decode_line)))
        .filter(|(_, line)| !matches!(line, Ok(l) if l.trim().is_empty()))
}

fn decode_line(bytes: Vec<u8>) -> String {
    let line = String::from_utf8_lossy(&bytes);
    line.trim_end_matches('\r').to_string()
}
