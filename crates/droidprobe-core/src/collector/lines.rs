//! Line sources for streaming reads.

use std::io::{self, BufRead};

/// A lazy sequence of lines from a file or a running command.
pub type LineStream<'a> = Box<dyn Iterator<Item = io::Result<String>> + 'a>;

/// Longest line kept, in bytes. The rest of an overlong line is dropped so
/// a log without newlines cannot grow a single line without bound.
pub const MAX_LINE_BYTES: usize = 4096;

/// Splits a reader into lines, replacing invalid UTF-8 instead of failing.
///
/// Kernel logs routinely carry driver output in arbitrary encodings, so
/// [`BufRead::lines`] is too strict here. Lines longer than
/// [`MAX_LINE_BYTES`] are truncated.
pub struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> LossyLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(256),
        }
    }
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        let mut read_any = false;
        loop {
            let chunk = match self.reader.fill_buf() {
                Ok(chunk) => chunk,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Some(Err(e)),
            };
            if chunk.is_empty() {
                if !read_any {
                    return None;
                }
                break;
            }
            read_any = true;
            let (line, used, complete) = match chunk.iter().position(|&b| b == b'\n') {
                Some(i) => (&chunk[..i], i + 1, true),
                None => (chunk, chunk.len(), false),
            };
            let room = MAX_LINE_BYTES.saturating_sub(self.buf.len());
            self.buf.extend_from_slice(&line[..line.len().min(room)]);
            self.reader.consume(used);
            if complete {
                break;
            }
        }
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }
        Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}
