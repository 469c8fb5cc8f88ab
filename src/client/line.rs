use std::io::{self, Read};

use super::ClientError;
use super::LINE_BUFFER_SIZE;


/// Reads CRLF-terminated lines into a fixed-size reusable buffer
///
/// Bytes are pulled one at a time, so nothing past the line terminator is
/// consumed from the source. This is what keeps the body (and the next
/// response on a keep-alive connection) intact, but it also means the
/// source should be buffered.
pub struct LineReader {
    buf: Box<[u8]>,
    eof: bool,
}

/// Reads a single byte, retrying on `Interrupted`
pub fn read_byte<R: Read>(src: &mut R) -> io::Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match src.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

impl LineReader {
    pub fn new() -> LineReader {
        LineReader::with_capacity(LINE_BUFFER_SIZE)
    }
    pub fn with_capacity(size: usize) -> LineReader {
        LineReader {
            buf: vec![0u8; size].into_boxed_slice(),
            eof: false,
        }
    }
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }
    /// Returns true if the last line was cut short by the end of stream
    pub fn hit_eof(&self) -> bool {
        self.eof
    }
    /// Reads the next line, without CR and LF bytes
    ///
    /// An empty slice means either an empty line (the end of headers) or
    /// the end of stream, check `hit_eof()` to tell them apart. A line cut
    /// short by the end of stream is returned as is.
    pub fn read_line<R: Read>(&mut self, src: &mut R)
        -> Result<&[u8], ClientError>
    {
        let mut count = 0;
        self.eof = false;
        loop {
            let next = match read_byte(src)? {
                Some(b) => b,
                None => {
                    self.eof = true;
                    break;
                }
            };
            match next {
                b'\n' => break,
                b'\r' => continue,
                _ => {}
            }
            self.buf[count] = next;
            count += 1;
            // the buffer must never fill up, so the longest line is one
            // byte shorter than the buffer
            if count >= self.buf.len() {
                return Err(ClientError::LineTooLong(self.buf.len()));
            }
        }
        Ok(&self.buf[..count])
    }
}
