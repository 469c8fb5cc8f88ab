//! Response body decoders
//!
//! Both decoders borrow the buffered socket input of the connection for
//! the duration of a single response and never read past the end of the
//! body. A body must be drained completely before the connection is used
//! for the next request, otherwise the remaining bytes are taken as the
//! start of the next response.

use std::cmp::min;
use std::io::{self, Read, BufReader};

use shared::BodyKind;
use super::{ClientError, MAX_CHUNK_HEAD};
use super::line::read_byte;


const MAX_PREALLOC: u64 = 65536;

/// Reads into `buf`, retrying on `Interrupted`
fn read_some<R: Read>(src: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match src.read(buf) {
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            res => return res,
        }
    }
}

/// Body framed by `Content-Length`
pub struct FixedBody<'a, R: Read + 'a> {
    inner: &'a mut BufReader<R>,
    limit: u64,
    pos: u64,
    closed: bool,
}

impl<'a, R: Read + 'a> FixedBody<'a, R> {
    pub fn new(inner: &'a mut BufReader<R>, limit: u64) -> FixedBody<'a, R> {
        FixedBody {
            inner: inner,
            limit: limit,
            pos: 0,
            closed: false,
        }
    }
    pub fn limit(&self) -> u64 {
        self.limit
    }
    /// Number of body bytes consumed so far
    pub fn position(&self) -> u64 {
        self.pos
    }
    pub fn remaining(&self) -> u64 {
        self.limit - self.pos
    }
    pub fn is_eof(&self) -> bool {
        self.pos >= self.limit
    }
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, ClientError> {
        if self.closed {
            return Err(ClientError::ClosedBody);
        }
        if self.is_eof() || buf.is_empty() {
            return Ok(0);
        }
        let len = min(buf.len() as u64, self.remaining()) as usize;
        let count = read_some(&mut *self.inner, &mut buf[..len])?;
        if count == 0 {
            return Err(ClientError::PrematureEof);
        }
        self.pos += count as u64;
        Ok(count)
    }
    pub fn read_byte(&mut self) -> Result<Option<u8>, ClientError> {
        let mut byte = [0u8; 1];
        match self.read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }
    /// Skips up to `n` bytes, never past the end of the body
    pub fn skip(&mut self, n: u64) -> Result<u64, ClientError> {
        if self.closed {
            return Err(ClientError::ClosedBody);
        }
        let len = min(n, self.remaining());
        let skipped = io::copy(
            &mut self.inner.by_ref().take(len), &mut io::sink())?;
        self.pos += skipped;
        if skipped < len {
            return Err(ClientError::PrematureEof);
        }
        Ok(skipped)
    }
    /// Number of bytes that can be read without blocking
    pub fn available(&self) -> usize {
        if self.closed {
            return 0;
        }
        min(self.inner.buffer().len() as u64, self.remaining()) as usize
    }
    /// Marks the body closed, further reads fail
    ///
    /// Unread bytes stay in the socket, so the connection must be dropped
    /// unless the body was drained.
    pub fn close(&mut self) {
        self.closed = true;
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Scan {
    Normal,
    CarriageReturn,
    Quoted,
}

/// Body with `Transfer-Encoding: chunked`
pub struct ChunkedBody<'a, R: Read + 'a> {
    inner: &'a mut BufReader<R>,
    chunk_size: u64,
    pos: u64,
    bof: bool,
    eof: bool,
    closed: bool,
    head: Vec<u8>,
}

impl<'a, R: Read + 'a> ChunkedBody<'a, R> {
    pub fn new(inner: &'a mut BufReader<R>) -> ChunkedBody<'a, R> {
        ChunkedBody {
            inner: inner,
            chunk_size: 0,
            pos: 0,
            bof: true,
            eof: false,
            closed: false,
            head: Vec::new(),
        }
    }
    pub fn is_eof(&self) -> bool {
        self.eof
    }
    /// Size of the chunk being read, zero before the first chunk
    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, ClientError> {
        if self.closed {
            return Err(ClientError::ClosedBody);
        }
        if self.eof || buf.is_empty() {
            return Ok(0);
        }
        if self.pos >= self.chunk_size {
            self.next_chunk()?;
            if self.eof {
                return Ok(0);
            }
        }
        let len = min(buf.len() as u64, self.chunk_size - self.pos) as usize;
        let count = read_some(&mut *self.inner, &mut buf[..len])?;
        if count == 0 {
            return Err(ClientError::PrematureEof);
        }
        self.pos += count as u64;
        Ok(count)
    }
    pub fn read_byte(&mut self) -> Result<Option<u8>, ClientError> {
        let mut byte = [0u8; 1];
        match self.read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }
    /// Skips up to `n` bytes of decoded data
    pub fn skip(&mut self, n: u64) -> Result<u64, ClientError> {
        let mut scratch = [0u8; 512];
        let mut skipped = 0;
        while skipped < n {
            let len = min(n - skipped, scratch.len() as u64) as usize;
            match self.read(&mut scratch[..len])? {
                0 => break,
                count => skipped += count as u64,
            }
        }
        Ok(skipped)
    }
    /// Bytes of the current chunk that are already buffered
    pub fn available(&self) -> usize {
        if self.closed || self.eof {
            return 0;
        }
        min(self.inner.buffer().len() as u64,
            self.chunk_size - self.pos) as usize
    }
    /// Marks the stream exhausted without draining the remaining chunks
    ///
    /// Only valid right before the connection is discarded.
    pub fn close(&mut self) {
        self.eof = true;
        self.closed = true;
    }

    fn next_chunk(&mut self) -> Result<(), ClientError> {
        if !self.bof {
            self.read_crlf()?;
        }
        self.chunk_size = self.read_chunk_size()?;
        self.bof = false;
        self.pos = 0;
        trace!("chunk of {} bytes", self.chunk_size);
        if self.chunk_size == 0 {
            self.eof = true;
            self.skip_trailers()?;
        }
        Ok(())
    }

    fn read_crlf(&mut self) -> Result<(), ClientError> {
        let cr = read_byte(&mut *self.inner)?;
        let lf = read_byte(&mut *self.inner)?;
        if cr != Some(b'\r') || lf != Some(b'\n') {
            return Err(ClientError::BadChunkTerminator(cr, lf));
        }
        Ok(())
    }

    fn head_byte(&mut self) -> Result<u8, ClientError> {
        read_byte(&mut *self.inner)?.ok_or(ClientError::PrematureEof)
    }

    fn push_head(&mut self, byte: u8) -> Result<(), ClientError> {
        if self.head.len() >= MAX_CHUNK_HEAD {
            return Err(ClientError::BadChunkHead("chunk head is too long"));
        }
        self.head.push(byte);
        Ok(())
    }

    /// Scans `size[;ext[="quoted value"]]CRLF`
    fn read_chunk_size(&mut self) -> Result<u64, ClientError> {
        self.head.clear();
        let mut ext_start = None;
        let mut state = Scan::Normal;
        loop {
            let byte = self.head_byte()?;
            match state {
                Scan::Normal => match byte {
                    b'\r' => state = Scan::CarriageReturn,
                    b'\n' => {
                        return Err(ClientError::BadChunkHead(
                            "newline without carriage return"));
                    }
                    b'"' => {
                        state = Scan::Quoted;
                        self.push_head(byte)?;
                    }
                    b';' => {
                        if ext_start.is_none() {
                            ext_start = Some(self.head.len());
                        }
                        self.push_head(byte)?;
                    }
                    _ => self.push_head(byte)?,
                },
                Scan::CarriageReturn => {
                    if byte != b'\n' {
                        return Err(ClientError::BadChunkHead(
                            "carriage return without newline"));
                    }
                    break;
                }
                Scan::Quoted => match byte {
                    b'\\' => {
                        let escaped = self.head_byte()?;
                        self.push_head(escaped)?;
                    }
                    b'"' => {
                        state = Scan::Normal;
                        self.push_head(byte)?;
                    }
                    _ => self.push_head(byte)?,
                },
            }
        }
        let size_end = ext_start.unwrap_or(self.head.len());
        let text = String::from_utf8_lossy(&self.head[..size_end]);
        let digits = text.trim();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(ClientError::BadChunkSize(digits.to_string()));
        }
        u64::from_str_radix(digits, 16)
            .map_err(|_| ClientError::BadChunkSize(digits.to_string()))
    }

    // trailers are not exposed, but must be consumed for keep-alive
    fn skip_trailers(&mut self) -> Result<(), ClientError> {
        loop {
            let mut len = 0;
            loop {
                match read_byte(&mut *self.inner)? {
                    None if len == 0 => return Ok(()),
                    None => return Err(ClientError::PrematureEof),
                    Some(b'\n') => break,
                    Some(b'\r') => {}
                    Some(_) => {
                        len += 1;
                        if len > MAX_CHUNK_HEAD {
                            return Err(ClientError::BadChunkHead(
                                "trailer is too long"));
                        }
                    }
                }
            }
            if len == 0 {
                return Ok(());
            }
        }
    }
}

/// A response body of either framing
pub enum Body<'a, R: Read + 'a> {
    Fixed(FixedBody<'a, R>),
    Chunked(ChunkedBody<'a, R>),
}

impl<'a, R: Read + 'a> Body<'a, R> {
    pub fn new(kind: BodyKind, inner: &'a mut BufReader<R>) -> Body<'a, R> {
        match kind {
            BodyKind::Fixed(len) => Body::Fixed(FixedBody::new(inner, len)),
            BodyKind::Chunked => Body::Chunked(ChunkedBody::new(inner)),
        }
    }
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, ClientError> {
        match *self {
            Body::Fixed(ref mut b) => b.read(buf),
            Body::Chunked(ref mut b) => b.read(buf),
        }
    }
    pub fn read_byte(&mut self) -> Result<Option<u8>, ClientError> {
        match *self {
            Body::Fixed(ref mut b) => b.read_byte(),
            Body::Chunked(ref mut b) => b.read_byte(),
        }
    }
    pub fn skip(&mut self, n: u64) -> Result<u64, ClientError> {
        match *self {
            Body::Fixed(ref mut b) => b.skip(n),
            Body::Chunked(ref mut b) => b.skip(n),
        }
    }
    pub fn available(&self) -> usize {
        match *self {
            Body::Fixed(ref b) => b.available(),
            Body::Chunked(ref b) => b.available(),
        }
    }
    pub fn is_chunked(&self) -> bool {
        matches!(*self, Body::Chunked(..))
    }
    pub fn is_eof(&self) -> bool {
        match *self {
            Body::Fixed(ref b) => b.is_eof(),
            Body::Chunked(ref b) => b.is_eof(),
        }
    }
    pub fn close(&mut self) {
        match *self {
            Body::Fixed(ref mut b) => b.close(),
            Body::Chunked(ref mut b) => b.close(),
        }
    }
    /// Drains the body into `out`, returns number of bytes appended
    pub fn read_to_end(&mut self, out: &mut Vec<u8>)
        -> Result<usize, ClientError>
    {
        // the length comes from the server, don't trust it for allocation
        if let Body::Fixed(ref b) = *self {
            out.reserve(min(b.remaining(), MAX_PREALLOC) as usize);
        }
        let mut buf = [0u8; 4096];
        let mut total = 0;
        loop {
            match self.read(&mut buf)? {
                0 => return Ok(total),
                count => {
                    out.extend_from_slice(&buf[..count]);
                    total += count;
                }
            }
        }
    }
}

impl<'a, R: Read + 'a> Read for FixedBody<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        FixedBody::read(self, buf).map_err(ClientError::into_io)
    }
}

impl<'a, R: Read + 'a> Read for ChunkedBody<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        ChunkedBody::read(self, buf).map_err(ClientError::into_io)
    }
}

impl<'a, R: Read + 'a> Read for Body<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Body::read(self, buf).map_err(ClientError::into_io)
    }
}

#[cfg(test)]
mod test {
    use std::io::{BufReader, Cursor, Read};

    use shared::BodyKind;
    use client::ClientError;
    use super::{Body, FixedBody, ChunkedBody};

    fn input(data: &[u8]) -> BufReader<Cursor<Vec<u8>>> {
        BufReader::new(Cursor::new(data.to_vec()))
    }

    fn rest(mut inp: BufReader<Cursor<Vec<u8>>>) -> Vec<u8> {
        let mut tail = Vec::new();
        inp.read_to_end(&mut tail).unwrap();
        tail
    }

    fn decode_chunked(data: &[u8]) -> Result<Vec<u8>, ClientError> {
        let mut inp = input(data);
        let mut body = ChunkedBody::new(&mut inp);
        let mut out = Vec::new();
        let mut buf = [0u8; 3];
        loop {
            match body.read(&mut buf)? {
                0 => return Ok(out),
                n => out.extend_from_slice(&buf[..n]),
            }
        }
    }

    #[test]
    fn test_fixed_stops_at_limit() {
        let mut inp = input(b"HTTPSQS_PUT_OKHTTP/1.1 200 OK\r\n");
        {
            let mut body = FixedBody::new(&mut inp, 14);
            let mut out = String::new();
            body.read_to_string(&mut out).unwrap();
            assert_eq!(out, "HTTPSQS_PUT_OK");
            assert!(body.is_eof());
            assert_eq!(body.position(), 14);
            assert_eq!(body.read_byte().unwrap(), None);
        }
        assert_eq!(rest(inp), b"HTTP/1.1 200 OK\r\n");
    }

    #[test]
    fn test_fixed_available_and_skip() {
        let mut inp = input(b"0123456789tail");
        {
            let mut body = FixedBody::new(&mut inp, 10);
            assert_eq!(body.read_byte().unwrap(), Some(b'0'));
            assert_eq!(body.available(), 9);
            assert_eq!(body.skip(4).unwrap(), 4);
            assert_eq!(body.skip(100).unwrap(), 5);
            assert_eq!(body.available(), 0);
            assert_eq!(body.remaining(), 0);
        }
        assert_eq!(rest(inp), b"tail");
    }

    #[test]
    fn test_fixed_zero_length() {
        let mut inp = input(b"next");
        let mut body = FixedBody::new(&mut inp, 0);
        let mut buf = [0u8; 8];
        assert_eq!(body.read(&mut buf).unwrap(), 0);
        assert!(body.is_eof());
    }

    #[test]
    fn test_fixed_premature_eof() {
        let mut inp = input(b"short");
        let mut body = FixedBody::new(&mut inp, 10);
        let mut out = Vec::new();
        let mut buf = [0u8; 16];
        let count = body.read(&mut buf).unwrap();
        out.extend_from_slice(&buf[..count]);
        assert_eq!(out, b"short");
        assert_matches!(body.read(&mut buf), Err(ClientError::PrematureEof));
    }

    #[test]
    fn test_fixed_closed() {
        let mut inp = input(b"abc");
        let mut body = FixedBody::new(&mut inp, 3);
        body.close();
        assert_eq!(body.available(), 0);
        assert_matches!(body.read_byte(), Err(ClientError::ClosedBody));
    }

    #[test]
    fn test_chunked_simple() {
        assert_eq!(decode_chunked(b"5\r\nhello\r\n0\r\n\r\n").unwrap(),
                   b"hello");
    }

    #[test]
    fn test_chunked_many() {
        let data = b"3\r\nabc\r\n1\r\nd\r\nA\r\n0123456789\r\n0\r\n\r\n";
        assert_eq!(decode_chunked(data).unwrap(), b"abcd0123456789");
    }

    #[test]
    fn test_chunked_empty() {
        assert_eq!(decode_chunked(b"0\r\n\r\n").unwrap(), b"");
    }

    #[test]
    fn test_chunked_leaves_next_response() {
        let mut inp = input(b"2\r\nok\r\n0\r\nX-Trailer: 1\r\n\r\nHTTP/1.1");
        {
            let mut body = ChunkedBody::new(&mut inp);
            let mut out = Vec::new();
            body.read_to_end(&mut out).unwrap();
            assert_eq!(out, b"ok");
            assert!(body.is_eof());
        }
        assert_eq!(rest(inp), b"HTTP/1.1");
    }

    #[test]
    fn test_chunked_extensions() {
        let data = b"4;name=value\r\nwiki\r\n\
                     5 ; q=\"a;b\\\"c\"\r\npedia\r\n0\r\n\r\n";
        assert_eq!(decode_chunked(data).unwrap(), b"wikipedia");
    }

    #[test]
    fn test_chunked_uppercase_hex() {
        let mut data = b"1F\r\n".to_vec();
        data.extend_from_slice(&[b'x'; 31]);
        data.extend_from_slice(b"\r\n0\r\n\r\n");
        assert_eq!(decode_chunked(&data).unwrap().len(), 31);
    }

    #[test]
    fn test_chunked_bad_terminator() {
        assert_matches!(decode_chunked(b"5\r\nhelloXX0\r\n\r\n"),
            Err(ClientError::BadChunkTerminator(Some(b'X'), Some(b'X'))));
        assert_matches!(decode_chunked(b"5\r\nhello0\r\n\r\n"),
            Err(ClientError::BadChunkTerminator(..)));
    }

    #[test]
    fn test_chunked_bad_size() {
        assert_matches!(decode_chunked(b"zz\r\nhello\r\n0\r\n\r\n"),
            Err(ClientError::BadChunkSize(_)));
        assert_matches!(decode_chunked(b"\r\nhello\r\n"),
            Err(ClientError::BadChunkSize(_)));
        assert_matches!(decode_chunked(b"+5\r\nhello\r\n"),
            Err(ClientError::BadChunkSize(_)));
    }

    #[test]
    fn test_chunked_bad_head() {
        assert_matches!(decode_chunked(b"5\rhello"),
            Err(ClientError::BadChunkHead(_)));
        assert_matches!(decode_chunked(b"5\nhello"),
            Err(ClientError::BadChunkHead(_)));
    }

    #[test]
    fn test_chunked_premature_eof() {
        assert_matches!(decode_chunked(b"5\r\nhel"),
            Err(ClientError::PrematureEof));
        assert_matches!(decode_chunked(b"5"),
            Err(ClientError::PrematureEof));
    }

    #[test]
    fn test_chunked_close() {
        let mut inp = input(b"5\r\nhello\r\n0\r\n\r\n");
        let mut body = ChunkedBody::new(&mut inp);
        assert_eq!(body.read_byte().unwrap(), Some(b'h'));
        body.close();
        assert!(body.is_eof());
        assert_matches!(body.read_byte(), Err(ClientError::ClosedBody));
    }

    #[test]
    fn test_chunked_skip() {
        let mut inp = input(b"3\r\nabc\r\n3\r\ndef\r\n0\r\n\r\n");
        let mut body = ChunkedBody::new(&mut inp);
        assert_eq!(body.skip(4).unwrap(), 4);
        assert_eq!(body.read_byte().unwrap(), Some(b'e'));
        assert_eq!(body.skip(10).unwrap(), 1);
        assert!(body.is_eof());
    }

    #[test]
    fn test_io_read_error() {
        let mut inp = input(b"q\r\n");
        let mut body = Body::new(BodyKind::Chunked, &mut inp);
        let mut out = Vec::new();
        let err = Read::read_to_end(&mut body, &mut out).unwrap_err();
        assert_matches!(ClientError::from(err), ClientError::BadChunkSize(_));
    }

    #[test]
    fn test_huge_content_length() {
        let mut inp = input(b"abc");
        let mut body = Body::new(BodyKind::Fixed(u64::max_value()), &mut inp);
        let mut out = Vec::new();
        assert_matches!(body.read_to_end(&mut out),
            Err(ClientError::PrematureEof));
        assert_eq!(out, b"abc");
    }

    #[test]
    fn test_fixed_exact_bytes() {
        let payload = b"line\r\n\r\nnext\n\xc3\xa9\xff\x00\r";
        let mut data = payload.to_vec();
        data.extend_from_slice(b"HTTP");
        let mut inp = input(&data);
        {
            let mut body = FixedBody::new(&mut inp, payload.len() as u64);
            assert_eq!(body.limit(), payload.len() as u64);
            let mut out = Vec::new();
            Read::read_to_end(&mut body, &mut out).unwrap();
            assert_eq!(&out[..], &payload[..]);
            assert_eq!(body.position(), payload.len() as u64);
        }
        assert_eq!(rest(inp), b"HTTP");
    }

    #[test]
    fn test_chunked_exact_bytes() {
        let mut inp = input(b"6\r\n\r\n\r\n\xc3\xa9\r\n\
                              3\r\n\xff\x000\r\n0\r\n\r\n");
        let mut body = ChunkedBody::new(&mut inp);
        assert_eq!(body.chunk_size(), 0);
        assert_eq!(body.read_byte().unwrap(), Some(b'\r'));
        assert_eq!(body.chunk_size(), 6);
        let mut out = Vec::new();
        Read::read_to_end(&mut body, &mut out).unwrap();
        assert_eq!(out, b"\n\r\n\xc3\xa9\xff\x000");
    }

    #[test]
    fn test_body_dispatch() {
        let mut inp = input(b"abcdef");
        let mut body = Body::new(BodyKind::Fixed(4), &mut inp);
        let mut out = Vec::new();
        assert_eq!(body.read_to_end(&mut out).unwrap(), 4);
        assert_eq!(out, b"abcd");
        assert!(body.is_eof());
        assert!(!body.is_chunked());
    }
}
