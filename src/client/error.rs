use std::io;


quick_error!{
    /// Error type of a single request/response cycle
    ///
    /// This is primarily for better debugging. Could also be used for putting
    /// into the logs. Use `kind()` to branch on the class of the failure.
    ///
    /// Note, you should not match the enum values and/or make an exhaustive
    /// match over the enum. More errors will be added at will.
    #[derive(Debug)]
    pub enum ClientError {
        MalformedRequest(reason: String) {
            description("request can't be encoded")
            display("malformed request: {}", reason)
        }
        UnsupportedCharset(label: String) {
            description("unsupported charset")
            display("unsupported charset: {}", label)
        }
        Resolve(addr: String, err: io::Error) {
            description("error resolving server address")
            display("can't resolve {}: {}", addr, err)
            cause(err)
        }
        Connect(addr: String, err: io::Error) {
            description("error connecting to server")
            display("can't connect to {}: {}", addr, err)
            cause(err)
        }
        Io(err: io::Error) {
            description("I/O error")
            display("I/O error: {}", err)
            cause(err)
        }
        UnexpectedStatus(code: String, reason: String) {
            description("unexpected response status")
            display("Unexpected Response from Server: {} {}", code, reason)
        }
        BadStatusLine(line: String) {
            description("error parsing status line")
            display("bad status line: {:?}", line)
        }
        BadVersion(version: String) {
            description("unsupported protocol version")
            display("unsupported protocol version: {:?}", version)
        }
        ResponseCharset(label: String) {
            description("unsupported charset in response")
            display("unsupported charset in response: {}", label)
        }
        LineTooLong(limit: usize) {
            description("line is larger than the line buffer")
            display("HTTP Line too long, more than: {}", limit)
        }
        BadChunkTerminator(cr: Option<u8>, lf: Option<u8>) {
            description("CRLF expected at end of chunk")
            display("CRLF expected at end of chunk: {:?}/{:?}", cr, lf)
        }
        BadChunkHead(reason: &'static str) {
            description("error parsing chunk head")
            display("protocol violation in chunk head: {}", reason)
        }
        BadChunkSize(text: String) {
            description("error parsing chunk size")
            display("bad chunk size: {:?}", text)
        }
        PrematureEof {
            description("premature end of stream")
            display("premature end of stream")
        }
        ConnectionClosed {
            description("connection closed by server before response")
            display("connection closed by server before response")
        }
        ClosedBody {
            description("attempted read from closed body")
            display("attempted read from closed body")
        }
    }
}

/// Broad class of a `ClientError`
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Inputs can't be encoded, nothing has been sent
    MalformedRequest,
    /// Timeout, refused or unreachable while connecting
    Connect,
    /// Server response violates the protocol or is not `200`
    Protocol,
    /// Generic transport fault during read or write
    Io,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        use self::ClientError::*;
        match *self {
            MalformedRequest(..) | UnsupportedCharset(..)
            => ErrorKind::MalformedRequest,
            Resolve(..) | Connect(..) => ErrorKind::Connect,
            Io(..) => ErrorKind::Io,
            UnexpectedStatus(..) | BadStatusLine(..) | BadVersion(..)
            | ResponseCharset(..) | LineTooLong(..)
            | BadChunkTerminator(..) | BadChunkHead(..) | BadChunkSize(..)
            | PrematureEof | ConnectionClosed | ClosedBody
            => ErrorKind::Protocol,
        }
    }
    /// Wraps the error so it can travel through `std::io::Read`
    ///
    /// `From<io::Error>` unwraps it back.
    pub fn into_io(self) -> io::Error {
        match self {
            ClientError::Io(err) => err,
            err => io::Error::new(io::ErrorKind::InvalidData, err),
        }
    }
}

impl From<io::Error> for ClientError {
    fn from(err: io::Error) -> ClientError {
        if !err.get_ref().map_or(false, |e| e.is::<ClientError>()) {
            return ClientError::Io(err);
        }
        match err.into_inner().map(|e| e.downcast::<ClientError>()) {
            Some(Ok(inner)) => *inner,
            _ => unreachable!(),
        }
    }
}

#[cfg(test)]
mod test {
    use std::io;
    use super::{ClientError, ErrorKind};

    #[test]
    fn test_kinds() {
        assert_eq!(ClientError::LineTooLong(8192).kind(), ErrorKind::Protocol);
        assert_eq!(ClientError::UnsupportedCharset("gbk".into()).kind(),
                   ErrorKind::MalformedRequest);
        let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "no");
        assert_eq!(ClientError::Connect("h:1".into(), refused).kind(),
                   ErrorKind::Connect);
    }

    #[test]
    fn test_io_roundtrip() {
        let err = ClientError::BadChunkSize("zz".into()).into_io();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_matches!(ClientError::from(err), ClientError::BadChunkSize(_));
    }

    #[test]
    fn test_plain_io() {
        let err = io::Error::new(io::ErrorKind::TimedOut, "read timed out");
        let err = ClientError::from(err);
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_matches!(ClientError::from(err.into_io()), ClientError::Io(_));
    }

    #[test]
    fn test_display() {
        let err = ClientError::UnexpectedStatus("404".into(),
                                                "Not Found".into());
        assert_eq!(err.to_string(),
                   "Unexpected Response from Server: 404 Not Found");
        assert_eq!(ClientError::PrematureEof.to_string(),
                   "premature end of stream");
        assert_eq!(ClientError::ConnectionClosed.to_string(),
                   "connection closed by server before response");
        assert_eq!(ClientError::ClosedBody.to_string(),
                   "attempted read from closed body");
    }
}
