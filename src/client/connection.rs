use std::io::{self, BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs, Shutdown};
use std::time::Duration;

use net2::TcpStreamExt;

use shared::Charset;
use super::{ClientError, Config, Head};
use super::body::Body;
use super::line::LineReader;
use super::parser;
use super::request::{Encoder, Credentials, Request, host_header};


/// Stage of the request/response cycle on a connection
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Connected and ready for a request
    Idle,
    RequestSent,
    StatusRead,
    HeadersRead,
    BodyStreaming,
    /// No socket, the next request reconnects
    Closed,
}

/// Head and decoded body of a successful response
#[derive(Debug, Clone)]
pub struct Response {
    pub head: Head,
    pub body: String,
}

struct Socket {
    stream: TcpStream,
    writer: BufWriter<TcpStream>,
    reader: BufReader<TcpStream>,
}

/// A single keep-alive HTTP/1.1 connection to the queue server
///
/// The socket is opened lazily and reused for as long as the server allows.
/// Any failure closes it and the next request transparently reconnects.
/// There is no pipelining: every method that talks to the server takes
/// `&mut self` and runs a complete request/response cycle.
pub struct Connection {
    config: Config,
    host: String,
    charset: Charset,
    lines: LineReader,
    socket: Option<Socket>,
    keep_alive: bool,
    phase: Phase,
}

fn zero(timeout: Duration) -> bool {
    timeout == Duration::new(0, 0)
}

fn connect(config: &Config) -> Result<TcpStream, ClientError> {
    let addr = config.address();
    let addrs = (&config.host[..], config.port).to_socket_addrs()
        .map_err(|e| ClientError::Resolve(addr.clone(), e))?;
    let mut last_error = None;
    for sock_addr in addrs {
        let res = if zero(config.connect_timeout) {
            TcpStream::connect(sock_addr)
        } else {
            TcpStream::connect_timeout(&sock_addr, config.connect_timeout)
        };
        match res {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!("error connecting to {}: {}", sock_addr, e);
                last_error = Some(e);
            }
        }
    }
    match last_error {
        Some(e) => Err(ClientError::Connect(addr, e)),
        None => Err(ClientError::Resolve(addr, io::Error::new(
            io::ErrorKind::NotFound, "no addresses found"))),
    }
}

// socket options are best effort, the connection is usable without them
fn configure(stream: &TcpStream, config: &Config) {
    let timeout = if zero(config.read_timeout) {
        None
    } else {
        Some(config.read_timeout)
    };
    if let Err(e) = stream.set_read_timeout(timeout) {
        warn!("can't set read timeout: {}", e);
    }
    if let Err(e) = stream.set_nodelay(true) {
        warn!("can't set TCP_NODELAY: {}", e);
    }
    if let Err(e) = TcpStreamExt::set_linger(stream,
                                             Some(Duration::new(0, 0)))
    {
        warn!("can't set SO_LINGER: {}", e);
    }
}

impl Connection {
    pub fn new(config: Config) -> Connection {
        Connection {
            host: host_header(&config.host, config.port),
            charset: config.charset,
            lines: LineReader::new(),
            socket: None,
            keep_alive: false,
            phase: Phase::Closed,
            config: config,
        }
    }
    pub fn config(&self) -> &Config {
        &self.config
    }
    /// Charset used for the next request and response
    ///
    /// Starts as the configured one and follows the `charset` parameter
    /// of response `Content-Type` headers.
    pub fn charset(&self) -> Charset {
        self.charset
    }
    pub fn phase(&self) -> Phase {
        self.phase
    }
    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }
    /// Connects to the server unless already connected
    pub fn open(&mut self) -> Result<(), ClientError> {
        if self.socket.is_some() {
            return Ok(());
        }
        let stream = connect(&self.config)?;
        configure(&stream, &self.config);
        let writer = BufWriter::new(stream.try_clone()?);
        let reader = BufReader::new(stream.try_clone()?);
        debug!("connected to {}", self.config.address());
        self.socket = Some(Socket {
            stream: stream,
            writer: writer,
            reader: reader,
        });
        self.keep_alive = true;
        self.phase = Phase::Idle;
        Ok(())
    }
    /// Drops the socket, errors while closing are ignored
    pub fn close(&mut self) {
        if let Some(sock) = self.socket.take() {
            // unsent bytes are only left after a failed write
            let unsent = match sock.writer.into_parts().1 {
                Ok(buf) => buf.len(),
                Err(panicked) => panicked.into_inner().len(),
            };
            if unsent > 0 {
                debug!("dropping {} unsent bytes", unsent);
            }
            if let Err(e) = sock.stream.shutdown(Shutdown::Both) {
                debug!("error shutting down connection: {}", e);
            }
            debug!("connection to {} closed", self.config.address());
        }
        self.keep_alive = false;
        self.phase = Phase::Closed;
    }
    /// Sends the request and returns the response body as text
    ///
    /// Sends `POST` if `body` is given, `GET` otherwise.
    pub fn send_request(&mut self, path: &str, body: Option<&str>,
        credentials: Option<&Credentials>)
        -> Result<String, ClientError>
    {
        self.exchange(path, body, credentials).map(|resp| resp.body)
    }
    /// Same as `send_request` but returns the response head too
    pub fn exchange(&mut self, path: &str, body: Option<&str>,
        credentials: Option<&Credentials>)
        -> Result<Response, ClientError>
    {
        let request = Encoder {
            user_agent: &self.config.user_agent,
            host: &self.host,
            charset: self.charset,
        }.encode(path, body, credentials)?;
        if let Err(e) = self.open() {
            self.close();
            return Err(e);
        }
        match self.cycle(&request) {
            Ok(resp) => {
                if self.keep_alive {
                    self.phase = Phase::Idle;
                } else {
                    debug!("server doesn't keep connection alive");
                    self.close();
                }
                Ok(resp)
            }
            Err(e) => {
                debug!("{} {} failed: {}", request.method(), path, e);
                self.close();
                Err(e)
            }
        }
    }

    fn cycle(&mut self, request: &Request) -> Result<Response, ClientError> {
        let charset = self.charset;
        let sock = match self.socket {
            Some(ref mut sock) => sock,
            None => return Err(ClientError::ConnectionClosed),
        };
        request.write_to(&mut sock.writer, charset)?;
        self.phase = Phase::RequestSent;
        let status = parser::read_status(
            &mut sock.reader, &mut self.lines, charset)?;
        self.phase = Phase::StatusRead;
        let head = parser::read_headers(
            &mut sock.reader, &mut self.lines, charset, status)?;
        self.phase = Phase::HeadersRead;
        self.charset = head.charset;
        self.keep_alive = head.keep_alive;

        self.phase = Phase::BodyStreaming;
        let mut raw = Vec::new();
        let mut body = Body::new(head.body_kind, &mut sock.reader);
        let len = body.read_to_end(&mut raw)?;
        trace!("read {} body bytes (chunked: {})", len, body.is_chunked());
        let body = head.charset.decode(&raw).into_owned();
        Ok(Response {
            head: head,
            body: body,
        })
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod test {
    use std::net::TcpListener;
    use std::thread;

    use shared::Charset;
    use client::{ClientError, Config, ErrorKind};
    use super::{Connection, Phase};

    #[test]
    fn test_lazy_open() {
        let conn = Connection::new(Config::new("127.0.0.1", 1218));
        assert!(!conn.is_open());
        assert_eq!(conn.phase(), Phase::Closed);
    }

    #[test]
    fn test_malformed_does_not_connect() {
        let mut conn = Connection::new(Config::new("127.0.0.1", 1)
            .charset(Charset::from_label("ISO-8859-1").unwrap()));
        let err = conn.send_request("/?opt=put", Some("\u{6d4b}"), None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedRequest);
        assert!(!conn.is_open());
    }

    #[test]
    fn test_refused() {
        // bind and drop to get a port nobody listens on
        let port = TcpListener::bind("127.0.0.1:0").unwrap()
            .local_addr().unwrap().port();
        let mut conn = Connection::new(Config::new("127.0.0.1", port));
        let err = conn.send_request("/", None, None).unwrap_err();
        assert_matches!(err, ClientError::Connect(..));
        assert_eq!(conn.phase(), Phase::Closed);
    }

    #[test]
    fn test_close_is_idempotent() {
        let lst = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = lst.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            lst.accept().unwrap();
        });
        let mut conn = Connection::new(Config::new("127.0.0.1", port));
        conn.open().unwrap();
        conn.open().unwrap();
        assert!(conn.is_open());
        assert_eq!(conn.phase(), Phase::Idle);
        conn.close();
        conn.close();
        assert!(!conn.is_open());
        server.join().unwrap();
    }
}
