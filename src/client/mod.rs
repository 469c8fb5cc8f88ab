//! HTTP Client implementation
//!
//! This is a minimal blocking HTTP/1.1 client made for talking to the
//! httpsqs queue server. It speaks only the subset of the protocol the
//! server uses: `GET` and `POST` with a text body, responses framed either
//! by `Content-Length` or with `Transfer-Encoding: chunked`, and keep-alive
//! connections. There is no TLS, no HTTP/2 and no pipelining.
//!
//! The client owns exactly one connection. Everything is done on the
//! caller's thread, the only points that block are socket reads and
//! writes, which are bounded by the timeouts in `Config`.
//!

mod body;
mod config;
mod connection;
mod error;
mod head;
mod line;
mod parser;
mod request;

/// Size of the buffer used for status and header lines
pub const LINE_BUFFER_SIZE: usize = 8192;
/// This is not "enough for everyone" but we probably need some limit anyway.
/// Chunk size lines, including extensions, and trailer lines are limited
/// by this value
pub const MAX_CHUNK_HEAD: usize = 4096;

pub use self::body::{Body, FixedBody, ChunkedBody};
pub use self::config::Config;
pub use self::connection::{Connection, Response, Phase};
pub use self::error::{ClientError, ErrorKind};
pub use self::head::Head;
pub use self::line::LineReader;
pub use self::parser::{read_head, read_status, read_headers};
pub use self::request::{Request, Encoder, Credentials, Method};
