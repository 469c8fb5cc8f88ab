use std::fmt::{self, Display};

/// Represents a version of the HTTP protocol.
///
/// Only HTTP/1.x is spoken by the client. HTTP/0.9 is only of historic
/// importance and HTTP/2 would need a different transport altogether.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Version {
    /// HTTP/1.0 protocol version.
    Http10,
    /// HTTP/1.1 protocol version as described in RFC7230 and others.
    Http11,
}

impl Version {
    /// Parses the version token of a status line
    pub fn parse(token: &str) -> Option<Version> {
        match token {
            "HTTP/1.0" => Some(Version::Http10),
            "HTTP/1.1" => Some(Version::Http11),
            _ => None,
        }
    }

    /// Whether connections are persistent unless told otherwise
    pub fn keep_alive_by_default(&self) -> bool {
        *self == Version::Http11
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use shared::Version::*;
        f.write_str(match *self {
            Http10 => "HTTP/1.0",
            Http11 => "HTTP/1.1",
        })
    }
}
