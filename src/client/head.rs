use shared::{BodyKind, Charset, Version};


/// Status line and headers of a successful response
///
/// Only `200` responses make it this far, everything else is reported as
/// `ClientError::UnexpectedStatus` by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Head {
    pub version: Version,
    pub code: u16,
    pub reason: String,
    /// All header lines as `(name, value)` in the order received
    pub headers: Vec<(String, String)>,
    pub content_length: Option<u64>,
    /// Whether the connection may be reused after the body is read
    pub keep_alive: bool,
    /// Charset the body is decoded with
    pub charset: Charset,
    pub body_kind: BodyKind,
}

impl Head {
    /// Value of the first header with the name, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|&&(ref n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, ref v)| &v[..])
    }
    /// Queue position reported by the `Pos` header
    pub fn pos(&self) -> Option<i64> {
        self.header("Pos").and_then(|x| x.parse().ok())
    }
}
