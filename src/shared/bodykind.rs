/// The body kind of an HTTP response.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BodyKind {
    /// A fixed body length set by the `Content-Length` header.
    /// Messages without a body have the value `Fixed(0)`.
    Fixed(u64),
    /// Any response without a usable `Content-Length` is read as
    /// `Transfer-Encoding: chunked`.
    Chunked,
}

impl BodyKind {
    /// Framing decision: a parsed content length wins, otherwise chunked
    pub fn from_content_length(len: Option<u64>) -> BodyKind {
        match len {
            Some(x) => BodyKind::Fixed(x),
            None => BodyKind::Chunked,
        }
    }
}
