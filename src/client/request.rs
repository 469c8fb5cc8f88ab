use std::fmt::{self, Display};
use std::io::{self, Write};

use base64;

use shared::Charset;
use super::ClientError;


/// Request method, derived from the presence of a body
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Method::Get => "GET",
            Method::Post => "POST",
        })
    }
}

/// User name and password for `Authorization: Basic`
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub pass: String,
}

impl Credentials {
    pub fn new<U: Into<String>, P: Into<String>>(user: U, pass: P)
        -> Credentials
    {
        Credentials { user: user.into(), pass: pass.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("pass", &"..")
            .finish()
    }
}

/// A fully encoded request ready to be written to the socket
///
/// Header names are unique (case-insensitively) and are written in the
/// order they were first set.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl Request {
    /// Creates a request, `POST` if there is a body and `GET` otherwise
    pub fn new(path: &str, body: Option<Vec<u8>>) -> Request {
        Request {
            method: if body.is_some() { Method::Post } else { Method::Get },
            path: path.to_string(),
            headers: Vec::new(),
            body: body,
        }
    }
    pub fn method(&self) -> Method {
        self.method
    }
    pub fn path(&self) -> &str {
        &self.path
    }
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_ref().map(|x| &x[..])
    }
    /// Sets header, replacing the value in place if it's already set
    pub fn set_header<V: Into<String>>(&mut self, name: &str, value: V) {
        let value = value.into();
        for &mut (ref n, ref mut v) in self.headers.iter_mut() {
            if n.eq_ignore_ascii_case(name) {
                *v = value;
                return;
            }
        }
        self.headers.push((name.to_string(), value));
    }
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|&&(ref n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, ref v)| &v[..])
    }
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
    /// Serializes the request line, headers and body
    ///
    /// The text of the head is encoded with `charset`, so it fails if the
    /// path or any header can't be represented in it.
    pub fn to_bytes(&self, charset: Charset) -> Result<Vec<u8>, ClientError> {
        let mut head = format!("{} {} HTTP/1.1\r\n", self.method, self.path);
        for &(ref name, ref value) in &self.headers {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");
        let mut buf = charset.encode(&head)?.into_owned();
        if let Some(ref body) = self.body {
            buf.extend_from_slice(body);
        }
        Ok(buf)
    }
    /// Writes the encoded request and flushes the sink
    pub fn write_to<W: Write>(&self, out: &mut W, charset: Charset)
        -> Result<(), ClientError>
    {
        let bytes = self.to_bytes(charset)?;
        write_all(out, &bytes)?;
        Ok(())
    }
}

fn write_all<W: Write>(out: &mut W, bytes: &[u8]) -> io::Result<()> {
    out.write_all(bytes)?;
    out.flush()
}

/// Builds requests with the fixed set of headers the queue service expects
#[derive(Debug, Clone)]
pub struct Encoder<'a> {
    pub user_agent: &'a str,
    /// `host` or `host:port`, the port is omitted when it's 80
    pub host: &'a str,
    pub charset: Charset,
}

/// Formats value of the `Host` header
pub fn host_header(host: &str, port: u16) -> String {
    if port == 80 {
        host.to_string()
    } else {
        format!("{}:{}", host, port)
    }
}

impl<'a> Encoder<'a> {
    /// Encodes the body and credentials with the charset of the encoder
    ///
    /// Fails with `MalformedRequest` when inputs can't be represented in
    /// the charset. No I/O is done here.
    pub fn encode(&self, path: &str, body: Option<&str>,
        credentials: Option<&Credentials>)
        -> Result<Request, ClientError>
    {
        let body = match body {
            Some(text) => Some(self.charset.encode(text)?.into_owned()),
            None => None,
        };
        let body_len = body.as_ref().map(|x| x.len());
        let mut req = Request::new(path, body);
        req.set_header("User-Agent", self.user_agent);
        req.set_header("Host", self.host);
        req.set_header("Connection", "keep-alive");
        req.set_header("Content-Type",
            format!("text/plain;charset={}", self.charset));
        if let Some(cred) = credentials {
            let pair = format!("{}:{}", cred.user, cred.pass);
            let raw = self.charset.encode(&pair)?;
            req.set_header("Authorization",
                format!("Basic {}", base64::encode(&raw[..])));
        }
        if let Some(len) = body_len {
            req.set_header("Content-Length", len.to_string());
        }
        Ok(req)
    }
}
