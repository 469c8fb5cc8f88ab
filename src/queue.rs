//! Operations of the httpsqs queue service
//!
//! Every operation returns the text the server replied with. Failures of
//! any kind are returned as text too, prefixed with `HTTPSQS_ERROR:`, so
//! callers compare the result against the sentinel constants below or
//! check it with `is_error`.

use percent_encoding::{percent_encode, AsciiSet, NON_ALPHANUMERIC};

use shared::Charset;
use client::{ClientError, Config, Connection, Credentials};


pub const ERROR_PREFIX: &'static str = "HTTPSQS_ERROR";

pub const PUT_OK: &'static str = "HTTPSQS_PUT_OK";
pub const PUT_ERROR: &'static str = "HTTPSQS_PUT_ERROR";
pub const PUT_END: &'static str = "HTTPSQS_PUT_END";
pub const GET_END: &'static str = "HTTPSQS_GET_END";
pub const AUTH_FAILED: &'static str = "HTTPSQS_AUTH_FAILED";
pub const ERROR_NOFOUND: &'static str = "HTTPSQS_ERROR_NOFOUND";
pub const RESET_OK: &'static str = "HTTPSQS_RESET_OK";
pub const MAXQUEUE_OK: &'static str = "HTTPSQS_MAXQUEUE_OK";
pub const SYNCTIME_OK: &'static str = "HTTPSQS_SYNCTIME_OK";
pub const FLUSH_OK: &'static str = "HTTPSQS_FLUSH_OK";

// unreserved characters of RFC 3986 plus `*`, like form encoding does
const QUERY_VALUE: &'static AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'*');

/// True if the reply is an error, either from the server or the client
///
/// Note that `ERROR_NOFOUND` is an error too.
pub fn is_error(reply: &str) -> bool {
    reply.starts_with(ERROR_PREFIX)
}

fn error_reply(err: &ClientError) -> String {
    format!("{}:{}", ERROR_PREFIX, err)
}

/// Reply together with the queue position from the `Pos` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Position of the message in the queue, `-1` if unknown
    pub pos: i64,
    pub msg: String,
}

impl Message {
    fn error(err: &ClientError) -> Message {
        Message { pos: -1, msg: error_reply(err) }
    }
}

/// Builds `/?key=value&...` paths
struct Query {
    path: String,
    charset: Charset,
}

impl Query {
    fn new(charset: Charset) -> Query {
        Query { path: String::from("/?"), charset: charset }
    }
    fn sep(&mut self, key: &str) {
        if self.path.len() > 2 {
            self.path.push('&');
        }
        self.path.push_str(key);
        self.path.push('=');
    }
    /// Appends a value that needs no escaping
    fn raw<V: ToString>(mut self, key: &str, value: V) -> Query {
        self.sep(key);
        self.path.push_str(&value.to_string());
        self
    }
    /// Appends a value percent-encoded in the charset of the query
    fn text(mut self, key: &str, value: &str) -> Result<Query, ClientError> {
        let bytes = self.charset.encode(value)?;
        self.sep(key);
        self.path.extend(percent_encode(&bytes, QUERY_VALUE));
        Ok(self)
    }
    fn auth(self, auth: Option<&str>) -> Result<Query, ClientError> {
        match auth {
            Some(value) => self.text("auth", value),
            None => Ok(self),
        }
    }
    fn finish(self) -> String {
        self.path
    }
}

/// Client of a single httpsqs server
///
/// Holds one keep-alive connection, see `Connection` for the details of
/// reconnection and error handling.
pub struct Client {
    conn: Connection,
}

impl Client {
    pub fn new(config: Config) -> Client {
        Client { conn: Connection::new(config) }
    }
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
    /// Connects in advance
    ///
    /// Errors are only logged, the next operation tries to connect again.
    pub fn open(&mut self) {
        if let Err(e) = self.conn.open() {
            warn!("can't connect to {}: {}", self.conn.config().address(), e);
            self.conn.close();
        }
    }
    pub fn close(&mut self) {
        self.conn.close();
    }

    fn query(&self, name: &str, opt: &str) -> Result<Query, ClientError> {
        Ok(Query::new(self.conn.charset()).text("name", name)?.raw("opt", opt))
    }

    fn charset_query(&self, name: &str, opt: &str)
        -> Result<Query, ClientError>
    {
        let charset = self.conn.charset();
        Ok(Query::new(charset)
            .raw("charset", charset.label())
            .text("name", name)?
            .raw("opt", opt))
    }

    fn call(&mut self, path: Result<String, ClientError>, body: Option<&str>,
        credentials: Option<&Credentials>)
        -> String
    {
        let conn = &mut self.conn;
        match path.and_then(|p| conn.send_request(&p, body, credentials)) {
            Ok(text) => text,
            Err(e) => {
                debug!("queue request failed: {}", e);
                error_reply(&e)
            }
        }
    }

    fn call_msg(&mut self, path: Result<String, ClientError>,
        body: Option<&str>)
        -> Message
    {
        let conn = &mut self.conn;
        match path.and_then(|p| conn.exchange(&p, body, None)) {
            Ok(resp) => Message {
                pos: resp.head.pos().unwrap_or(-1),
                msg: resp.body,
            },
            Err(e) => {
                debug!("queue request failed: {}", e);
                Message::error(&e)
            }
        }
    }

    fn put_path(&self, name: &str, auth: Option<&str>)
        -> Result<String, ClientError>
    {
        Ok(self.query(name, "put")?.auth(auth)?.finish())
    }

    fn get_path(&self, name: &str, auth: Option<&str>)
        -> Result<String, ClientError>
    {
        Ok(self.charset_query(name, "get")?.auth(auth)?.finish())
    }

    /// Appends `data` to the queue, `PUT_OK` on success
    pub fn put(&mut self, name: &str, data: &str, auth: Option<&str>)
        -> String
    {
        let path = self.put_path(name, auth);
        self.call(path, Some(data), None)
    }
    /// Same as `put` but also returns the position of the new message
    pub fn put_msg(&mut self, name: &str, data: &str, auth: Option<&str>)
        -> Message
    {
        let path = self.put_path(name, auth);
        self.call_msg(path, Some(data))
    }
    /// Takes the next message out of the queue, `GET_END` if it's empty
    pub fn get(&mut self, name: &str, auth: Option<&str>) -> String {
        let path = self.get_path(name, auth);
        self.call(path, None, None)
    }
    pub fn get_msg(&mut self, name: &str, auth: Option<&str>) -> Message {
        let path = self.get_path(name, auth);
        self.call_msg(path, None)
    }
    /// Reads message at `pos` without removing it
    pub fn view(&mut self, name: &str, pos: i64, auth: Option<&str>)
        -> String
    {
        let path = self.charset_query(name, "view")
            .map(|q| q.raw("pos", pos))
            .and_then(|q| q.auth(auth))
            .map(Query::finish);
        self.call(path, None, None)
    }
    pub fn status(&mut self, name: &str) -> String {
        let path = self.query(name, "status").map(Query::finish);
        self.call(path, None, None)
    }
    pub fn status_json(&mut self, name: &str) -> String {
        let path = self.query(name, "status_json").map(Query::finish);
        self.call(path, None, None)
    }
    pub fn reset(&mut self, name: &str, user: &str, pass: &str) -> String {
        let path = self.query(name, "reset").map(Query::finish);
        self.call(path, None, Some(&Credentials::new(user, pass)))
    }
    /// Sets the maximum number of messages in the queue
    pub fn maxqueue(&mut self, name: &str, num: u64, user: &str, pass: &str)
        -> String
    {
        let path = self.query(name, "maxqueue")
            .map(|q| q.raw("num", num).finish());
        self.call(path, None, Some(&Credentials::new(user, pass)))
    }
    /// Sets the interval in seconds of syncing the queue to disk
    pub fn synctime(&mut self, name: &str, num: u32, user: &str, pass: &str)
        -> String
    {
        let path = self.query(name, "synctime")
            .map(|q| q.raw("num", num).finish());
        self.call(path, None, Some(&Credentials::new(user, pass)))
    }
    pub fn flush(&mut self, name: &str, user: &str, pass: &str) -> String {
        let path = self.query(name, "flush").map(Query::finish);
        self.call(path, None, Some(&Credentials::new(user, pass)))
    }
}

#[cfg(test)]
mod test {
    use std::io;

    use shared::Charset;
    use client::{ClientError, Config};
    use super::{Client, Query, is_error, error_reply};
    use super::{ERROR_NOFOUND, GET_END};

    #[test]
    fn test_is_error() {
        assert!(is_error("HTTPSQS_ERROR:Connection refused"));
        assert!(is_error(ERROR_NOFOUND));
        assert!(!is_error(GET_END));
        assert!(!is_error("some message"));
    }

    #[test]
    fn test_error_reply() {
        let err = ClientError::UnexpectedStatus(
            "404".into(), "Not Found".into());
        assert_eq!(error_reply(&err),
            "HTTPSQS_ERROR:Unexpected Response from Server: 404 Not Found");
        let err = ClientError::Io(
            io::Error::new(io::ErrorKind::TimedOut, "timed out"));
        assert!(is_error(&error_reply(&err)));
        assert_eq!(error_reply(&ClientError::PrematureEof),
                   "HTTPSQS_ERROR:premature end of stream");
    }

    #[test]
    fn test_query() {
        let path = Query::new(Charset::utf8())
            .text("name", "my queue").unwrap()
            .raw("opt", "put")
            .text("auth", "a&b=c").unwrap()
            .finish();
        assert_eq!(path, "/?name=my%20queue&opt=put&auth=a%26b%3Dc");
    }

    #[test]
    fn test_query_charset() {
        let latin1 = Charset::from_label("ISO-8859-1").unwrap();
        let utf = Query::new(Charset::utf8())
            .text("name", "\u{e9}t\u{e9}").unwrap().finish();
        assert_eq!(utf, "/?name=%C3%A9t%C3%A9");
        let latin = Query::new(latin1)
            .text("name", "\u{e9}t\u{e9}").unwrap().finish();
        assert_eq!(latin, "/?name=%E9t%E9");
        match Query::new(latin1).text("name", "\u{6d4b}") {
            Err(ClientError::MalformedRequest(_)) => {}
            _ => panic!("name must not be encodable"),
        }
    }

    #[test]
    fn test_paths() {
        let client = Client::new(Config::new("127.0.0.1", 1218));
        assert_eq!(client.put_path("q1", None).unwrap(),
                   "/?name=q1&opt=put");
        assert_eq!(client.get_path("q1", Some("secret")).unwrap(),
                   "/?charset=UTF-8&name=q1&opt=get&auth=secret");
    }

    #[test]
    fn test_malformed_name() {
        let mut client = Client::new(Config::new("127.0.0.1", 1)
            .charset(Charset::from_label("ISO-8859-1").unwrap()));
        let reply = client.status("\u{6d4b}");
        assert!(is_error(&reply));
        assert!(!client.connection().is_open());
        let msg = client.get_msg("\u{6d4b}", None);
        assert_eq!(msg.pos, -1);
        assert!(is_error(&msg.msg));
    }
}
