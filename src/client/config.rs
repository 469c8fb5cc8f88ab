use std::time::Duration;

use shared::Charset;


/// Settings of a client connection
///
/// A zero timeout means the operation never times out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Charset of request bodies, also the initial charset of responses
    pub charset: Charset,
    /// Time to wait for the connection to be established
    pub connect_timeout: Duration,
    /// Time any single socket read may block
    pub read_timeout: Duration,
    pub user_agent: String,
}

impl Config {
    pub fn new<S: Into<String>>(host: S, port: u16) -> Config {
        Config {
            host: host.into(),
            port: port,
            charset: Charset::utf8(),
            connect_timeout: Duration::new(15, 0),
            read_timeout: Duration::new(120, 0),
            user_agent: concat!("httpsqs-client/",
                                env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
    pub fn charset(mut self, charset: Charset) -> Config {
        self.charset = charset;
        self
    }
    pub fn connect_timeout(mut self, timeout: Duration) -> Config {
        self.connect_timeout = timeout;
        self
    }
    pub fn read_timeout(mut self, timeout: Duration) -> Config {
        self.read_timeout = timeout;
        self
    }
    pub fn user_agent<S: Into<String>>(mut self, agent: S) -> Config {
        self.user_agent = agent.into();
        self
    }
    /// The `host:port` pair to connect to
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
