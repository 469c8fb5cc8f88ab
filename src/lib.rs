//! Client for the httpsqs queue service
//!
//! The `client` module is a small hand-written HTTP/1.1 transport with
//! keep-alive support. The `queue` module builds on it and exposes the
//! queue operations with the error conventions of the httpsqs server.

extern crate base64;
extern crate encoding_rs;
extern crate net2;
extern crate percent_encoding;
#[macro_use] extern crate log;
#[macro_use] extern crate quick_error;
#[macro_use] extern crate matches;
#[cfg(test)] extern crate httparse;

pub mod client;
pub mod queue;
mod shared;

pub use shared::{BodyKind, Charset, Version};
pub use client::{Config, Connection, ClientError, ErrorKind, Credentials};
pub use queue::{Client, Message};
