use std::io::{Read, BufReader};

use shared::{BodyKind, Charset, Version};
use shared::headers;
use super::{ClientError, Head};
use super::line::LineReader;


/// Splits off the next whitespace-delimited token
fn next_token(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    if text.is_empty() {
        return None;
    }
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    Some((&text[..end], &text[end..]))
}

/// Parses `version code reason` and rejects anything but `200`
pub fn parse_status_line(line: &str)
    -> Result<(Version, u16, String), ClientError>
{
    let bad = || ClientError::BadStatusLine(line.to_string());
    let (version, tail) = next_token(line).ok_or_else(&bad)?;
    let (code, tail) = next_token(tail).ok_or_else(&bad)?;
    let reason = tail.trim().to_string();
    if code != "200" {
        return Err(ClientError::UnexpectedStatus(code.to_string(), reason));
    }
    let version = Version::parse(version)
        .ok_or_else(|| ClientError::BadVersion(version.to_string()))?;
    Ok((version, 200, reason))
}

/// Reads the status line, fails for anything but `200`
pub fn read_status<R: Read>(input: &mut BufReader<R>, lines: &mut LineReader,
    charset: Charset)
    -> Result<(Version, u16, String), ClientError>
{
    let status = charset.decode(lines.read_line(input)?).into_owned();
    if status.is_empty() && lines.hit_eof() {
        return Err(ClientError::ConnectionClosed);
    }
    parse_status_line(&status)
}

/// Reads header lines up to the empty line and makes the framing decision
///
/// Nothing past the empty line is consumed, so the input is positioned at
/// the first byte of the body. `charset` is used for decoding header text
/// until a `Content-Type` with a `charset` parameter replaces it.
pub fn read_headers<R: Read>(input: &mut BufReader<R>,
    lines: &mut LineReader, charset: Charset,
    (version, code, reason): (Version, u16, String))
    -> Result<Head, ClientError>
{
    let mut charset = charset;
    let mut keep_alive = version.keep_alive_by_default();
    let mut content_length = None;
    let mut header_list = Vec::new();
    loop {
        let line = charset.decode(lines.read_line(input)?).into_owned();
        if line.is_empty() {
            if lines.hit_eof() {
                return Err(ClientError::PrematureEof);
            }
            break;
        }
        if headers::is_content_length(&line) {
            content_length = headers::value(&line).parse::<u64>().ok();
        } else if headers::is_connection(&line) {
            keep_alive = headers::has_keep_alive(headers::value(&line));
        } else if headers::is_content_type(&line) {
            if let Some(label) = headers::charset_param(headers::value(&line)) {
                charset = Charset::from_label(label).map_err(|_| {
                    ClientError::ResponseCharset(label.to_string())
                })?;
            }
        }
        if let Some((name, value)) = headers::split(&line) {
            header_list.push((name.to_string(), value.to_string()));
        }
    }
    Ok(Head {
        version: version,
        code: code,
        reason: reason,
        headers: header_list,
        content_length: content_length,
        keep_alive: keep_alive,
        charset: charset,
        body_kind: BodyKind::from_content_length(content_length),
    })
}

/// Reads the status line and headers of a response
pub fn read_head<R: Read>(input: &mut BufReader<R>, lines: &mut LineReader,
    charset: Charset)
    -> Result<Head, ClientError>
{
    let status = read_status(input, lines, charset)?;
    read_headers(input, lines, charset, status)
}
