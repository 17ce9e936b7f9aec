// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Minimal HTTP/0.9, HTTP/1.0, and HTTP/1.1 transport (C2): just enough of the
// protocol to carry IPP POST bodies and serve the printer's icon and admin
// page. No persistent-connection pooling beyond keep-alive on one socket.

use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

/// Time allowed to read a full request once its first byte has arrived.
pub const OVERALL_READ_TIMEOUT: Duration = Duration::from_secs(30);
/// Time a keep-alive connection may sit idle before the next request starts.
pub const KEEP_ALIVE_IDLE_TIMEOUT: Duration = Duration::from_secs(10);
/// Request bodies larger than this are rejected (spec.md §8, entity-too-large).
pub const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Options,
    Post,
}

impl Method {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::Get),
            "HEAD" => Some(Method::Head),
            "OPTIONS" => Some(Method::Options),
            "POST" => Some(Method::Post),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HttpError {
    #[error("idle timeout waiting for next request")]
    IdleTimeout,
    #[error("timed out reading request")]
    ReadTimeout,
    #[error("malformed request line")]
    BadRequestLine,
    #[error("malformed header")]
    BadHeader,
    #[error("unknown or unsupported method")]
    UnknownMethod,
    #[error("request body exceeds the configured limit")]
    EntityTooLarge,
    #[error("negative or missing Content-Length on a request with a body")]
    BadContentLength,
    #[error("malformed chunked transfer encoding")]
    BadChunkedEncoding,
    #[error("Connection: Upgrade is not supported")]
    UpgradeNotSupported,
    #[error("peer closed the connection")]
    ConnectionClosed,
}

/// A parsed request line plus headers, before the body is read. Splitting
/// this from body-reading lets the caller answer `Expect: 100-continue`
/// between the two (spec.md §4.2).
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    /// Path only — an absolute-form target has already had its scheme and
    /// authority stripped.
    pub path: String,
    pub version: (u8, u8),
    pub headers: Vec<(String, String)>,
}

impl RequestHead {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn expects_continue(&self) -> bool {
        self.header("expect").is_some_and(|v| v.eq_ignore_ascii_case("100-continue"))
    }

    pub fn wants_upgrade(&self) -> bool {
        self.header("connection").is_some_and(|v| v.eq_ignore_ascii_case("upgrade"))
    }

    /// HTTP/1.1 defaults to keep-alive; HTTP/1.0 defaults to close. Either
    /// way an explicit `Connection` header overrides the default.
    pub fn keep_alive(&self) -> bool {
        match self.header("connection") {
            Some(v) if v.eq_ignore_ascii_case("close") => false,
            Some(v) if v.eq_ignore_ascii_case("keep-alive") => true,
            _ => self.version >= (1, 1),
        }
    }

    fn content_length(&self) -> Result<Option<usize>, HttpError> {
        match self.header("content-length") {
            None => Ok(None),
            Some(v) => v.trim().parse::<i64>().ok().filter(|n| *n >= 0).map(|n| Some(n as usize)).ok_or(HttpError::BadContentLength),
        }
    }

    fn is_chunked(&self) -> bool {
        self.header("transfer-encoding").is_some_and(|v| v.eq_ignore_ascii_case("chunked"))
    }
}

pub struct Request {
    pub head: RequestHead,
    pub body: Vec<u8>,
}

fn strip_authority(target: &str) -> String {
    if let Some(rest) = target.strip_prefix("http://").or_else(|| target.strip_prefix("ipp://")) {
        match rest.find('/') {
            Some(idx) => rest[idx..].to_string(),
            None => "/".to_string(),
        }
    } else {
        target.to_string()
    }
}

async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Option<String>, HttpError> {
    let mut line = String::new();
    let n = reader.read_line(&mut line).await.map_err(|_| HttpError::ConnectionClosed)?;
    if n == 0 {
        return Ok(None);
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(Some(line))
}

fn parse_request_line(line: &str) -> Result<(Method, String, (u8, u8)), HttpError> {
    let mut parts = line.split(' ');
    let method = parts.next().ok_or(HttpError::BadRequestLine)?;
    let target = parts.next().ok_or(HttpError::BadRequestLine)?;
    let method = Method::parse(method).ok_or(HttpError::UnknownMethod)?;

    let version = match parts.next() {
        None => (0, 9), // HTTP/0.9: no version token, no headers, no body.
        Some(v) => {
            let v = v.strip_prefix("HTTP/").ok_or(HttpError::BadRequestLine)?;
            let (major, minor) = v.split_once('.').ok_or(HttpError::BadRequestLine)?;
            (
                major.parse().map_err(|_| HttpError::BadRequestLine)?,
                minor.parse().map_err(|_| HttpError::BadRequestLine)?,
            )
        }
    };
    Ok((method, strip_authority(target), version))
}

/// Read one request's head, honoring the keep-alive idle timeout before the
/// first byte and the overall read timeout thereafter. `Ok(None)` means the
/// connection is idle-closed or the peer hung up cleanly between requests.
pub async fn read_request_head<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    is_first_on_connection: bool,
) -> Result<Option<RequestHead>, HttpError> {
    let idle = if is_first_on_connection { OVERALL_READ_TIMEOUT } else { KEEP_ALIVE_IDLE_TIMEOUT };
    let line = match timeout(idle, read_line(reader)).await {
        Ok(result) => result?,
        Err(_) => return Err(HttpError::IdleTimeout),
    };
    let Some(line) = line else { return Ok(None) };
    if line.is_empty() {
        return Ok(None);
    }

    timeout(OVERALL_READ_TIMEOUT, async {
        let (method, path, version) = parse_request_line(&line)?;
        let mut headers = Vec::new();
        if version != (0, 9) {
            loop {
                let Some(header_line) = read_line(reader).await? else {
                    return Err(HttpError::ConnectionClosed);
                };
                if header_line.is_empty() {
                    break;
                }
                let (name, value) = header_line.split_once(':').ok_or(HttpError::BadHeader)?;
                headers.push((name.trim().to_string(), value.trim().to_string()));
            }
        }
        Ok(Some(RequestHead { method, path, version, headers }))
    })
    .await
    .map_err(|_| HttpError::ReadTimeout)?
}

async fn read_chunked_body<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, HttpError> {
    let mut body = Vec::new();
    loop {
        let size_line = read_line(reader).await?.ok_or(HttpError::ConnectionClosed)?;
        let size_str = size_line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_str, 16).map_err(|_| HttpError::BadChunkedEncoding)?;
        if size == 0 {
            // Consume the trailer section up to the blank line; no trailer
            // headers are meaningful to this server.
            loop {
                let line = read_line(reader).await?.ok_or(HttpError::ConnectionClosed)?;
                if line.is_empty() {
                    break;
                }
            }
            break;
        }
        if body.len() + size > MAX_BODY_BYTES {
            return Err(HttpError::EntityTooLarge);
        }
        let mut chunk = vec![0u8; size];
        tokio::io::AsyncReadExt::read_exact(reader, &mut chunk)
            .await
            .map_err(|_| HttpError::ConnectionClosed)?;
        body.extend_from_slice(&chunk);
        let mut crlf = [0u8; 2];
        tokio::io::AsyncReadExt::read_exact(reader, &mut crlf)
            .await
            .map_err(|_| HttpError::ConnectionClosed)?;
    }
    Ok(body)
}

/// Read a request's body per its head's framing (Content-Length or chunked).
/// Call after answering any `Expect: 100-continue`.
pub async fn read_request_body<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    head: &RequestHead,
) -> Result<Vec<u8>, HttpError> {
    if head.version == (0, 9) {
        return Ok(Vec::new());
    }
    timeout(OVERALL_READ_TIMEOUT, async {
        if head.is_chunked() {
            return read_chunked_body(reader).await;
        }
        let len = match head.content_length()? {
            Some(len) => len,
            None => {
                if head.method == Method::Post {
                    return Err(HttpError::BadContentLength);
                }
                0
            }
        };
        if len > MAX_BODY_BYTES {
            return Err(HttpError::EntityTooLarge);
        }
        let mut body = vec![0u8; len];
        tokio::io::AsyncReadExt::read_exact(reader, &mut body)
            .await
            .map_err(|_| HttpError::ConnectionClosed)?;
        Ok(body)
    })
    .await
    .map_err(|_| HttpError::ReadTimeout)?
}

pub struct ResponseHead {
    pub status: u16,
    pub reason: &'static str,
    pub headers: Vec<(String, String)>,
}

fn rfc1123_date() -> String {
    chrono::Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Write a full response (status line, headers, body) for HTTP/1.0+.
/// HTTP/0.9 clients get only the raw body (no status line, no headers).
pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    version: (u8, u8),
    mut head: ResponseHead,
    body: &[u8],
) -> Result<(), HttpError> {
    if version == (0, 9) {
        writer.write_all(body).await.map_err(|_| HttpError::ConnectionClosed)?;
        return Ok(());
    }

    head.headers.push(("Date".to_string(), rfc1123_date()));
    head.headers.push(("Content-Length".to_string(), body.len().to_string()));

    let mut out = format!("HTTP/{}.{} {} {}\r\n", version.0, version.1, head.status, head.reason);
    for (name, value) in &head.headers {
        out.push_str(&format!("{name}: {value}\r\n"));
    }
    out.push_str("\r\n");

    writer.write_all(out.as_bytes()).await.map_err(|_| HttpError::ConnectionClosed)?;
    writer.write_all(body).await.map_err(|_| HttpError::ConnectionClosed)?;
    writer.flush().await.map_err(|_| HttpError::ConnectionClosed)?;
    Ok(())
}

pub async fn write_100_continue<W: AsyncWrite + Unpin>(writer: &mut W) -> Result<(), HttpError> {
    writer
        .write_all(b"HTTP/1.1 100 Continue\r\n\r\n")
        .await
        .map_err(|_| HttpError::ConnectionClosed)?;
    writer.flush().await.map_err(|_| HttpError::ConnectionClosed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[test]
    fn strips_absolute_form_target_authority() {
        assert_eq!(strip_authority("ipp://host:631/ipp/print"), "/ipp/print");
        assert_eq!(strip_authority("/ipp/print"), "/ipp/print");
    }

    #[tokio::test]
    async fn parses_a_simple_get_request() {
        let raw = b"GET /icon.png HTTP/1.1\r\nHost: localhost\r\n\r\n".to_vec();
        let mut reader = BufReader::new(&raw[..]);
        let head = read_request_head(&mut reader, true).await.unwrap().unwrap();
        assert_eq!(head.method, Method::Get);
        assert_eq!(head.path, "/icon.png");
        assert_eq!(head.version, (1, 1));
        assert!(head.keep_alive());
    }

    #[tokio::test]
    async fn http_1_0_defaults_to_close() {
        let raw = b"GET / HTTP/1.0\r\n\r\n".to_vec();
        let mut reader = BufReader::new(&raw[..]);
        let head = read_request_head(&mut reader, true).await.unwrap().unwrap();
        assert!(!head.keep_alive());
    }

    #[tokio::test]
    async fn explicit_connection_close_overrides_1_1_default() {
        let raw = b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n".to_vec();
        let mut reader = BufReader::new(&raw[..]);
        let head = read_request_head(&mut reader, true).await.unwrap().unwrap();
        assert!(!head.keep_alive());
    }

    #[tokio::test]
    async fn reads_content_length_body() {
        let raw = b"POST /ipp HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello".to_vec();
        let mut reader = BufReader::new(&raw[..]);
        let head = read_request_head(&mut reader, true).await.unwrap().unwrap();
        let body = read_request_body(&mut reader, &head).await.unwrap();
        assert_eq!(body, b"hello");
    }

    #[tokio::test]
    async fn post_without_content_length_is_bad_request() {
        let raw = b"POST /ipp HTTP/1.1\r\n\r\n".to_vec();
        let mut reader = BufReader::new(&raw[..]);
        let head = read_request_head(&mut reader, true).await.unwrap().unwrap();
        let err = read_request_body(&mut reader, &head).await.unwrap_err();
        assert_eq!(err, HttpError::BadContentLength);
    }

    #[tokio::test]
    async fn reads_chunked_body() {
        let raw = b"POST /ipp HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n".to_vec();
        let mut reader = BufReader::new(&raw[..]);
        let head = read_request_head(&mut reader, true).await.unwrap().unwrap();
        let body = read_request_body(&mut reader, &head).await.unwrap();
        assert_eq!(body, b"hello");
    }

    #[tokio::test]
    async fn unknown_method_is_rejected() {
        let raw = b"FROB / HTTP/1.1\r\n\r\n".to_vec();
        let mut reader = BufReader::new(&raw[..]);
        let err = read_request_head(&mut reader, true).await.unwrap_err();
        assert_eq!(err, HttpError::UnknownMethod);
    }

    #[tokio::test]
    async fn empty_stream_is_a_clean_close() {
        let raw: Vec<u8> = Vec::new();
        let mut reader = BufReader::new(&raw[..]);
        let head = read_request_head(&mut reader, true).await.unwrap();
        assert!(head.is_none());
    }

    #[tokio::test]
    async fn connection_upgrade_is_flagged() {
        let raw = b"GET / HTTP/1.1\r\nConnection: Upgrade\r\n\r\n".to_vec();
        let mut reader = BufReader::new(&raw[..]);
        let head = read_request_head(&mut reader, true).await.unwrap().unwrap();
        assert!(head.wants_upgrade());
    }

    #[tokio::test]
    async fn writes_a_response_with_headers_and_body() {
        let mut buf = Vec::new();
        let head = ResponseHead {
            status: 200,
            reason: "OK",
            headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
        };
        write_response(&mut buf, (1, 1), head, b"hi").await.unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Length: 2\r\n"));
        assert!(text.ends_with("hi"));
    }
}
