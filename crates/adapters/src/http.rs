// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal HTTP/1.1 client shared by the etcd and Docker adapters.
//!
//! One request per connection (`Connection: close`). The transport is any
//! async byte stream: TCP for etcd, the Unix socket for Docker. Response
//! bodies are framed by Content-Length, chunked transfer encoding, or
//! connection close.

#[cfg(unix)]
use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
#[cfg(unix)]
use tokio::net::UnixStream;

/// Transport-level HTTP failures.
///
/// Non-2xx statuses are not errors here; callers map them.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

/// A fully read HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    /// Header names are lowercased.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Response {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers.iter().find(|(k, _)| *k == name).map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Serialize a request with an optional JSON body.
pub fn format_request(method: &str, path: &str, host: &str, body: Option<&str>) -> String {
    match body {
        Some(body) => format!(
            "{method} {path} HTTP/1.1\r\nHost: {host}\r\nConnection: close\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        ),
        None => format!("{method} {path} HTTP/1.1\r\nHost: {host}\r\nConnection: close\r\n\r\n"),
    }
}

pub async fn connect_tcp(addr: &str) -> Result<TcpStream, HttpError> {
    TcpStream::connect(addr)
        .await
        .map_err(|source| HttpError::Connect { addr: addr.to_string(), source })
}

#[cfg(unix)]
pub async fn connect_unix(path: &Path) -> Result<UnixStream, HttpError> {
    UnixStream::connect(path)
        .await
        .map_err(|source| HttpError::Connect { addr: path.display().to_string(), source })
}

/// Write `request` to `stream` and read the response.
pub async fn send<S>(mut stream: S, request: &str) -> Result<Response, HttpError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(request.as_bytes()).await?;
    stream.flush().await?;
    let mut reader = BufReader::new(stream);
    read_response(&mut reader).await
}

/// Bound `fut` by `limit`.
pub async fn timed<F>(limit: Duration, fut: F) -> Result<Response, HttpError>
where
    F: std::future::Future<Output = Result<Response, HttpError>>,
{
    tokio::time::timeout(limit, fut).await.map_err(|_| HttpError::Timeout(limit))?
}

/// Read and parse an HTTP/1.1 response from a buffered stream.
pub async fn read_response<R: AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
) -> Result<Response, HttpError> {
    let mut status_line = String::new();
    if reader.read_line(&mut status_line).await? == 0 {
        return Err(HttpError::Malformed("connection closed before status line".into()));
    }
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or_else(|| HttpError::Malformed(format!("bad status line {:?}", status_line.trim())))?;

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Err(HttpError::Malformed("connection closed inside headers".into()));
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }

    let mut response = Response { status, headers, body: String::new() };

    // 1xx, 204 and 304 carry no body
    if status < 200 || status == 204 || status == 304 {
        return Ok(response);
    }

    let chunked = response
        .header("transfer-encoding")
        .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"));
    let content_length = response.header("content-length").and_then(|v| v.parse::<usize>().ok());

    let body = if chunked {
        read_chunked(reader).await?
    } else if let Some(len) = content_length {
        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf).await?;
        buf
    } else {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        buf
    };
    response.body = String::from_utf8_lossy(&body).into_owned();
    Ok(response)
}

async fn read_chunked<R: AsyncRead + Unpin>(reader: &mut BufReader<R>) -> Result<Vec<u8>, HttpError> {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        if reader.read_line(&mut size_line).await? == 0 {
            return Err(HttpError::Malformed("connection closed inside chunked body".into()));
        }
        // Chunk extensions follow a ';'
        let size_field = size_line.trim().split(';').next().unwrap_or_default();
        let size = usize::from_str_radix(size_field.trim(), 16)
            .map_err(|_| HttpError::Malformed(format!("bad chunk size {:?}", size_line.trim())))?;

        if size == 0 {
            // Skip trailers up to the terminating blank line
            loop {
                let mut trailer = String::new();
                let n = reader.read_line(&mut trailer).await?;
                if n == 0 || trailer.trim_end_matches(['\r', '\n']).is_empty() {
                    return Ok(body);
                }
            }
        }

        let mut chunk = vec![0u8; size];
        reader.read_exact(&mut chunk).await?;
        body.extend_from_slice(&chunk);

        let mut crlf = String::new();
        reader.read_line(&mut crlf).await?;
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
