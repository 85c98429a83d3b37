// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tokio::net::TcpListener;

async fn parse(raw: &str) -> Result<Response, HttpError> {
    let mut reader = BufReader::new(raw.as_bytes());
    read_response(&mut reader).await
}

#[tokio::test]
async fn reads_content_length_body() {
    let response =
        parse("HTTP/1.1 200 OK\r\nContent-Length: 5\r\nX-Etcd-Index: 42\r\n\r\nhelloEXTRA").await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, "hello");
    assert_eq!(response.header("x-etcd-index"), Some("42"));
    assert_eq!(response.header("X-ETCD-INDEX"), Some("42"));
    assert!(response.is_success());
}

#[tokio::test]
async fn reads_chunked_body_with_extensions_and_trailers() {
    let raw = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
               4\r\n{\"a\"\r\n\
               3;ext=1\r\n:1}\r\n\
               0\r\nX-Trailer: yes\r\n\r\n";
    let response = parse(raw).await.unwrap();
    assert_eq!(response.body, "{\"a\":1}");
}

#[tokio::test]
async fn reads_close_delimited_body() {
    let response = parse("HTTP/1.0 404 Not Found\r\n\r\nno such container").await.unwrap();
    assert_eq!(response.status, 404);
    assert_eq!(response.body, "no such container");
    assert!(!response.is_success());
}

#[yare::parameterized(
    no_content   = { 204 },
    not_modified = { 304 },
)]
fn bodyless_statuses_skip_body(status: u16) {
    let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let raw = format!("HTTP/1.1 {status} X\r\n\r\nignored");
    let response = rt.block_on(parse(&raw)).unwrap();
    assert_eq!(response.status, status);
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn rejects_garbage_status_line() {
    assert!(matches!(parse("garbage\r\n\r\n").await, Err(HttpError::Malformed(_))));
    assert!(matches!(parse("").await, Err(HttpError::Malformed(_))));
}

#[tokio::test]
async fn rejects_bad_chunk_size() {
    let raw = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\n";
    assert!(matches!(parse(raw).await, Err(HttpError::Malformed(_))));
}

#[test]
fn formats_requests_with_and_without_body() {
    let get = format_request("GET", "/v2/keys/app", "etcd", None);
    assert_eq!(get, "GET /v2/keys/app HTTP/1.1\r\nHost: etcd\r\nConnection: close\r\n\r\n");

    let post = format_request("POST", "/containers/create", "docker", Some("{}"));
    assert!(post.starts_with("POST /containers/create HTTP/1.1\r\n"));
    assert!(post.contains("Content-Length: 2\r\n"));
    assert!(post.ends_with("\r\n\r\n{}"));
}

#[tokio::test]
async fn sends_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut reader = BufReader::new(&mut socket);
        let mut request_line = String::new();
        reader.read_line(&mut request_line).await.unwrap();
        socket.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok").await.unwrap();
        request_line
    });

    let stream = connect_tcp(&addr).await.unwrap();
    let request = format_request("GET", "/ping", "test", None);
    let response = send(stream, &request).await.unwrap();

    assert_eq!(response.body, "ok");
    assert_eq!(server.await.unwrap(), "GET /ping HTTP/1.1\r\n");
}

#[tokio::test]
async fn connect_failure_names_the_address() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let err = connect_tcp(&addr).await.unwrap_err();
    assert!(matches!(err, HttpError::Connect { .. }));
    assert!(err.to_string().contains(&addr));
}

#[tokio::test]
async fn timed_gives_up() {
    let result = timed(Duration::from_millis(10), async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        parse("HTTP/1.1 200 OK\r\n\r\n").await
    })
    .await;
    assert!(matches!(result, Err(HttpError::Timeout(_))));
}
