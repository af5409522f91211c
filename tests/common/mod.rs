// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canned search backend on a local port.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;

/// Address nothing listens on
pub const DEAD_BACKEND: &str = "http://127.0.0.1:9";

fn route(target: &str) -> (u16, &'static str) {
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    match path {
        "/suggest" => (200, r#"{"suggestions": ["cat", "catalog", "category"]}"#),
        "/search" if query.contains("query=bad") => (400, r#"{"error": "Invalid query"}"#),
        "/search" => (
            200,
            r#"{"results": [{"doc_id": "d1", "score": 1.5}, {"doc_id": "d2", "score": 0.5}],
                "snippets": {"d1": "the <mark>cat</mark> sat &amp; purred"}}"#,
        ),
        "/document" if query.contains("doc_id=d1") => {
            (200, r#"{"doc_id": "d1", "content": "Full text of d1"}"#)
        }
        _ => (404, r#"{"error": "Document not found"}"#),
    }
}

/// Serve canned responses until the test process exits; returns the base URL
pub fn spawn_backend() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub backend");
    let addr = listener.local_addr().expect("local addr");

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let Ok(reader_half) = stream.try_clone() else {
                continue;
            };
            let mut reader = BufReader::new(reader_half);

            let mut request_line = String::new();
            if reader.read_line(&mut request_line).is_err() {
                continue;
            }
            loop {
                let mut header = String::new();
                match reader.read_line(&mut header) {
                    Ok(0) | Err(_) => break,
                    Ok(_) if header == "\r\n" => break,
                    Ok(_) => {}
                }
            }

            let target = request_line.split_whitespace().nth(1).unwrap_or("/");
            let (status, body) = route(target);
            let response = format!(
                "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });

    format!("http://{}", addr)
}
