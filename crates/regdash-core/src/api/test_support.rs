//! Local HTTP fixtures for tests that go through `ApiClient`.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::json;

/// Serve canned HTTP responses on a local port. `respond` maps the
/// requested offset to (status line, body). Returns the base URL and a
/// counter of handled requests.
pub(crate) fn serve<F>(requests: usize, respond: F) -> (String, Arc<AtomicUsize>)
where
    F: Fn(usize) -> (&'static str, String) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let handled = Arc::new(AtomicUsize::new(0));
    let counter = handled.clone();

    std::thread::spawn(move || {
        for stream in listener.incoming().take(requests) {
            let mut stream = match stream {
                Ok(s) => s,
                Err(_) => return,
            };
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
            let mut request_line = String::new();
            let _ = reader.read_line(&mut request_line);
            loop {
                let mut line = String::new();
                match reader.read_line(&mut line) {
                    Ok(0) => break,
                    Ok(_) if line == "\r\n" => break,
                    Ok(_) => continue,
                    Err(_) => break,
                }
            }

            let offset = request_line
                .split(['?', '&', ' '])
                .find_map(|part| part.strip_prefix("offset="))
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(0);
            counter.fetch_add(1, Ordering::SeqCst);

            let (status, body) = respond(offset);
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    (format!("http://{}/records", addr), handled)
}

/// One page of a `total`-row table starting at `offset`
pub(crate) fn page_body(offset: usize, total: usize, page_size: usize) -> String {
    let rows: Vec<_> = (offset.min(total)..(offset + page_size).min(total))
        .map(|i| json!({"Id": i, "Full Name": format!("Person {i}"), "Age": 20}))
        .collect();
    json!({ "list": rows, "pageInfo": { "totalRows": total } }).to_string()
}
