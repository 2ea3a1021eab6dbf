//! In-process fake EWS endpoint
//!
//! Speaks minimal HTTP/1.1 over a tokio `TcpStream` -- just enough for
//! reqwest: one request line, headers until the blank line, a
//! `Content-Length` body, and a `200 OK` response per request on a
//! kept-alive connection. Each POST body is inspected for its EWS
//! operation element and dispatched to the matching handler.
//!
//! The server listens on plain HTTP on loopback, so no certificates
//! are involved; the client under test is pointed at [`FakeEwsServer::url`].

use super::handlers;
use super::mailbox::Mailbox;
use super::xml;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// Per-operation request counters, readable from tests.
#[derive(Debug, Default)]
struct Counters {
    find_folder: AtomicUsize,
    find_item: AtomicUsize,
    get_folder: AtomicUsize,
    update_item: AtomicUsize,
}

/// A fake EWS server on localhost with an OS-assigned port.
pub struct FakeEwsServer {
    port: u16,
    mailbox: Arc<Mutex<Mailbox>>,
    counters: Arc<Counters>,
    /// Handle to the accept loop so it lives as long as the server.
    _handle: tokio::task::JoinHandle<()>,
}

impl FakeEwsServer {
    /// Start a new fake server with the given mailbox state.
    pub async fn start(mailbox: Mailbox) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind to ephemeral port");
        let port = listener.local_addr().unwrap().port();

        let mailbox = Arc::new(Mutex::new(mailbox));
        let counters = Arc::new(Counters::default());

        let task_mailbox = mailbox.clone();
        let task_counters = counters.clone();
        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _addr)) = listener.accept().await else {
                    break;
                };
                let mailbox = task_mailbox.clone();
                let counters = task_counters.clone();
                tokio::spawn(async move {
                    handle_connection(stream, &mailbox, &counters).await;
                });
            }
        });

        Self {
            port,
            mailbox,
            counters,
            _handle: handle,
        }
    }

    /// The EWS endpoint URL for this server.
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}/EWS/Exchange.asmx", self.port)
    }

    /// Number of FindFolder requests seen so far.
    pub fn find_folder_calls(&self) -> usize {
        self.counters.find_folder.load(Ordering::SeqCst)
    }

    /// Number of FindItem requests seen so far.
    pub fn find_item_calls(&self) -> usize {
        self.counters.find_item.load(Ordering::SeqCst)
    }

    /// Number of GetFolder requests seen so far.
    pub fn get_folder_calls(&self) -> usize {
        self.counters.get_folder.load(Ordering::SeqCst)
    }

    /// Number of UpdateItem (persist) requests seen so far.
    pub fn update_calls(&self) -> usize {
        self.counters.update_item.load(Ordering::SeqCst)
    }

    /// Snapshot of the current mailbox state.
    pub fn mailbox(&self) -> Mailbox {
        self.mailbox.lock().unwrap().clone()
    }
}

/// Serve one kept-alive connection until the peer closes it.
async fn handle_connection(stream: TcpStream, mailbox: &Mutex<Mailbox>, counters: &Counters) {
    let mut reader = BufReader::new(stream);

    loop {
        let Some(body) = read_request(&mut reader).await else {
            return;
        };
        let response_body = dispatch(&body, mailbox, counters);
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/xml; charset=utf-8\r\nContent-Length: {}\r\n\r\n{}",
            response_body.len(),
            response_body
        );
        if reader.get_mut().write_all(response.as_bytes()).await.is_err() {
            return;
        }
        if reader.get_mut().flush().await.is_err() {
            return;
        }
    }
}

/// Read one HTTP request and return its body.
async fn read_request(reader: &mut BufReader<TcpStream>) -> Option<String> {
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).await.ok()? == 0 {
        return None;
    }

    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).await.ok()? == 0 {
            return None;
        }
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        let lower = header.to_ascii_lowercase();
        if let Some(value) = lower.strip_prefix("content-length:") {
            content_length = value.trim().parse().ok()?;
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await.ok()?;
    String::from_utf8(body).ok()
}

/// Dispatch a request body to the handler for its operation element.
fn dispatch(body: &str, mailbox: &Mutex<Mailbox>, counters: &Counters) -> String {
    let snapshot = mailbox.lock().unwrap().clone();

    if xml::has_element(body, "FindFolder") {
        counters.find_folder.fetch_add(1, Ordering::SeqCst);
        handlers::find_folder(&snapshot, body)
    } else if xml::has_element(body, "FindItem") {
        counters.find_item.fetch_add(1, Ordering::SeqCst);
        handlers::find_item(&snapshot, body)
    } else if xml::has_element(body, "GetFolder") {
        counters.get_folder.fetch_add(1, Ordering::SeqCst);
        handlers::get_folder(&snapshot, body)
    } else if xml::has_element(body, "UpdateItem") {
        counters.update_item.fetch_add(1, Ordering::SeqCst);
        handlers::update_item(mailbox, body)
    } else {
        handlers::unknown_operation()
    }
}
