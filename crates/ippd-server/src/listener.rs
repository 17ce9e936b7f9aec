// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The dual-stack listener and per-connection worker (C6). One accept loop
// per address family, one spawned task per connection, each running the HTTP
// transport (C2) feeding the operation dispatcher (C5).
//
// mDNS's own event loop runs on its daemon thread inside [`crate::dnssd`], so
// unlike the polling accept loop this grew from, there is no socket to
// service here beyond the two TCP listeners and the shutdown signal.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tracing::{info, warn};

use ippd_core::error::IppdError;
use ippd_proto::{decode_prefix, encode};

use crate::config::ServerConfig;
use crate::dnssd::Advertisement;
use crate::http::{self, HttpError, Method, ResponseHead};
use crate::printer::Printer;

const BACKLOG: u32 = 5;

pub struct Listener {
    v4: TcpListener,
    v6: Option<TcpListener>,
    pub port: u16,
    shutdown: Arc<Notify>,
}

impl Listener {
    /// Bind the IPv4 listener, then bind IPv6 on the same (possibly
    /// OS-assigned) port so both families share one canonical port
    /// (spec.md §4.6).
    pub async fn bind(requested_port: u16) -> Result<Self, IppdError> {
        let v4_addr = SocketAddr::from(([0, 0, 0, 0], requested_port));
        let v4 = bind_one(v4_addr).await.map_err(|e| IppdError::Bind { addr: v4_addr, source: e })?;
        let port = v4.local_addr().map_err(|e| IppdError::Bind { addr: v4_addr, source: e })?.port();

        let v6 = match bind_one(SocketAddr::from(([0, 0, 0, 0, 0, 0, 0, 0], port))).await {
            Ok(listener) => Some(listener),
            Err(e) => {
                warn!(error = %e, "failed to bind IPv6 listener, continuing IPv4-only");
                None
            }
        };

        Ok(Self { v4, v6, port, shutdown: Arc::new(Notify::new()) })
    }

    pub fn shutdown_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Run the accept loop until shutdown is signaled.
    pub async fn serve(self, printer: Arc<Printer>) {
        let next_connection_id = Arc::new(AtomicU64::new(1));
        loop {
            tokio::select! {
                _ = self.shutdown.notified() => {
                    info!(port = self.port, "listener shutting down");
                    break;
                }
                accepted = self.v4.accept() => {
                    spawn_connection(accepted, &printer, &next_connection_id);
                }
                accepted = accept_optional(&self.v6) => {
                    spawn_connection(accepted, &printer, &next_connection_id);
                }
            }
        }
    }
}

async fn accept_optional(listener: &Option<TcpListener>) -> io::Result<(TcpStream, SocketAddr)> {
    match listener {
        Some(l) => l.accept().await,
        None => std::future::pending().await,
    }
}

async fn bind_one(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = if addr.is_ipv4() {
        tokio::net::TcpSocket::new_v4()?
    } else {
        tokio::net::TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(BACKLOG)
}

fn spawn_connection(
    accepted: io::Result<(TcpStream, SocketAddr)>,
    printer: &Arc<Printer>,
    next_connection_id: &Arc<AtomicU64>,
) {
    match accepted {
        Ok((stream, peer)) => {
            let _ = stream.set_nodelay(true);
            let printer = Arc::clone(printer);
            let connection_id = next_connection_id.fetch_add(1, Ordering::Relaxed);
            tokio::spawn(async move {
                info!(peer = %peer, connection_id, "accepted connection");
                if let Err(e) = handle_connection(stream, printer, connection_id).await {
                    warn!(peer = %peer, error = %e, "connection closed with error");
                }
            });
        }
        Err(e) => warn!(error = %e, "failed to accept connection"),
    }
}

async fn handle_connection(stream: TcpStream, printer: Arc<Printer>, connection_id: u64) -> io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut first = true;

    loop {
        let head = match http::read_request_head(&mut reader, first).await {
            Ok(Some(head)) => head,
            Ok(None) => return Ok(()),
            Err(HttpError::IdleTimeout) => return Ok(()),
            Err(e) => {
                write_error(&mut write_half, (1, 1), 400).await?;
                return Err(io::Error::other(e.to_string()));
            }
        };
        first = false;

        if head.wants_upgrade() {
            write_error(&mut write_half, head.version, 501).await?;
            return Ok(());
        }

        if head.expects_continue() {
            http::write_100_continue(&mut write_half).await.map_err(|e| io::Error::other(e.to_string()))?;
        }

        let body = match http::read_request_body(&mut reader, &head).await {
            Ok(body) => body,
            Err(HttpError::EntityTooLarge) => {
                write_error(&mut write_half, head.version, 413).await?;
                return Ok(());
            }
            Err(e) => {
                write_error(&mut write_half, head.version, 400).await?;
                return Err(io::Error::other(e.to_string()));
            }
        };

        let keep_alive = head.keep_alive();

        match (head.method, head.path.as_str()) {
            (Method::Get, "/icon.png") | (Method::Head, "/icon.png") => {
                serve_icon(&mut write_half, &printer, head.version).await?
            }
            (Method::Options, "/icon.png") => write_allow(&mut write_half, head.version, "GET, HEAD, OPTIONS").await?,
            (Method::Post, "/ipp") | (Method::Post, "/ipp/print") => {
                serve_ipp(&mut write_half, &printer, &body, connection_id, head.version).await?
            }
            (Method::Options, "/ipp") | (Method::Options, "/ipp/print") => {
                write_allow(&mut write_half, head.version, "POST, OPTIONS").await?
            }
            (_, "/icon.png") => write_method_not_allowed(&mut write_half, head.version, "GET, HEAD, OPTIONS").await?,
            (_, "/ipp") | (_, "/ipp/print") => {
                write_method_not_allowed(&mut write_half, head.version, "POST, OPTIONS").await?
            }
            _ => write_error(&mut write_half, head.version, 404).await?,
        }

        if !keep_alive {
            return Ok(());
        }
    }
}

async fn serve_icon<W: tokio::io::AsyncWrite + Unpin>(
    writer: &mut W,
    printer: &Printer,
    version: (u8, u8),
) -> io::Result<()> {
    let Some(path) = &printer.config.icon_path else {
        return write_error(writer, version, 404).await;
    };
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let head = ResponseHead {
                status: 200,
                reason: "OK",
                headers: vec![("Content-Type".to_string(), "image/png".to_string())],
            };
            http::write_response(writer, version, head, &bytes).await.map_err(|e| io::Error::other(e.to_string()))
        }
        Err(_) => write_error(writer, version, 404).await,
    }
}

async fn serve_ipp<W: tokio::io::AsyncWrite + Unpin>(
    writer: &mut W,
    printer: &Printer,
    body: &[u8],
    connection_id: u64,
    version: (u8, u8),
) -> io::Result<()> {
    let (request, consumed) = match decode_prefix(body, true) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "malformed IPP request body");
            return write_error(writer, version, 400).await;
        }
    };
    let document = &body[consumed..];
    let response = crate::dispatch::dispatch(printer, request, connection_id, document).await;
    let bytes = encode(&response);
    let head = ResponseHead {
        status: 200,
        reason: "OK",
        headers: vec![("Content-Type".to_string(), "application/ipp".to_string())],
    };
    http::write_response(writer, version, head, &bytes).await.map_err(|e| io::Error::other(e.to_string()))
}

async fn write_error<W: tokio::io::AsyncWrite + Unpin>(writer: &mut W, version: (u8, u8), status: u16) -> io::Result<()> {
    let reason = match status {
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Request Entity Too Large",
        501 => "Not Implemented",
        _ => "Error",
    };
    let head = ResponseHead { status, reason, headers: Vec::new() };
    http::write_response(writer, version, head, &[]).await.map_err(|e| io::Error::other(e.to_string()))
}

/// `OPTIONS` against a known path: 200 with the `Allow` header spec.md §4.2
/// mentions, no body.
async fn write_allow<W: tokio::io::AsyncWrite + Unpin>(writer: &mut W, version: (u8, u8), allow: &str) -> io::Result<()> {
    let head = ResponseHead {
        status: 200,
        reason: "OK",
        headers: vec![("Allow".to_string(), allow.to_string())],
    };
    http::write_response(writer, version, head, &[]).await.map_err(|e| io::Error::other(e.to_string()))
}

/// A recognized path hit with a method it doesn't support: 405 with `Allow`.
async fn write_method_not_allowed<W: tokio::io::AsyncWrite + Unpin>(
    writer: &mut W,
    version: (u8, u8),
    allow: &str,
) -> io::Result<()> {
    let head = ResponseHead {
        status: 405,
        reason: "Method Not Allowed",
        headers: vec![("Allow".to_string(), allow.to_string())],
    };
    http::write_response(writer, version, head, &[]).await.map_err(|e| io::Error::other(e.to_string()))
}

/// Bind first, then build the printer's attribute catalog from the real
/// resolved port — `config.port` may be `0` (OS-assigned), and printer-uri
/// and friends must reflect the port clients will actually connect to.
/// Registers DNS-SD advertisement once that port is known. Returns the
/// printer (so the caller can keep a handle to it), the shutdown `Notify`
/// to signal a graceful stop, the resolved port, and the advertisement
/// handle so the caller can unregister it on shutdown.
pub async fn start(
    config: ServerConfig,
    hostname: String,
) -> Result<(Arc<Printer>, Arc<Notify>, u16, Option<Advertisement>), IppdError> {
    let listener = Listener::bind(config.port).await?;
    let port = listener.port;
    let shutdown = listener.shutdown_handle();

    let advertisement = Advertisement::register(&config, &hostname, port);
    let printer = Arc::new(Printer::new(config, hostname, port));

    info!(port, "IPP server listening");
    tokio::spawn(listener.serve(Arc::clone(&printer)));

    Ok((printer, shutdown, port, advertisement))
}
