// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error type for ippd.

use thiserror::Error;

/// Top-level error type for ippd's process-startup operations.
///
/// Per-request protocol errors are represented as IPP status codes in a
/// response message, not as `IppdError`; per-connection transport errors
/// (a malformed request, a dropped socket) are likewise handled inline by
/// the connection task that hit them. This type is reserved for the two
/// conditions that can end the process before it ever starts serving:
/// failing to bind a listener, and failing to stand up DNS-SD advertisement.
#[derive(Debug, Error)]
pub enum IppdError {
    #[error("failed to bind listener on {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("mDNS registration failed: {0}")]
    Dnssd(String),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, IppdError>;
