// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ippd-server — HTTP transport, the printer registry and attribute catalog,
// the job model, the operation dispatcher, the dual-stack listener, and
// DNS-SD advertisement.

pub mod config;
pub mod dispatch;
pub mod dnssd;
pub mod http;
pub mod job;
pub mod listener;
pub mod printer;
pub mod requested;
pub mod status;

pub use config::ServerConfig;
pub use job::{Job, JobState};
pub use printer::{Printer, PrinterStatus};
pub use requested::RequestedAttributes;
pub use status::IppStatus;
