// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ippd-core — error type and small domain types shared across all crates.

pub mod error;
pub mod types;

pub use error::IppdError;
pub use types::*;
