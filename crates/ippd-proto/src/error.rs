// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use thiserror::Error;

/// Failure modes of [`crate::codec::decode`].
///
/// Every variant names the exact wire condition that triggered it, so a
/// caller can log or test against the specific malformation rather than a
/// generic "bad request".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("message shorter than the 8-byte header")]
    Truncated,

    #[error("unrecognized group delimiter tag 0x{0:02x}")]
    UnknownGroupTag(u8),

    #[error("unrecognized value tag 0x{0:02x}")]
    UnknownValueTag(u8),

    #[error("declared length {declared} exceeds {remaining} bytes remaining")]
    LengthOverflow { declared: usize, remaining: usize },

    #[error("additional-value entry (empty name) with no preceding attribute")]
    DanglingAdditionalValue,

    #[error("begin-collection value for '{0}' was not followed by a matching end-collection")]
    UnterminatedCollection(String),

    #[error("end-collection tag encountered outside of a collection")]
    UnmatchedEndCollection,

    #[error("memberAttrName tag encountered outside of a collection")]
    MemberAttrNameOutsideCollection,

    #[error("collection member '{0}' has no value attribute following its name")]
    MemberWithoutValue(String),

    #[error("out-of-band value tag carries a non-empty value ({0} bytes)")]
    OutOfBandValueNotEmpty(usize),

    #[error("resolution value has length {0}, expected 9")]
    BadResolutionLength(usize),

    #[error("rangeOfInteger value has length {0}, expected 8")]
    BadRangeLength(usize),

    #[error("dateTime value has length {0}, expected 11")]
    BadDateTimeLength(usize),

    #[error("message is missing the end-of-attributes-tag delimiter")]
    MissingEndOfAttributes,

    #[error("attribute name is not valid UTF-8")]
    InvalidUtf8,
}
