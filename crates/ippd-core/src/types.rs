// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Small domain types shared between the protocol and server crates.

/// Map a `document-format` MIME type to the short PDL abbreviation used in
/// `printer-device-id` (spec.md §4.3). Returns `None` for
/// `application/octet-stream`, which is omitted from the `CMD:` list, and
/// falls back to the MIME type verbatim for anything else unrecognized.
pub fn mime_to_pdl(mime: &str) -> Option<&str> {
    match mime {
        "application/pdf" => Some("PDF"),
        "application/postscript" => Some("PS"),
        "application/vnd.hp-PCL" => Some("PCL"),
        "image/jpeg" => Some("JPEG"),
        "image/png" => Some("PNG"),
        "application/octet-stream" => None,
        other => Some(other),
    }
}
