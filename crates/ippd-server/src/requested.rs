// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `requested-attributes` filtering (spec.md §4.5): a client-supplied keyword
// set naming either concrete attribute names or a group token that expands
// to a fixed list.

use std::collections::HashSet;

/// `job-template` attributes (RFC 8011 §4.2), settable both on job creation
/// and as printer defaults.
const JOB_TEMPLATE: &[&str] = &[
    "job-priority",
    "job-hold-until",
    "job-sheets",
    "multiple-document-handling",
    "copies",
    "finishings",
    "page-ranges",
    "sides",
    "number-up",
    "orientation-requested",
    "media",
    "media-col",
    "print-quality",
];

/// `job-description` attributes (RFC 8011 §4.3) — a job's read-only status.
const JOB_DESCRIPTION: &[&str] = &[
    "job-id",
    "job-uri",
    "job-printer-uri",
    "job-name",
    "job-originating-user-name",
    "job-state",
    "job-state-reasons",
    "job-state-message",
    "job-k-octets",
    "time-at-creation",
    "time-at-processing",
    "time-at-completed",
    "document-format",
];

/// `printer-description` attributes (RFC 8011 §4.4) — identity and
/// present-tense status, as opposed to `-supported`/`-default` capability
/// attributes.
const PRINTER_DESCRIPTION: &[&str] = &[
    "printer-uri-supported",
    "uri-security-supported",
    "uri-authentication-supported",
    "printer-name",
    "printer-location",
    "printer-info",
    "printer-more-info",
    "printer-make-and-model",
    "printer-icons",
    "printer-device-id",
    "printer-state",
    "printer-state-reasons",
    "printer-is-accepting-jobs",
    "printer-up-time",
    "printer-current-time",
    "queued-job-count",
    "charset-configured",
    "charset-supported",
    "natural-language-configured",
    "generated-natural-language-supported",
    "document-format-default",
    "document-format-supported",
    "ipp-versions-supported",
    "operations-supported",
    "multiple-document-jobs-supported",
    "pdl-override-supported",
    "which-jobs-supported",
];

/// The `-default` attributes that mirror `job-template` as printer defaults.
const PRINTER_DEFAULTS: &[&str] = &[
    "job-priority-default",
    "job-sheets-default",
    "copies-default",
    "finishings-default",
    "sides-default",
    "number-up-default",
    "orientation-requested-default",
    "media-default",
    "media-col-default",
    "print-quality-default",
];

/// A parsed `requested-attributes` filter. `None` means "no filter" — the
/// `all` keyword, an empty attribute, or its absence behave identically
/// (spec.md §8, boundary behaviors).
pub struct RequestedAttributes {
    names: Option<HashSet<String>>,
}

impl RequestedAttributes {
    pub fn all() -> Self {
        Self { names: None }
    }

    pub fn parse(values: &[String]) -> Self {
        if values.is_empty() || values.iter().any(|v| v == "all") {
            return Self::all();
        }

        let mut names = HashSet::new();
        for value in values {
            match value.as_str() {
                "job-template" => names.extend(JOB_TEMPLATE.iter().map(|s| s.to_string())),
                "job-description" => names.extend(JOB_DESCRIPTION.iter().map(|s| s.to_string())),
                "printer-description" => {
                    names.extend(PRINTER_DESCRIPTION.iter().map(|s| s.to_string()))
                }
                "printer-defaults" => names.extend(PRINTER_DEFAULTS.iter().map(|s| s.to_string())),
                // No subscriptions are supported (spec.md Non-goals); the
                // group token is accepted but expands to nothing.
                "subscription-template" => {}
                other => {
                    names.insert(other.to_string());
                }
            }
        }
        Self { names: Some(names) }
    }

    pub fn includes(&self, name: &str) -> bool {
        match &self.names {
            None => true,
            Some(set) => set.contains(name),
        }
    }
}
