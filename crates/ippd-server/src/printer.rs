// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer registry and attribute catalog (C3): the static attribute set built
// once at startup, plus the mutable job table and state the dispatcher (C5)
// reads and writes under one reader-writer lock (spec.md §5).

use std::sync::RwLock;
use std::time::{Instant, SystemTime};

use ippd_proto::{Attribute, GroupTag, Value};
use ippd_core::mime_to_pdl;

use crate::config::ServerConfig;
use crate::job::{Job, JobState};
use crate::status::IppStatus;

/// `printer-state` (RFC 8011 §4.4.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrinterStatus {
    Idle,
    Processing,
    Stopped,
}

impl PrinterStatus {
    pub const fn ipp_value(self) -> i32 {
        match self {
            PrinterStatus::Idle => 3,
            PrinterStatus::Processing => 4,
            PrinterStatus::Stopped => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaClass {
    General,
    PhotoOnly,
    EnvelopeOnly,
}

struct MediaSize {
    name: &'static str,
    /// x/y dimensions in hundredths of a millimeter (PWG media standard).
    x: i32,
    y: i32,
    class: MediaClass,
}

/// The fixed media catalog spec.md §4.3 names.
const MEDIA_SIZES: &[MediaSize] = &[
    MediaSize { name: "A4", x: 21000, y: 29700, class: MediaClass::General },
    MediaSize { name: "A5", x: 14800, y: 21000, class: MediaClass::General },
    MediaSize { name: "A6", x: 10500, y: 14800, class: MediaClass::General },
    MediaSize { name: "DL", x: 11000, y: 22000, class: MediaClass::EnvelopeOnly },
    MediaSize { name: "Legal", x: 21590, y: 35560, class: MediaClass::General },
    MediaSize { name: "Letter", x: 21590, y: 27940, class: MediaClass::General },
    MediaSize { name: "#10", x: 10478, y: 24130, class: MediaClass::EnvelopeOnly },
    MediaSize { name: "3x5", x: 7620, y: 12700, class: MediaClass::PhotoOnly },
    MediaSize { name: "L", x: 8900, y: 12700, class: MediaClass::PhotoOnly },
    MediaSize { name: "4x6", x: 10160, y: 15240, class: MediaClass::PhotoOnly },
    MediaSize { name: "5x7", x: 12700, y: 17780, class: MediaClass::PhotoOnly },
];

/// The 13 fixed `media-type-supported` values.
const MEDIA_TYPES_GENERAL: &[&str] =
    &["auto", "stationery", "stationery-coated", "stationery-letterhead", "cardstock", "labels"];
const MEDIA_TYPES_PHOTO: &[&str] = &[
    "auto",
    "photographic",
    "photographic-glossy",
    "photographic-high-gloss",
    "photographic-matte",
    "photographic-satin",
    "photographic-semi-gloss",
];
const MEDIA_TYPES_ENVELOPE: &[&str] = &["envelope"];

const STANDARD_MARGIN: i32 = 635;
const BORDERLESS_MARGIN: i32 = 0;

fn media_types_for(class: MediaClass) -> &'static [&'static str] {
    match class {
        MediaClass::General => MEDIA_TYPES_GENERAL,
        MediaClass::PhotoOnly => MEDIA_TYPES_PHOTO,
        MediaClass::EnvelopeOnly => MEDIA_TYPES_ENVELOPE,
    }
}

/// All 13 `media-type-supported` values, deduplicated.
fn all_media_types() -> Vec<&'static str> {
    let mut seen = Vec::new();
    for class in [MediaClass::General, MediaClass::PhotoOnly, MediaClass::EnvelopeOnly] {
        for t in media_types_for(class) {
            if !seen.contains(t) {
                seen.push(*t);
            }
        }
    }
    seen
}

/// Build one `media-col` member collection for a given size/type/margin.
fn media_col_entry(size: &MediaSize, media_type: &str, margin: i32) -> Attribute {
    let media_size = Value::collection(vec![
        Attribute::new("x-dimension", GroupTag::Printer, Value::Integer(size.x)),
        Attribute::new("y-dimension", GroupTag::Printer, Value::Integer(size.y)),
    ]);
    Attribute::new(
        "media-col-database",
        GroupTag::Printer,
        Value::collection(vec![
            Attribute::new("media-size", GroupTag::Printer, media_size),
            Attribute::new(
                "media-bottom-margin",
                GroupTag::Printer,
                Value::Integer(margin),
            ),
            Attribute::new("media-left-margin", GroupTag::Printer, Value::Integer(margin)),
            Attribute::new("media-right-margin", GroupTag::Printer, Value::Integer(margin)),
            Attribute::new("media-top-margin", GroupTag::Printer, Value::Integer(margin)),
            Attribute::new("media-type", GroupTag::Printer, Value::keyword(media_type)),
            Attribute::new(
                "media-key",
                GroupTag::Printer,
                Value::keyword(format!("{}_{}", size.name, media_type)),
            ),
        ]),
    )
}

/// Build the full `media-col-database`: the cross product of size and type
/// filtered by size class, with a borderless (margin=0) variant added for
/// `auto`/photographic types on non-envelope sizes (spec.md §11).
fn build_media_col_database() -> Vec<Attribute> {
    let mut entries = Vec::new();
    for size in MEDIA_SIZES {
        for &media_type in media_types_for(size.class) {
            entries.push(media_col_entry(size, media_type, STANDARD_MARGIN));

            let borderless_eligible =
                size.class != MediaClass::EnvelopeOnly && (media_type == "auto" || media_type.starts_with("photographic"));
            if borderless_eligible {
                entries.push(media_col_entry(size, media_type, BORDERLESS_MARGIN));
            }
        }
    }
    entries
}

/// `printer-device-id`: `MFG:<make>;MDL:<model>;CMD:<cmds>;` (spec.md §4.3).
fn printer_device_id(make: &str, model: &str, formats: &[String]) -> String {
    let cmds: Vec<&str> = formats.iter().filter_map(|f| mime_to_pdl(f)).collect();
    format!("MFG:{make};MDL:{model};CMD:{};", cmds.join(","))
}

/// Build the printer's immutable attribute set (everything in spec.md §4.3
/// except the dynamic attributes the dispatcher appends per-request).
pub fn build_static_attributes(config: &ServerConfig, host: &str, port: u16) -> Vec<Attribute> {
    let mut attrs = Vec::new();
    let printer_uri = format!("ipp://{host}:{port}/ipp");
    let make_and_model = format!("{} {}", config.make, config.model);

    attrs.push(Attribute::new("printer-name", GroupTag::Printer, Value::name(config.name.clone())));
    attrs.push(Attribute::new(
        "printer-info",
        GroupTag::Printer,
        Value::text(config.name.clone()),
    ));
    attrs.push(Attribute::new(
        "printer-location",
        GroupTag::Printer,
        Value::text(config.location.clone().unwrap_or_default()),
    ));
    attrs.push(Attribute::new(
        "printer-make-and-model",
        GroupTag::Printer,
        Value::text(make_and_model),
    ));
    attrs.push(Attribute::new("printer-uri-supported", GroupTag::Printer, Value::uri(printer_uri.clone())));
    attrs.push(Attribute::new(
        "printer-more-info",
        GroupTag::Printer,
        Value::uri(format!("http://{host}:{port}/")),
    ));
    attrs.push(Attribute::new(
        "printer-icons",
        GroupTag::Printer,
        Value::uri(format!("http://{host}:{port}/icon.png")),
    ));
    attrs.push(Attribute::new(
        "printer-device-id",
        GroupTag::Printer,
        Value::text(printer_device_id(&config.make, &config.model, &config.formats)),
    ));

    attrs.push(Attribute::new_multi(
        "ipp-versions-supported",
        GroupTag::Printer,
        vec![Value::keyword("1.0"), Value::keyword("1.1"), Value::keyword("2.0")],
    ));
    attrs.push(Attribute::new_multi(
        "operations-supported",
        GroupTag::Printer,
        [
            0x0002, 0x0004, 0x0005, 0x0006, 0x0008, 0x0009, 0x000a, 0x000b,
        ]
        .iter()
        .map(|op| Value::Enum(*op))
        .collect(),
    ));

    attrs.push(Attribute::new("charset-configured", GroupTag::Printer, Value::charset("utf-8")));
    attrs.push(Attribute::new_multi(
        "charset-supported",
        GroupTag::Printer,
        vec![Value::charset("us-ascii"), Value::charset("utf-8")],
    ));
    attrs.push(Attribute::new(
        "natural-language-configured",
        GroupTag::Printer,
        Value::natural_language("en"),
    ));
    attrs.push(Attribute::new(
        "generated-natural-language-supported",
        GroupTag::Printer,
        Value::natural_language("en"),
    ));

    attrs.push(Attribute::new(
        "document-format-default",
        GroupTag::Printer,
        Value::mime_media_type(config.document_format_default().to_string()),
    ));
    attrs.push(Attribute::new_multi(
        "document-format-supported",
        GroupTag::Printer,
        config.formats.iter().map(|f| Value::mime_media_type(f.clone())).collect(),
    ));

    attrs.push(Attribute::new_multi(
        "media-supported",
        GroupTag::Printer,
        MEDIA_SIZES.iter().map(|m| Value::keyword(m.name)).collect(),
    ));
    attrs.push(Attribute::new_multi(
        "media-type-supported",
        GroupTag::Printer,
        all_media_types().into_iter().map(Value::keyword).collect(),
    ));
    let media_col_entries = build_media_col_database();
    if let Some(first) = media_col_entries.first() {
        let rest = media_col_entries[1..].iter().flat_map(|a| a.values.clone());
        let mut values = vec![first.values[0].clone()];
        values.extend(rest);
        attrs.push(Attribute::new_multi("media-col-database", GroupTag::Printer, values));
    }

    // job-k-octets-supported: 0..min(INT_MAX, free spool bytes). This crate
    // has no dependency that reports filesystem free space (the teacher
    // doesn't either), so the upper bound is always INT_MAX; see DESIGN.md.
    attrs.push(Attribute::new(
        "job-k-octets-supported",
        GroupTag::Printer,
        Value::Range { lo: 0, hi: i32::MAX },
    ));

    let sides = if config.duplex {
        vec![
            Value::keyword("one-sided"),
            Value::keyword("two-sided-long-edge"),
            Value::keyword("two-sided-short-edge"),
        ]
    } else {
        vec![Value::keyword("one-sided")]
    };
    attrs.push(Attribute::new_multi("sides-supported", GroupTag::Printer, sides));

    attrs.push(Attribute::new(
        "copies-supported",
        GroupTag::Printer,
        Value::Range { lo: 1, hi: 999 },
    ));
    attrs.push(Attribute::new_multi(
        "print-quality-supported",
        GroupTag::Printer,
        vec![Value::Enum(3), Value::Enum(4), Value::Enum(5)], // draft, normal, high
    ));
    attrs.push(Attribute::new_multi(
        "orientation-requested-supported",
        GroupTag::Printer,
        vec![Value::Enum(3), Value::Enum(4), Value::Enum(5), Value::Enum(6)],
    ));
    attrs.push(Attribute::new(
        "pdl-override-supported",
        GroupTag::Printer,
        Value::keyword("attempted"),
    ));
    attrs.push(Attribute::new(
        "multiple-document-jobs-supported",
        GroupTag::Printer,
        Value::Boolean(false),
    ));
    attrs.push(Attribute::new("uri-security-supported", GroupTag::Printer, Value::keyword("none")));
    attrs.push(Attribute::new(
        "uri-authentication-supported",
        GroupTag::Printer,
        Value::keyword("none"),
    ));
    attrs.push(Attribute::new_multi(
        "which-jobs-supported",
        GroupTag::Printer,
        [
            "completed",
            "not-completed",
            "aborted",
            "all",
            "canceled",
            "pending",
            "pending-held",
            "processing",
            "processing-stopped",
        ]
        .iter()
        .map(|s| Value::keyword(*s))
        .collect(),
    ));

    attrs
}

/// Mutable printer state: jobs, status, and id allocation, protected by one
/// reader-writer lock (spec.md §5).
struct PrinterState {
    status: PrinterStatus,
    state_reasons: Vec<&'static str>,
    jobs: Vec<Job>,
    next_job_id: i32,
}

/// A printer instance. Owns its job table exclusively; a [`Job`] never holds
/// a pointer back to this (design note 9).
pub struct Printer {
    pub config: ServerConfig,
    pub hostname: String,
    pub port: u16,
    pub attributes: Vec<Attribute>,
    started_at: Instant,
    state: RwLock<PrinterState>,
}

impl Printer {
    pub fn new(config: ServerConfig, hostname: String, port: u16) -> Self {
        let attributes = build_static_attributes(&config, &hostname, port);
        Self {
            config,
            hostname,
            port,
            attributes,
            started_at: Instant::now(),
            state: RwLock::new(PrinterState {
                status: PrinterStatus::Idle,
                state_reasons: vec!["none"],
                jobs: Vec::new(),
                next_job_id: 1,
            }),
        }
    }

    pub fn printer_uri(&self) -> String {
        format!("ipp://{}:{}/ipp", self.hostname, self.port)
    }

    pub fn up_time_seconds(&self) -> i32 {
        self.started_at.elapsed().as_secs() as i32
    }

    pub fn status(&self) -> PrinterStatus {
        self.state.read().expect("printer lock poisoned").status
    }

    pub fn state_reasons(&self) -> Vec<&'static str> {
        self.state.read().expect("printer lock poisoned").state_reasons.clone()
    }

    pub fn queued_job_count(&self) -> i32 {
        self.state
            .read()
            .expect("printer lock poisoned")
            .jobs
            .iter()
            .filter(|j| !j.state.is_terminal())
            .count() as i32
    }

    /// Allocate a job, copying job-template attributes from the creating
    /// request and inserting it at the head of the jobs array (spec.md
    /// §4.4). Job id allocation happens under the write lock and is
    /// monotonic.
    pub fn create_job(
        &self,
        name: String,
        template_attributes: Vec<Attribute>,
        creating_connection: u64,
    ) -> i32 {
        let mut state = self.state.write().expect("printer lock poisoned");
        let id = state.next_job_id;
        state.next_job_id += 1;
        let job = Job::new(id, name, template_attributes, creating_connection);
        state.jobs.insert(0, job);
        id
    }

    pub fn with_job<R>(&self, id: i32, f: impl FnOnce(&Job) -> R) -> Option<R> {
        let state = self.state.read().expect("printer lock poisoned");
        state.jobs.iter().find(|j| j.id == id).map(f)
    }

    pub fn with_job_mut<R>(&self, id: i32, f: impl FnOnce(&mut Job) -> R) -> Option<R> {
        let mut state = self.state.write().expect("printer lock poisoned");
        state.jobs.iter_mut().find(|j| j.id == id).map(f)
    }

    pub fn cancel_job(&self, id: i32) -> Result<(), IppStatus> {
        let mut state = self.state.write().expect("printer lock poisoned");
        match state.jobs.iter_mut().find(|j| j.id == id) {
            Some(job) => job.cancel(SystemTime::now()),
            None => Err(IppStatus::CLIENT_ERROR_NOT_FOUND),
        }
    }

    /// Jobs in descending id order, filtered by `which-jobs` and, if
    /// `my_jobs` is set, nothing further (this server has no user identity
    /// model, so `my-jobs` is a no-op — every job is "mine").
    pub fn jobs_matching(&self, which: &str, limit: Option<usize>) -> Vec<Job> {
        let state = self.state.read().expect("printer lock poisoned");
        let mut out: Vec<Job> = state
            .jobs
            .iter()
            .filter(|j| which_jobs_matches(which, j.state))
            .cloned()
            .collect();
        if let Some(limit) = limit {
            out.truncate(limit);
        }
        out
    }
}

fn which_jobs_matches(which: &str, state: JobState) -> bool {
    match which {
        "all" => true,
        "completed" => state == JobState::Completed,
        "aborted" => state == JobState::Aborted,
        "canceled" => state == JobState::Canceled,
        "pending" => state == JobState::Pending,
        "pending-held" => matches!(state, JobState::Pending | JobState::Held),
        "processing" => state == JobState::Processing,
        "processing-stopped" => matches!(state, JobState::Processing | JobState::Stopped),
        // default: not-completed
        _ => !state.is_terminal() || state == JobState::Aborted,
    }
}
