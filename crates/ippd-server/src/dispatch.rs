// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The operation dispatcher (C5): shared preconditions, then one handler per
// IPP operation spec.md §4.5 names. A dispatched request carries the parsed
// attribute [`Message`] plus, for Print-Job, the raw document bytes that rode
// along after the end-of-attributes tag in the HTTP body.

use std::fs;
use std::time::SystemTime;

use ippd_proto::{copy_attribute, Attribute, GroupTag, Message, MessageKind, Value};
use tracing::{info, warn};

use crate::job::JobState;
use crate::printer::Printer;
use crate::requested::RequestedAttributes;
use crate::status::IppStatus;

pub mod operation {
    pub const PRINT_JOB: u16 = 0x0002;
    pub const VALIDATE_JOB: u16 = 0x0004;
    pub const CREATE_JOB: u16 = 0x0005;
    pub const SEND_DOCUMENT: u16 = 0x0006;
    pub const CANCEL_JOB: u16 = 0x0008;
    pub const GET_JOB_ATTRIBUTES: u16 = 0x0009;
    pub const GET_JOBS: u16 = 0x000a;
    pub const GET_PRINTER_ATTRIBUTES: u16 = 0x000b;
}

fn op_str(request: &Message, name: &str) -> Option<String> {
    request
        .find(name, Some(GroupTag::Operation))
        .and_then(|a| a.first())
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn op_int(request: &Message, name: &str) -> Option<i32> {
    request.find(name, Some(GroupTag::Operation)).and_then(|a| a.first()).and_then(|v| v.as_integer())
}

fn op_bool(request: &Message, name: &str) -> Option<bool> {
    request.find(name, Some(GroupTag::Operation)).and_then(|a| a.first()).and_then(|v| v.as_boolean())
}

fn op_strs(request: &Message, name: &str) -> Vec<String> {
    request
        .find(name, Some(GroupTag::Operation))
        .map(|a| a.values.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

fn new_response(request: &Message, status: IppStatus) -> Message {
    let mut response = Message::response(request.version_major, request.version_minor, status.code(), request.request_id);
    response.add(
        GroupTag::Operation,
        "attributes-charset",
        Value::charset("utf-8"),
    );
    response.add(
        GroupTag::Operation,
        "attributes-natural-language",
        Value::natural_language("en"),
    );
    response
}

/// spec.md §4.5's shared preconditions, checked before any operation logic.
fn check_preconditions(request: &Message, printer: &Printer) -> Result<(), IppStatus> {
    if request.version_major > 2 {
        return Err(IppStatus::SERVER_ERROR_VERSION_NOT_SUPPORTED);
    }
    if op_str(request, "attributes-charset").is_none() || op_str(request, "attributes-natural-language").is_none() {
        return Err(IppStatus::CLIENT_ERROR_BAD_REQUEST);
    }
    if let Some(uri) = op_str(request, "printer-uri") {
        if uri != printer.printer_uri() {
            return Err(IppStatus::CLIENT_ERROR_NOT_FOUND);
        }
    }
    Ok(())
}

fn job_id_from_request(request: &Message) -> Option<i32> {
    if let Some(id) = op_int(request, "job-id") {
        return Some(id);
    }
    op_str(request, "job-uri").and_then(|uri| uri.rsplit('/').next().and_then(|s| s.parse().ok()))
}

/// Dispatch one request to its handler, after the shared preconditions.
/// `document` carries Print-Job's inline document bytes; it's empty for
/// every other operation.
pub async fn dispatch(printer: &Printer, request: Message, connection_id: u64, document: &[u8]) -> Message {
    let operation_id = match request.kind {
        MessageKind::Request(op) => op,
        MessageKind::Response(_) => return new_response(&request, IppStatus::CLIENT_ERROR_BAD_REQUEST),
    };

    if let Err(status) = check_preconditions(&request, printer) {
        warn!(operation_id, status = status.code(), "request failed shared preconditions");
        return new_response(&request, status);
    }

    match operation_id {
        operation::VALIDATE_JOB => handle_validate_job(printer, &request),
        operation::CREATE_JOB => handle_create_job(printer, &request, connection_id),
        operation::SEND_DOCUMENT => handle_send_document(printer, &request, document),
        operation::PRINT_JOB => handle_print_job(printer, &request, connection_id, document),
        operation::CANCEL_JOB => handle_cancel_job(printer, &request),
        operation::GET_JOB_ATTRIBUTES => handle_get_job_attributes(printer, &request),
        operation::GET_JOBS => handle_get_jobs(printer, &request),
        operation::GET_PRINTER_ATTRIBUTES => handle_get_printer_attributes(printer, &request),
        other => {
            warn!(operation_id = other, "unsupported operation");
            new_response(&request, IppStatus::CLIENT_ERROR_BAD_REQUEST)
        }
    }
}

fn document_format_supported(printer: &Printer, format: &str) -> bool {
    printer
        .attributes
        .iter()
        .find(|a| a.name == "document-format-supported")
        .into_iter()
        .flat_map(|a| a.values.iter())
        .filter_map(|v| v.as_str())
        .any(|f| f == format)
}

fn job_template_attributes(request: &Message) -> Vec<Attribute> {
    request
        .group(GroupTag::Job)
        .map(|g| g.attributes.iter().cloned().collect())
        .unwrap_or_default()
}

fn handle_validate_job(printer: &Printer, request: &Message) -> Message {
    if let Some(format) = op_str(request, "document-format") {
        if format != "application/octet-stream" && !document_format_supported(printer, &format) {
            let mut response = new_response(request, IppStatus::CLIENT_ERROR_ATTRIBUTES_OR_VALUES_NOT_SUPPORTED);
            if let Some(attr) = request.find("document-format", Some(GroupTag::Operation)) {
                copy_attribute(&mut response, attr, GroupTag::Unsupported, true);
            }
            return response;
        }
    }
    new_response(request, IppStatus::SUCCESSFUL_OK)
}

fn job_attributes_for_response(job: &crate::job::Job, printer_uri: &str) -> Vec<Attribute> {
    vec![
        Attribute::new("job-id", GroupTag::Job, Value::Integer(job.id)),
        Attribute::new("job-uri", GroupTag::Job, Value::uri(format!("{printer_uri}/jobs/{}", job.id))),
        Attribute::new("job-printer-uri", GroupTag::Job, Value::uri(printer_uri.to_string())),
        Attribute::new("job-name", GroupTag::Job, Value::name(job.name.clone())),
        Attribute::new("job-state", GroupTag::Job, Value::Enum(job.state.ipp_value())),
        Attribute::new(
            "job-state-reasons",
            GroupTag::Job,
            Value::keyword(job.state_reasons()),
        ),
        Attribute::new("job-k-octets", GroupTag::Job, Value::Integer(0)),
        Attribute::new("document-format", GroupTag::Job, Value::mime_media_type(job.document_format.clone())),
    ]
}

fn handle_create_job(printer: &Printer, request: &Message, connection_id: u64) -> Message {
    let name = op_str(request, "job-name").unwrap_or_else(|| "untitled".to_string());
    let template = job_template_attributes(request);
    let id = printer.create_job(name, template, connection_id);
    let mut response = new_response(request, IppStatus::SUCCESSFUL_OK);
    printer.with_job(id, |job| {
        for attr in job_attributes_for_response(job, &printer.printer_uri()) {
            response.add_multi(GroupTag::Job, attr.name.clone(), attr.values.clone());
        }
    });
    info!(job_id = id, "job created");
    response
}

/// Create the spool directory world-writable (mode `0777`), matching the
/// reference `ippserver`'s own `mkdir(directory, 0777)` — any local user may
/// submit a job, so the spool directory is not locked down to one owner.
#[cfg(unix)]
fn create_spool_dir(dir: &std::path::Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::create_dir_all(dir)?;
    fs::set_permissions(dir, fs::Permissions::from_mode(0o777))
}

#[cfg(not(unix))]
fn create_spool_dir(dir: &std::path::Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

fn write_document(printer: &Printer, job_id: i32, format: &str, bytes: &[u8]) -> std::io::Result<std::path::PathBuf> {
    create_spool_dir(&printer.config.spool_dir)?;
    let ext = ippd_core::mime_to_pdl(format).map(str::to_lowercase).unwrap_or_else(|| "bin".to_string());
    let path = printer.config.spool_dir.join(format!("{job_id}.{ext}"));
    fs::write(&path, bytes)?;
    Ok(path)
}

fn finish_document(printer: &Printer, id: i32, format: String, bytes: &[u8], last: bool) -> Result<(), IppStatus> {
    match write_document(printer, id, &format, bytes) {
        Ok(path) => {
            printer.with_job_mut(id, |job| {
                job.document_format = format;
                job.document_path = Some(path);
                job.documents_received += 1;
                if last {
                    job.advance_to_processing();
                    job.complete(SystemTime::now());
                }
            });
            Ok(())
        }
        Err(e) => {
            warn!(job_id = id, error = %e, "failed to spool document");
            printer.with_job_mut(id, |job| job.abort(SystemTime::now()));
            Err(IppStatus::SERVER_ERROR_INTERNAL_ERROR)
        }
    }
}

fn handle_send_document(printer: &Printer, request: &Message, document: &[u8]) -> Message {
    let Some(id) = job_id_from_request(request) else {
        return new_response(request, IppStatus::CLIENT_ERROR_NOT_FOUND);
    };
    let exists = printer.with_job(id, |_| ()).is_some();
    if !exists {
        return new_response(request, IppStatus::CLIENT_ERROR_NOT_FOUND);
    }
    let last = op_bool(request, "last-document").unwrap_or(true);
    let format = op_str(request, "document-format").unwrap_or_else(|| "application/octet-stream".to_string());

    match finish_document(printer, id, format, document, last) {
        Ok(()) => {
            let mut response = new_response(request, IppStatus::SUCCESSFUL_OK);
            printer.with_job(id, |job| {
                response.add(GroupTag::Job, "job-id", Value::Integer(job.id));
                response.add(GroupTag::Job, "job-state", Value::Enum(job.state.ipp_value()));
                response.add(GroupTag::Job, "job-state-reasons", Value::keyword(job.state_reasons()));
            });
            response
        }
        Err(status) => new_response(request, status),
    }
}

fn handle_print_job(printer: &Printer, request: &Message, connection_id: u64, document: &[u8]) -> Message {
    let name = op_str(request, "job-name").unwrap_or_else(|| "untitled".to_string());
    let format = op_str(request, "document-format").unwrap_or_else(|| printer.config.document_format_default().to_string());
    let template = job_template_attributes(request);
    let id = printer.create_job(name, template, connection_id);

    if finish_document(printer, id, format, document, true).is_err() {
        return new_response(request, IppStatus::SERVER_ERROR_INTERNAL_ERROR);
    }

    let mut response = new_response(request, IppStatus::SUCCESSFUL_OK);
    printer.with_job(id, |job| {
        for attr in job_attributes_for_response(job, &printer.printer_uri()) {
            response.add_multi(GroupTag::Job, attr.name.clone(), attr.values.clone());
        }
    });
    info!(job_id = id, "job printed");
    response
}

fn handle_cancel_job(printer: &Printer, request: &Message) -> Message {
    let Some(id) = job_id_from_request(request) else {
        return new_response(request, IppStatus::CLIENT_ERROR_NOT_FOUND);
    };
    match printer.cancel_job(id) {
        Ok(()) => new_response(request, IppStatus::SUCCESSFUL_OK),
        Err(status) => new_response(request, status),
    }
}

fn handle_get_job_attributes(printer: &Printer, request: &Message) -> Message {
    let Some(id) = job_id_from_request(request) else {
        return new_response(request, IppStatus::CLIENT_ERROR_NOT_FOUND);
    };
    let filter = RequestedAttributes::parse(&op_strs(request, "requested-attributes"));
    let printer_uri = printer.printer_uri();
    match printer.with_job(id, |job| job_attributes_for_response(job, &printer_uri)) {
        Some(attrs) => {
            let mut response = new_response(request, IppStatus::SUCCESSFUL_OK);
            for attr in attrs.into_iter().filter(|a| filter.includes(&a.name)) {
                response.add_multi(GroupTag::Job, attr.name, attr.values);
            }
            response
        }
        None => new_response(request, IppStatus::CLIENT_ERROR_NOT_FOUND),
    }
}

fn handle_get_jobs(printer: &Printer, request: &Message) -> Message {
    let which = op_str(request, "which-jobs").unwrap_or_else(|| "not-completed".to_string());
    let limit = op_int(request, "limit").map(|n| n.max(0) as usize);
    let filter = RequestedAttributes::parse(&op_strs(request, "requested-attributes"));
    let printer_uri = printer.printer_uri();

    let jobs = printer.jobs_matching(&which, limit);
    let mut response = new_response(request, IppStatus::SUCCESSFUL_OK);
    for job in &jobs {
        response.group_mut(GroupTag::Job);
        for attr in job_attributes_for_response(job, &printer_uri).into_iter().filter(|a| filter.includes(&a.name)) {
            response.add_multi(GroupTag::Job, attr.name, attr.values);
        }
    }
    response
}

fn handle_get_printer_attributes(printer: &Printer, request: &Message) -> Message {
    let filter = RequestedAttributes::parse(&op_strs(request, "requested-attributes"));
    let mut response = new_response(request, IppStatus::SUCCESSFUL_OK);

    for attr in printer.attributes.iter().filter(|a| filter.includes(&a.name)) {
        response.add_multi(GroupTag::Printer, attr.name.clone(), attr.values.clone());
    }

    let dynamic = dynamic_printer_attributes(printer);
    for attr in dynamic.into_iter().filter(|a| filter.includes(&a.name)) {
        response.add_multi(GroupTag::Printer, attr.name, attr.values);
    }
    response
}

/// Attributes that change between requests, appended after the static set
/// (spec.md §4.3's distinction between identity/capability and status).
fn dynamic_printer_attributes(printer: &Printer) -> Vec<Attribute> {
    vec![
        Attribute::new("printer-state", GroupTag::Printer, Value::Enum(printer.status().ipp_value())),
        Attribute::new_multi(
            "printer-state-reasons",
            GroupTag::Printer,
            printer.state_reasons().into_iter().map(Value::keyword).collect(),
        ),
        Attribute::new("printer-is-accepting-jobs", GroupTag::Printer, Value::Boolean(true)),
        Attribute::new("printer-up-time", GroupTag::Printer, Value::Integer(printer.up_time_seconds())),
        Attribute::new("queued-job-count", GroupTag::Printer, Value::Integer(printer.queued_job_count())),
    ]
}
