// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end scenarios spanning the proto codec, the printer catalog, and the
// dispatcher together (spec.md §8).

use ippd_proto::{decode, encode, GroupTag, Message, MessageKind, Value};
use ippd_server::config::ServerConfig;
use ippd_server::dispatch::{dispatch, operation};
use ippd_server::printer::Printer;
use ippd_server::status::IppStatus;

fn printer() -> Printer {
    let mut config = ServerConfig::new("integration-printer");
    config.make = "Acme".to_string();
    config.model = "LaserPro 9000".to_string();
    config.spool_dir = std::env::temp_dir().join(format!("ippd-it-{}-{}", std::process::id(), line!()));
    Printer::new(config, "printer.local".into(), 8631)
}

fn request(operation_id: u16, request_id: u32) -> Message {
    let mut msg = Message::request(1, 1, operation_id, request_id);
    msg.add(GroupTag::Operation, "attributes-charset", Value::charset("utf-8"));
    msg.add(GroupTag::Operation, "attributes-natural-language", Value::natural_language("en"));
    msg.add(GroupTag::Operation, "printer-uri", Value::uri("ipp://printer.local:8631/ipp"));
    msg
}

/// Discovery + attribute retrieval: a client fetches the printer's
/// capabilities and finds the shared identity across uri-supported, icons,
/// and more-info (spec.md §8 invariant).
#[tokio::test]
async fn discovery_reports_consistent_identity_across_attributes() {
    let printer = printer();
    let req = request(operation::GET_PRINTER_ATTRIBUTES, 1);
    let wire = encode(&req);
    let decoded = decode(&wire, true).unwrap();

    let response = dispatch(&printer, decoded, 1, &[]).await;
    let response_wire = encode(&response);
    let response = decode(&response_wire, false).unwrap();

    assert_eq!(response.kind, MessageKind::Response(IppStatus::SUCCESSFUL_OK.code()));
    let find = |name: &str| response.find(name, Some(GroupTag::Printer)).unwrap().first().unwrap().as_str().unwrap();
    assert!(find("printer-uri-supported").contains("printer.local:8631"));
    assert!(find("printer-icons").contains("printer.local:8631"));
    assert!(find("printer-more-info").contains("printer.local:8631"));
    assert!(find("printer-device-id").contains("Acme"));
}

/// Print-Job round trip: job lands in the spool directory and is reported
/// completed.
#[tokio::test]
async fn print_job_round_trip_writes_spool_file() {
    let printer = printer();
    let mut req = request(operation::PRINT_JOB, 2);
    req.add(GroupTag::Operation, "job-name", Value::name("quarterly-report"));
    req.add(GroupTag::Operation, "document-format", Value::mime_media_type("application/pdf"));

    let document = b"%PDF-1.4 not a real pdf".to_vec();
    let response = dispatch(&printer, req, 7, &document).await;

    assert_eq!(response.kind, MessageKind::Response(IppStatus::SUCCESSFUL_OK.code()));
    let id = response.find("job-id", Some(GroupTag::Job)).unwrap().first().unwrap().as_integer().unwrap();
    let spooled = printer.config.spool_dir.join(format!("{id}.pdf"));
    assert!(spooled.exists());
    assert_eq!(std::fs::read(&spooled).unwrap(), document);
}

/// Create-Job followed by Send-Document, mirroring a client that streams the
/// document in a second request.
#[tokio::test]
async fn create_then_send_document_completes_the_job() {
    let printer = printer();
    let create = dispatch(&printer, request(operation::CREATE_JOB, 3), 1, &[]).await;
    let id = create.find("job-id", Some(GroupTag::Job)).unwrap().first().unwrap().as_integer().unwrap();

    let mut send = request(operation::SEND_DOCUMENT, 4);
    send.add(GroupTag::Operation, "job-id", Value::Integer(id));
    send.add(GroupTag::Operation, "document-format", Value::mime_media_type("image/jpeg"));
    send.add(GroupTag::Operation, "last-document", Value::Boolean(true));

    let response = dispatch(&printer, send, 1, b"jpeg-bytes").await;
    assert_eq!(response.kind, MessageKind::Response(IppStatus::SUCCESSFUL_OK.code()));

    let mut get = request(operation::GET_JOB_ATTRIBUTES, 5);
    get.add(GroupTag::Operation, "job-id", Value::Integer(id));
    let status = dispatch(&printer, get, 1, &[]).await;
    let state = status.find("job-state", Some(GroupTag::Job)).unwrap().first().unwrap().as_integer().unwrap();
    assert_eq!(state, ippd_server::job::JobState::Completed.ipp_value());
}

/// Cancelling a pending job is immediately terminal and reported as such by
/// a follow-up Get-Job-Attributes.
#[tokio::test]
async fn cancel_pending_job_then_query_reports_canceled() {
    let printer = printer();
    let create = dispatch(&printer, request(operation::CREATE_JOB, 6), 1, &[]).await;
    let id = create.find("job-id", Some(GroupTag::Job)).unwrap().first().unwrap().as_integer().unwrap();

    let mut cancel = request(operation::CANCEL_JOB, 7);
    cancel.add(GroupTag::Operation, "job-id", Value::Integer(id));
    let response = dispatch(&printer, cancel, 1, &[]).await;
    assert_eq!(response.kind, MessageKind::Response(IppStatus::SUCCESSFUL_OK.code()));

    let mut get = request(operation::GET_JOB_ATTRIBUTES, 8);
    get.add(GroupTag::Operation, "job-id", Value::Integer(id));
    let status = dispatch(&printer, get, 1, &[]).await;
    let state = status.find("job-state", Some(GroupTag::Job)).unwrap().first().unwrap().as_integer().unwrap();
    assert_eq!(state, ippd_server::job::JobState::Canceled.ipp_value());
}

/// Validate-Job with an unsupported document format echoes the offending
/// attribute back in the unsupported-attributes group.
#[tokio::test]
async fn validate_job_echoes_unsupported_attribute() {
    let printer = printer();
    let mut req = request(operation::VALIDATE_JOB, 9);
    req.add(GroupTag::Operation, "document-format", Value::mime_media_type("application/x-bogus"));
    let response = dispatch(&printer, req, 1, &[]).await;
    assert_eq!(
        response.kind,
        MessageKind::Response(IppStatus::CLIENT_ERROR_ATTRIBUTES_OR_VALUES_NOT_SUPPORTED.code())
    );
    let echoed = response.find("document-format", Some(GroupTag::Unsupported)).unwrap();
    assert_eq!(echoed.first().unwrap().as_str(), Some("application/x-bogus"));
}

/// A printer-uri that doesn't match this printer's own is not-found, not a
/// silent fallthrough.
#[tokio::test]
async fn mismatched_printer_uri_is_not_found() {
    let printer = printer();
    let mut req = Message::request(1, 1, operation::GET_PRINTER_ATTRIBUTES, 10);
    req.add(GroupTag::Operation, "attributes-charset", Value::charset("utf-8"));
    req.add(GroupTag::Operation, "attributes-natural-language", Value::natural_language("en"));
    req.add(GroupTag::Operation, "printer-uri", Value::uri("ipp://somewhere-else:631/ipp"));
    let response = dispatch(&printer, req, 1, &[]).await;
    assert_eq!(response.kind, MessageKind::Response(IppStatus::CLIENT_ERROR_NOT_FOUND.code()));
}
