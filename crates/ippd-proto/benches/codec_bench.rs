// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the IPP wire codec.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ippd_proto::{decode, encode, Attribute, GroupTag, Message, Value};

/// A minimal Get-Printer-Attributes request: charset, natural language, and
/// a printer-uri, nothing else.
fn minimal_request() -> Message {
    let mut msg = Message::request(1, 1, 0x000b, 42);
    msg.add(GroupTag::Operation, "attributes-charset", Value::charset("utf-8"));
    msg.add(
        GroupTag::Operation,
        "attributes-natural-language",
        Value::natural_language("en"),
    );
    msg.add(GroupTag::Operation, "printer-uri", Value::uri("ipp://localhost:631/ipp/print"));
    msg
}

/// A Print-Job request carrying a job-name and a media-col collection, the
/// kind of request that exercises the collection encode/decode path.
fn request_with_collection() -> Message {
    let mut msg = minimal_request();
    msg.add(GroupTag::Operation, "job-name", Value::name("Benchmark Print Job"));
    let media_col = Value::collection(vec![
        Attribute::new("media-size", GroupTag::Operation, Value::collection(vec![
            Attribute::new("x-dimension", GroupTag::Operation, Value::Integer(21590)),
            Attribute::new("y-dimension", GroupTag::Operation, Value::Integer(27940)),
        ])),
        Attribute::new("media-type", GroupTag::Operation, Value::keyword("stationery")),
    ]);
    msg.add(GroupTag::Job, "media-col", media_col);
    msg
}

/// A Get-Printer-Attributes response with a realistic number of printer
/// attributes, including a multi-valued `document-format-supported`.
fn printer_attributes_response() -> Message {
    let mut msg = Message::response(1, 1, 0x0000, 1);
    msg.add(GroupTag::Operation, "attributes-charset", Value::charset("utf-8"));
    msg.add(
        GroupTag::Operation,
        "attributes-natural-language",
        Value::natural_language("en"),
    );
    msg.add(GroupTag::Printer, "printer-name", Value::name("ippd Virtual Printer"));
    msg.add(GroupTag::Printer, "printer-state", Value::Enum(3));
    msg.add(GroupTag::Printer, "printer-is-accepting-jobs", Value::Boolean(true));
    msg.add(
        GroupTag::Printer,
        "printer-uri-supported",
        Value::uri("ipp://localhost:631/ipp/print"),
    );
    msg.add_multi(
        GroupTag::Printer,
        "document-format-supported",
        vec![
            Value::mime_media_type("application/pdf"),
            Value::mime_media_type("image/jpeg"),
            Value::mime_media_type("image/png"),
            Value::mime_media_type("application/octet-stream"),
        ],
    );
    msg
}

fn bench_encode(c: &mut Criterion) {
    let minimal = minimal_request();
    let with_collection = request_with_collection();
    let response = printer_attributes_response();

    c.bench_function("encode (minimal request)", |b| {
        b.iter(|| black_box(encode(black_box(&minimal))));
    });
    c.bench_function("encode (request with media-col)", |b| {
        b.iter(|| black_box(encode(black_box(&with_collection))));
    });
    c.bench_function("encode (printer attributes response)", |b| {
        b.iter(|| black_box(encode(black_box(&response))));
    });
}

fn bench_decode(c: &mut Criterion) {
    let minimal_bytes = encode(&minimal_request());
    let collection_bytes = encode(&request_with_collection());
    let response_bytes = encode(&printer_attributes_response());

    c.bench_function("decode (minimal request)", |b| {
        b.iter(|| {
            let result = decode(black_box(&minimal_bytes), true);
            assert!(result.is_ok());
        });
    });
    c.bench_function("decode (request with media-col)", |b| {
        b.iter(|| {
            let result = decode(black_box(&collection_bytes), true);
            assert!(result.is_ok());
        });
    });
    c.bench_function("decode (printer attributes response)", |b| {
        b.iter(|| {
            let result = decode(black_box(&response_bytes), false);
            assert!(result.is_ok());
        });
    });
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
