// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ippd_proto::{GroupTag, Message, Value};
use ippd_server::config::ServerConfig;
use ippd_server::dispatch::{dispatch, operation};
use ippd_server::printer::Printer;

fn test_printer() -> Printer {
    let mut config = ServerConfig::new("bench-printer");
    config.spool_dir = std::env::temp_dir().join("ippd-bench-spool");
    Printer::new(config, "localhost".into(), 8631)
}

fn get_printer_attributes_request() -> Message {
    let mut request = Message::request(1, 1, operation::GET_PRINTER_ATTRIBUTES, 1);
    request.add(GroupTag::Operation, "attributes-charset", Value::charset("utf-8"));
    request.add(GroupTag::Operation, "attributes-natural-language", Value::natural_language("en"));
    request
}

fn print_job_request() -> Message {
    let mut request = Message::request(1, 1, operation::PRINT_JOB, 2);
    request.add(GroupTag::Operation, "attributes-charset", Value::charset("utf-8"));
    request.add(GroupTag::Operation, "attributes-natural-language", Value::natural_language("en"));
    request.add(GroupTag::Operation, "job-name", Value::name("bench job"));
    request.add(GroupTag::Operation, "document-format", Value::mime_media_type("application/pdf"));
    request
}

fn bench_get_printer_attributes(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let printer = test_printer();
    c.bench_function("dispatch get-printer-attributes", |b| {
        b.iter(|| {
            rt.block_on(dispatch(black_box(&printer), get_printer_attributes_request(), 1, &[]))
        })
    });
}

fn bench_print_job(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let printer = test_printer();
    let document = vec![0u8; 4096];
    c.bench_function("dispatch print-job", |b| {
        b.iter(|| {
            rt.block_on(dispatch(black_box(&printer), print_job_request(), 1, black_box(&document)))
        })
    });
}

criterion_group!(benches, bench_get_printer_attributes, bench_print_job);
criterion_main!(benches);
