#[macro_use]
extern crate criterion;

use bytes::Bytes;
use criterion::{black_box, Criterion};
use pg_wire_protocol::{BackendMessage, ErrorFields};

fn criterion_benchmark(c: &mut Criterion) {
    // NOTE: This is the field list sans the outer tag/length header, as
    // `BackendMessage::parse`/`ErrorFields::decode` receive it.
    const NOTICE_RESPONSE: &[u8]  = b"SNOTICE\0VNOTICE\0C42710\0Mextension \"uuid-ossp\" already exists, skipping\0Fextension.c\0L1656\0RCreateExtension\0\0";

    c.bench_function("decode NoticeResponse via BackendMessage::parse", |b| {
        b.iter(|| {
            let _ = BackendMessage::parse(black_box(b'N'), black_box(NOTICE_RESPONSE)).unwrap();
        })
    });

    c.bench_function("decode ErrorFields directly", |b| {
        b.iter(|| {
            let _ = ErrorFields::decode(black_box(Bytes::from_static(NOTICE_RESPONSE))).unwrap();
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
