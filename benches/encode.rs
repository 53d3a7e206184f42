#[macro_use]
extern crate criterion;

use criterion::Criterion;
use pg_wire_protocol::{Encode, ErrorFieldsBuilder};

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("encode ErrorFields(Builder)", |b| {
        let mut dst = Vec::new();
        b.iter(|| {
            dst.truncate(0);
            let fields = ErrorFieldsBuilder::new()
                .severity("NOTICE")
                .code("42710")
                .message("extension \"uuid-ossp\" already exists, skipping")
                .file("extension.c")
                .line(1656)
                .routine("CreateExtension")
                .build();
            fields.encode(&mut dst);
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
