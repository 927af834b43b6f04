// ABOUTME: Criterion benchmarks for the hot codec paths
// ABOUTME: submit_sm encode, full-frame decode, GSM7 encoding and long-message splitting

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use esme::codec::Encodable;
use esme::datatypes::{NumericPlanIndicator, SmeAddress, SubmitSm, TypeOfNumber};
use esme::pdu::Pdu;
use esme::sar;
use esme::text::{gsm7, Text};

fn sample_submit_sm() -> SubmitSm {
    SubmitSm::builder()
        .sequence_number(1)
        .source(
            SmeAddress::new("12345").unwrap(),
            TypeOfNumber::International,
            NumericPlanIndicator::Isdn,
        )
        .destination(
            SmeAddress::new("5511999999999").unwrap(),
            TypeOfNumber::International,
            NumericPlanIndicator::Isdn,
        )
        .payload(0x00, Bytes::from_static(b"Hello World from the benchmark"))
        .build()
        .unwrap()
}

fn bench_encode(c: &mut Criterion) {
    let pdu = sample_submit_sm();
    c.bench_function("submit_sm_encode", |b| {
        b.iter(|| black_box(&pdu).to_bytes().unwrap())
    });
}

fn bench_decode(c: &mut Criterion) {
    let bytes = sample_submit_sm().to_bytes().unwrap();
    c.bench_function("submit_sm_decode", |b| {
        b.iter(|| Pdu::parse(black_box(&bytes)).unwrap())
    });
}

fn bench_gsm7(c: &mut Criterion) {
    let mut group = c.benchmark_group("gsm7");
    for len in [20usize, 160, 1000] {
        let text: String = "Lorem ipsum dolor sit amet ".chars().cycle().take(len).collect();
        group.bench_with_input(BenchmarkId::new("encode", len), &text, |b, text| {
            b.iter(|| gsm7::encode(black_box(text)))
        });
        let septets = gsm7::encode(&text);
        group.bench_with_input(BenchmarkId::new("pack", len), &septets, |b, septets| {
            b.iter(|| gsm7::pack(black_box(septets), 0))
        });
    }
    group.finish();
}

fn bench_split(c: &mut Criterion) {
    let text: String = "Lorem ipsum dolor sit amet "
        .chars()
        .cycle()
        .take(1000)
        .collect();
    let text = Text::Gsm7(text);
    c.bench_function("split_1000_chars", |b| {
        b.iter(|| sar::split_message(black_box(&text), 42).unwrap())
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_gsm7, bench_split);
criterion_main!(benches);
