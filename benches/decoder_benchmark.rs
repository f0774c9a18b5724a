//! Input decoder benchmark: measure key decoding throughput.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use pagewheel::input::{decode, Decode, Decoder};
use pagewheel::{KeyToken, ScriptedSource};
use std::time::Duration;

/// Typing mixed with arrows, mouse clicks and control keys.
fn mixed_input(repeat: usize) -> Vec<u8> {
    let chunk: &[u8] = b"hello\x1b[A\x1b[B\x1b[<0;12;5m\x03\r\x1bOC\x1b[3~wor\tld";
    chunk.repeat(repeat)
}

fn decode_all(bytes: &[u8]) -> usize {
    let mut offset = 0;
    let mut tokens = 0;
    while offset < bytes.len() {
        match decode(&bytes[offset..]) {
            Decode::Token { consumed, .. } => {
                offset += consumed;
                tokens += 1;
            }
            Decode::Skip(consumed) => offset += consumed,
            Decode::Empty | Decode::Incomplete => break,
        }
    }
    tokens
}

fn decode_mixed(c: &mut Criterion) {
    let input = mixed_input(256);
    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(input.len() as u64));
    group.bench_function("mixed_input", |b| b.iter(|| decode_all(black_box(&input))));
    group.finish();
}

fn drain_held_arrow(c: &mut Criterion) {
    let held = b"\x1b[B".repeat(500);

    c.bench_function("decoder_drain_500_repeats", |b| {
        b.iter(|| {
            let source = ScriptedSource::closing().bytes(&held);
            let mut decoder = Decoder::new(source, 3, Duration::ZERO);
            let first = decoder.next_token(Duration::ZERO);
            assert_eq!(first, KeyToken::Down);
            black_box(decoder.next_token(Duration::ZERO))
        })
    });
}

criterion_group!(benches, decode_mixed, drain_held_arrow);
criterion_main!(benches);
