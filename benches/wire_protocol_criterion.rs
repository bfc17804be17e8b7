use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use plum_bridge::channel::wire_protocol::{parse_command, parse_result_line, LineBuffer};

const RESULT_LINES: &[(&str, &str)] = &[
    ("bare", "e2e4"),
    ("bestmove", "bestmove e7e5"),
    ("promotion", "bestmove a7a8q"),
    (
        "info_pv",
        "info depth 12 seldepth 18 score cp 34 nodes 1843221 nps 912000 pv g1f3",
    ),
];

const SEARCH_STREAM: &[u8] = b"info depth 1 pv e2e4\ninfo depth 2 pv e2e4 e7e5\n\
info depth 3 pv d2d4 d7d5 c2c4\ninfo depth 4 pv d2d4 d7d5 c2c4 e7e6\nbestmove d2d4\nstop\n";

fn bench_wire_protocol(c: &mut Criterion) {
    let mut group = c.benchmark_group("wire_protocol");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    for (name, line) in RESULT_LINES {
        parse_result_line(line).expect("benchmark line should parse");
        group.bench_with_input(BenchmarkId::new("parse_result_line", name), line, |b, line| {
            b.iter(|| black_box(parse_result_line(black_box(line)).expect("parse")));
        });
    }

    // Split mid-line so the carry-over path is measured too.
    let (head, tail) = SEARCH_STREAM.split_at(SEARCH_STREAM.len() / 2);
    let mut guard = LineBuffer::new();
    let mut framed = guard.push(head);
    framed.extend(guard.push(tail));
    assert_eq!(framed.len(), 6, "search stream should frame into six lines");

    group.bench_function("line_buffer_split_search_stream", |b| {
        b.iter(|| {
            let mut buffer = LineBuffer::new();
            let mut lines = buffer.push(black_box(head));
            lines.extend(buffer.push(black_box(tail)));
            black_box(lines)
        });
    });

    group.bench_function("parse_command_mix", |b| {
        b.iter(|| {
            for line in ["ponder", "stop", "11,27,NONE", "55,63,q", "start 4090L"] {
                black_box(parse_command(black_box(line)).expect("parse"));
            }
        });
    });

    group.finish();
}

criterion_group!(wire_benches, bench_wire_protocol);
criterion_main!(wire_benches);
