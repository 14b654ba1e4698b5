use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

use pairline::signaling::{ClientMessage, ConnectionId, Matchmaker};

/// join pairing benchmark
fn bench_pairing(c: &mut Criterion) {
    let a = ConnectionId::generate();
    let b = ConnectionId::generate();

    let mut group = c.benchmark_group("Pairing");
    group.throughput(Throughput::Elements(2));

    group.bench_function("join_join_cleanup", |bench| {
        let mut mm = Matchmaker::new();
        bench.iter(|| {
            mm.join(black_box(a));
            let notes = mm.join(black_box(b));
            black_box(&notes);
            black_box(mm.cleanup(black_box(a)));
        })
    });

    group.finish();
}

/// a lone waiter cancelling and re-joining
fn bench_waiting_cancel(c: &mut Criterion) {
    let a = ConnectionId::generate();

    let mut group = c.benchmark_group("WaitingCancel");
    group.throughput(Throughput::Elements(1));

    group.bench_function("join_cleanup", |bench| {
        let mut mm = Matchmaker::new();
        bench.iter(|| {
            mm.join(black_box(a));
            black_box(mm.cleanup(black_box(a)));
        })
    });

    group.finish();
}

/// client frame parsing benchmark
fn bench_parse_signal(c: &mut Criterion) {
    let frame = r#"{"type":"ice-candidate","target":"conn_0123456789abcdef","candidate":{"candidate":"candidate:1 1 udp 2122260223 192.168.1.100 54321 typ host","sdpMid":"0","sdpMLineIndex":0}}"#;

    let mut group = c.benchmark_group("Parsing");
    group.throughput(Throughput::Elements(1));

    group.bench_function("ClientMessage", |bench| {
        bench.iter(|| {
            let msg: ClientMessage = serde_json::from_str(black_box(frame)).unwrap();
            black_box(msg)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_pairing, bench_waiting_cancel, bench_parse_signal);
criterion_main!(benches);
