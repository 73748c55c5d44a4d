use chatstream::sink::Sink;
use chatstream::stream::OStream;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_fanout_write(c: &mut Criterion) {
    let root = OStream::new(3);
    root.set_prefix("bench: ");
    let mut buffers = Vec::new();
    for i in 0..4 {
        let (sink, buffer) = Sink::memory(&format!("sink{i}"));
        root.connect_sink(&sink);
        buffers.push(buffer);
    }

    c.bench_function("fanout_write_4_sinks", |b| {
        b.iter(|| {
            root.write(black_box("value ")).write(black_box(42)).endl();
            for buffer in &buffers {
                buffer.clear();
            }
        })
    });
}

fn bench_forwarding_chain(c: &mut Criterion) {
    // Worst case: a long chain of forwarding streams ending in one sink.
    let (sink, buffer) = Sink::memory("tail");
    let tail = OStream::new(u32::MAX);
    tail.connect_sink(&sink);
    let mut head = tail;
    for _ in 0..10 {
        let next = OStream::new(u32::MAX);
        next.connect_stream(&head).unwrap();
        head = next;
    }

    c.bench_function("forwarding_chain_10", |b| {
        b.iter(|| {
            head.write(black_box(3.25)).endl();
            buffer.clear();
        })
    });
}

fn bench_suppressed_write(c: &mut Criterion) {
    let (sink, _buffer) = Sink::memory("quiet");
    let stream = OStream::new(1);
    stream.connect_sink(&sink);
    stream.set_chatter(5);

    c.bench_function("suppressed_write", |b| {
        b.iter(|| {
            stream.write(black_box("never shown")).endl();
        })
    });
}

criterion_group!(benches, bench_fanout_write, bench_forwarding_chain, bench_suppressed_write);
criterion_main!(benches);
