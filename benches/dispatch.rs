use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use slirc_client::handlers::handler_fn;
use slirc_client::{EventKind, HandlerCache, HandlerTable, handler_name, parse_origin};

// Hot paths on every dispatched event: splitting the origin and finding the
// handler for an event kind.

fn origin_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("origin");
    let origin = "sender!~user@host.example.net";
    group.throughput(Throughput::Bytes(origin.len() as u64));

    group.bench_function("parse_full", |b| b.iter(|| parse_origin(black_box(origin))));
    group.bench_function("parse_server", |b| {
        b.iter(|| parse_origin(black_box("irc.example.net")))
    });

    group.finish();
}

fn handler_name_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("handler_name");
    group.throughput(Throughput::Elements(1));

    group.bench_function("derive_command", |b| {
        b.iter(|| handler_name(black_box("CHANNEL_NOTICE")))
    });

    group.finish();
}

fn resolve_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    group.throughput(Throughput::Elements(1));

    let mut cache = HandlerCache::new();
    cache.bind(EventKind::Privmsg, handler_fn(|_ctx, _event| Ok(())));
    group.bench_function("bound_hit", |b| {
        b.iter(|| cache.resolve(black_box(EventKind::Privmsg)))
    });
    group.bench_function("miss", |b| b.iter(|| cache.resolve(black_box(EventKind::Topic))));

    let mut table = HandlerTable::new();
    for kind in EventKind::ALL {
        table.insert(kind.handler_name(), handler_fn(|_ctx, _event| Ok(())));
    }
    let mut sourced = HandlerCache::new();
    sourced.set_source(Box::new(table));
    group.bench_function("sourced_memo", |b| {
        b.iter(|| sourced.resolve(black_box(EventKind::Join)))
    });

    group.finish();
}

criterion_group!(benches, origin_benchmark, handler_name_benchmark, resolve_benchmark);
criterion_main!(benches);
