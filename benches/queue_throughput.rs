use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use strand_rs::{BlockingQueue, MessageBlock, PartitionedQueue, QueueStrategy};

fn bench_single_queue_roundtrip(c: &mut Criterion) {
    let queue = BlockingQueue::new();

    c.bench_function("single_queue_roundtrip_1k", |b| {
        b.iter(|| {
            for seq in 0u64..1_000 {
                queue.push_back(MessageBlock::from_slice(&seq.to_le_bytes()));
            }
            while queue.try_pop_front().is_some() {}
        })
    });
}

fn bench_partitioned_push(c: &mut Criterion) {
    let queue = PartitionedQueue::default();
    queue.init(8, Arc::new(|| Some(0)));

    c.bench_function("partitioned_push_1k", |b| {
        b.iter(|| {
            for key in 0u64..1_000 {
                queue
                    .push(key, MessageBlock::from_slice(&key.to_le_bytes()))
                    .unwrap();
            }
            queue.clear();
        })
    });
}

criterion_group!(benches, bench_single_queue_roundtrip, bench_partitioned_push);
criterion_main!(benches);
