use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use work_dispatcher::prelude::*;
use work_dispatcher::queue::{Dequeued, WorkQueue};

fn counting_dispatcher(workers: usize, counter: Arc<AtomicU64>) -> Dispatcher<u64> {
    Dispatcher::from_fn(workers, move |_, item: &WorkItem<u64>| {
        counter.fetch_add(black_box(*item.payload()), Ordering::Relaxed);
        Ok(())
    })
    .expect("Failed to create dispatcher")
}

fn benchmark_dispatcher_lifecycle(c: &mut Criterion) {
    c.bench_function("dispatcher_start_stop_4", |b| {
        b.iter(|| {
            let dispatcher: Dispatcher<()> =
                Dispatcher::new(4, SimulatedProcessor::default()).expect("Failed to create dispatcher");
            dispatcher.stop();
        });
    });
}

fn benchmark_queue_push_pop(c: &mut Criterion) {
    c.bench_function("queue_push_pop_1000", |b| {
        b.iter(|| {
            let queue = WorkQueue::new();
            for i in 0..1000 {
                queue.push(WorkItem::new(i, i)).expect("queue is running");
            }
            queue.shutdown();
            let mut sum = 0u64;
            while let Dequeued::Item(item) = queue.pop_blocking() {
                sum += item.into_payload();
            }
            black_box(sum);
        });
    });
}

fn benchmark_concurrent_submission(c: &mut Criterion) {
    c.bench_function("concurrent_submission_4_threads", |b| {
        b.iter_batched(
            || {
                let counter = Arc::new(AtomicU64::new(0));
                Arc::new(counting_dispatcher(4, counter))
            },
            |dispatcher| {
                let handles: Vec<_> = (0..4u64)
                    .map(|caller| {
                        let dispatcher = Arc::clone(&dispatcher);
                        std::thread::spawn(move || {
                            for n in 0..250 {
                                dispatcher.submit(WorkItem::new(caller * 1_000 + n, 1));
                            }
                        })
                    })
                    .collect();

                for handle in handles {
                    handle.join().expect("Thread panicked");
                }
                dispatcher.stop();
            },
            BatchSize::SmallInput,
        );
    });
}

fn benchmark_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");
    group.measurement_time(Duration::from_secs(10));

    for workers in [1usize, 4, 8] {
        group.bench_function(format!("items_per_second_{}_workers", workers), |b| {
            b.iter_batched(
                || {
                    let counter = Arc::new(AtomicU64::new(0));
                    (counting_dispatcher(workers, Arc::clone(&counter)), counter)
                },
                |(dispatcher, counter)| {
                    for i in 0..1000 {
                        dispatcher.submit(WorkItem::new(i, 1));
                    }
                    dispatcher.stop();

                    let total = counter.load(Ordering::Relaxed);
                    assert_eq!(total, 1000, "Not all items processed");
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_dispatcher_lifecycle,
    benchmark_queue_push_pop,
    benchmark_concurrent_submission,
    benchmark_throughput
);
criterion_main!(benches);
