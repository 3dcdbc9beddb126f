use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use evidentia::prelude::*;
use polars::prelude::*;
use rand::prelude::*;

const EVENTS: [&str; 4] = ["login", "logout", "file_access", "network"];
const USERS: [&str; 5] = ["u1", "u2", "u3", "u4", "u5"];

fn create_evidence(n_rows: usize) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(7);

    let events: Vec<&str> = (0..n_rows).map(|_| EVENTS[rng.gen_range(0..EVENTS.len())]).collect();
    let users: Vec<&str> = (0..n_rows).map(|_| USERS[rng.gen_range(0..USERS.len())]).collect();
    let descriptions: Vec<&str> = (0..n_rows)
        .map(|_| {
            if rng.gen_bool(0.05) {
                "suspicious transfer to 10.0.0.1:8080"
            } else {
                "routine activity"
            }
        })
        .collect();
    let bytes: Vec<f64> = (0..n_rows).map(|_| rng.gen::<f64>() * 2000.0).collect();

    DataFrame::new(vec![
        Series::new("event_type".into(), events).into_column(),
        Series::new("user_id".into(), users).into_column(),
        Series::new("description".into(), descriptions).into_column(),
        Series::new("bytes".into(), bytes).into_column(),
    ])
    .unwrap()
}

fn bench_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("scoring");
    group.sample_size(10);

    for n_rows in [1000, 5000, 10000].iter() {
        let df = create_evidence(*n_rows);
        let pipeline = ScoringPipeline::new(ScoringConfig::default().with_contamination(0.05)).unwrap();

        group.bench_with_input(BenchmarkId::new("score", n_rows), &df, |b, df| {
            b.iter(|| pipeline.score(black_box(df)).unwrap())
        });
    }

    group.finish();
}

fn bench_report(c: &mut Criterion) {
    let df = create_evidence(10000);
    let scored = ScoringPipeline::new(ScoringConfig::default().with_contamination(0.05))
        .unwrap()
        .score(&df)
        .unwrap()
        .scored;
    let entities = df!("entity" => &["IP:10.0.0.1", "HOST:ws-07", "IP:10.0.0.1"]).unwrap();
    let aggregator = Aggregator::new(&ReportConfig::default());

    c.bench_function("aggregate_10000", |b| {
        b.iter(|| aggregator.aggregate(black_box(&scored), black_box(&entities)).unwrap())
    });
}

criterion_group!(benches, bench_scoring, bench_report);
criterion_main!(benches);
