// Aggregation performance benchmarks.
//
// Run with: cargo bench --bench aggregate
//
// Performance Targets:
// | Operation             | Target   | Description                         |
// |-----------------------|----------|-------------------------------------|
// | Daily grouping (50k)  | < 20ms   | 50k PR rows into (author, day)      |
// | Gap fill (10 x 365)   | < 2ms    | Cartesian fill for one year         |
// | Rolling mean (365)    | < 100us  | Centered window of 21               |
// | Full report (50k)     | < 100ms  | Filter, group, fill, smooth, summary|

use chrono::{Duration, NaiveDate, NaiveDateTime};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use engage_report::aggregate::{
    AuthorFilter, TrendOptions, build_report, daily_pr_aggregates, gap_fill, rolling_mean,
    top_authors,
};
use engage_report::ingest::Loaded;
use engage_report::model::{PullRequestRecord, ReviewComment};
use engage_report::util::date_range;
use std::hint::black_box;

const AUTHORS: [&str; 12] = [
    "alice", "bob", "carol", "dave", "erin", "frank", "grace", "heidi", "ivan", "judy",
    "dependabot[bot]", "github-actions",
];

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date")
}

fn at(offset: usize) -> NaiveDateTime {
    let day = start() + Duration::days(i64::try_from(offset % 365).expect("fits i64"));
    day.and_hms_opt(u32::try_from(offset % 24).expect("fits u32"), 0, 0)
        .expect("valid time")
}

fn pull_requests(count: usize) -> Vec<PullRequestRecord> {
    (0..count)
        .map(|i| PullRequestRecord {
            author: AUTHORS[i % AUTHORS.len()].to_string(),
            merged_at: at(i * 7),
            number: i.to_string(),
            lines_changed: (i % 500) as u64 + 1,
        })
        .collect()
}

fn comments(count: usize) -> Vec<ReviewComment> {
    (0..count)
        .map(|i| ReviewComment {
            author: AUTHORS[(i * 3) % AUTHORS.len()].to_string(),
            created_at: at(i * 5),
            comment_type: if i % 4 == 0 { "review" } else { "issue" }.to_string(),
            id: i.to_string(),
        })
        .collect()
}

fn options() -> TrendOptions {
    TrendOptions {
        start: start(),
        end: start() + Duration::days(364),
        top_n: 10,
        team_window: 14,
        developer_window: 21,
        min_periods: 3,
    }
}

fn bench_daily_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("daily_grouping");
    for size in [1_000, 10_000, 50_000] {
        let prs = pull_requests(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &prs, |b, prs| {
            b.iter(|| black_box(daily_pr_aggregates(prs)));
        });
    }
    group.finish();
}

fn bench_gap_fill(c: &mut Criterion) {
    let prs = pull_requests(10_000);
    let daily = daily_pr_aggregates(&prs);
    let authors = top_authors(&daily, 10);
    let dates = date_range(options().start, options().end);

    c.bench_function("gap_fill/10x365", |b| {
        b.iter(|| black_box(gap_fill(&daily, &authors, &dates)));
    });
}

fn bench_rolling_mean(c: &mut Criterion) {
    let mut group = c.benchmark_group("rolling_mean");
    for window in [14, 21] {
        let values: Vec<Option<f64>> = (0..365).map(|i| Some(f64::from(i % 7))).collect();
        group.bench_with_input(BenchmarkId::from_parameter(window), &values, |b, values| {
            b.iter(|| black_box(rolling_mean(values, window, 3)));
        });
    }
    group.finish();
}

fn bench_full_report(c: &mut Criterion) {
    let filter = AuthorFilter::new(
        &["judy".to_string()],
        &["bot".to_string(), "github-actions".to_string()],
    )
    .expect("valid filter");
    let options = options();
    let mut group = c.benchmark_group("build_report");
    group.sample_size(20);
    for size in [10_000, 50_000] {
        let prs = pull_requests(size);
        let comments = comments(size * 2);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(BenchmarkId::from_parameter(size), |b| {
            b.iter(|| {
                let report = build_report(
                    Loaded {
                        records: prs.clone(),
                        malformed: 0,
                    },
                    Loaded {
                        records: comments.clone(),
                        malformed: 0,
                    },
                    &filter,
                    &options,
                );
                black_box(report)
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_daily_grouping,
    bench_gap_fill,
    bench_rolling_mean,
    bench_full_report
);
criterion_main!(benches);
