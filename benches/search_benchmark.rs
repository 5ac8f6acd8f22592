use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use social_planner::models::UserProfile;
use social_planner::services::social::{search_profiles, SEARCH_SCAN_LIMIT};

fn benchmark_search(c: &mut Criterion) {
    let now = Utc::now();
    let names = ["Alice", "Bob", "Carol", "Dave", "Erin", "Frank", "Grace"];

    // One full scan batch, as fetched per search
    let profiles: Vec<UserProfile> = (0..SEARCH_SCAN_LIMIT as usize)
        .map(|i| {
            let name = format!("{} {}", names[i % names.len()], i);
            UserProfile::new(
                &format!("uid-{i}"),
                Some(&name),
                &format!("user{i}@example.com"),
                false,
                now,
            )
        })
        .collect();
    let following: Vec<String> = (0..50).map(|i| format!("uid-{}", i * 2)).collect();

    let mut group = c.benchmark_group("user_search");

    group.bench_function("common_prefix", |b| {
        b.iter(|| search_profiles(black_box(&profiles), "uid-0", &following, black_box("al")))
    });

    group.bench_function("exact_email", |b| {
        b.iter(|| {
            search_profiles(
                black_box(&profiles),
                "uid-0",
                &following,
                black_box("user42@example.com"),
            )
        })
    });

    group.bench_function("no_match", |b| {
        b.iter(|| search_profiles(black_box(&profiles), "uid-0", &following, black_box("zzz")))
    });

    group.finish();
}

criterion_group!(benches, benchmark_search);
criterion_main!(benches);
