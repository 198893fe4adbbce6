//! Boxed vs flat vs mapped showdown on the small profile.
//!
//! Demonstrates: build config → compare all three store kinds → map a
//! sparse file read-only and time cold/hot access to its last vector →
//! sequential vs shuffled traversal → cycle stress scenarios.
//!
//! Set `RUST_LOG=stride_store=debug,stride_bench=debug` to see lifecycle
//! events.

use stride_bench::{
    reference_scenarios, small_profile, stress, AccessOrder, BenchmarkRunner, FixedFactory,
    MappedFactory, ProcessMemoryProbe, StoreFactory,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Stride Vector Store Showdown ===\n");

    let config = small_profile();
    let dir = tempfile::tempdir().unwrap();
    let mut runner = BenchmarkRunner::new(config.clone())
        .unwrap()
        .with_probe(ProcessMemoryProbe::new());

    // --- Create / random access / range sum ---
    println!(
        "{} vectors x {} dims, fill {}",
        config.capacity, config.dim, config.fill_value
    );
    let runs = runner.compare(&dir.path().join("showdown.bin")).unwrap();
    for run in &runs {
        println!("\n[{}] footprint {:.1} MB", run.kind, mb(run.footprint_bytes as u64));
        for record in &run.records {
            let delta = record
                .resident_delta_bytes()
                .map(|d| format!("{:+.1} MB", d as f64 / 1e6))
                .unwrap_or_else(|| "n/a".to_string());
            println!(
                "  {:<14} {:>12.6}s  rss {}",
                record.operation.to_string(),
                record.elapsed_seconds,
                delta,
            );
        }
    }

    // --- Page faults: map a sparse file, then first touch vs second ---
    println!("\nMapped cold vs hot access:");
    let sparse = MappedFactory::read_only(dir.path().join("cold.bin"));
    sparse.prepare_sparse(&config).unwrap();
    let (mapped, records) = runner.run_with_store(&sparse).unwrap();
    let open = &records[0];
    println!(
        "  map   {:>12.9}s  rss {}",
        open.elapsed_seconds,
        open.resident_delta_bytes()
            .map(|d| format!("{:+.1} MB", d as f64 / 1e6))
            .unwrap_or_else(|| "n/a".to_string()),
    );
    let last = config.capacity - 1;
    let [cold, hot] = runner.access_profile(&mapped, last).unwrap();
    println!("  cold  {:>12.9}s", cold.elapsed_seconds);
    println!("  hot   {:>12.9}s", hot.elapsed_seconds);
    println!("  last[0] = {}", mapped.read(last).unwrap()[0]);
    drop(mapped);

    // --- Traversal order ---
    println!("\nFixed store traversal:");
    let fixed = FixedFactory.create(&config).unwrap();
    for order in [
        AccessOrder::Sequential,
        AccessOrder::Shuffled { seed: config.seed },
    ] {
        let (total, record) = runner.traverse(&fixed, order).unwrap();
        println!(
            "  {:<32} {:>10.6}s  total={}",
            format!("{order:?}"),
            record.elapsed_seconds,
            total
        );
    }

    // --- Reclamation ---
    println!("\nCycle stress (1M nodes):");
    for scenario in reference_scenarios() {
        let out = stress(scenario.kind, 1_000_000, scenario.policy);
        println!(
            "  {:<30} {:>8.4}s  pending={:<8} passes={:<5} reclaimed={}",
            scenario.label, out.elapsed_seconds, out.pending_count, out.collections, out.reclaimed,
        );
    }

    println!("\nDone.");
}

fn mb(bytes: u64) -> f64 {
    bytes as f64 / 1e6
}
