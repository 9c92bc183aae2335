//! Encoding and scanning throughput on a synthetic genome fragment.

use bio::bio_types::strand::Strand;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rbscan::{PackedSequence, ShineDalgarnoScorer, TrainingInfo};

fn synthetic_genome(copies: usize) -> String {
    // A start context with a strong SD site plus filler, repeated.
    "AGGAGGTTAGCAAATATGGCTAAAGGTCTGACCGCANNNNNNNNNNCCGT".repeat(copies)
}

fn bench_encoding(c: &mut Criterion) {
    let text = synthetic_genome(2_000);
    c.bench_function("encode_100kb", |b| {
        b.iter(|| PackedSequence::from_string(black_box(&text), true).unwrap());
    });
}

fn bench_scanning(c: &mut Criterion) {
    let text = synthetic_genome(2_000);
    let seq = PackedSequence::from_string(&text, false).unwrap();
    let tinf = TrainingInfo::new(seq.gc());
    let scorer = ShineDalgarnoScorer::default();
    let starts: Vec<usize> = (0..seq.len()).step_by(3).collect();

    c.bench_function("scan_starts_serial", |b| {
        b.iter(|| {
            let mut acc = 0usize;
            for &start in &starts {
                acc += scorer.score(&seq, start, &tinf, Strand::Forward, true);
            }
            black_box(acc)
        });
    });
    c.bench_function("scan_starts_batch", |b| {
        b.iter(|| scorer.score_batch(black_box(&seq), &starts, &tinf, Strand::Forward, true));
    });
}

criterion_group!(benches, bench_encoding, bench_scanning);
criterion_main!(benches);
