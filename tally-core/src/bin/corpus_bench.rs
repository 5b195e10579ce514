//! Synthetic Corpus Benchmarking Tool
//!
//! Measures the document operations on a generated corpus, so numbers are
//! reproducible without any input files.
//!
//! ## What It Benchmarks
//!
//! 1. **Build**: accumulating term weights with `increment`
//! 2. **Similarity**: Jaccard and cosine between consecutive document pairs
//! 3. **Filter**: batch filtering against a feature allow-list
//! 4. **Export**: writing sLDA term and label lines to a sink
//!
//! ## Usage
//!
//! ```bash
//! # Built only with the `bench` feature
//! cargo build --release --features bench --bin corpus_bench
//!
//! # Defaults: 10_000 documents, 50_000 term vocabulary, 200 terms per document
//! ./target/release/corpus_bench
//!
//! # Custom corpus shape
//! ./target/release/corpus_bench <documents> <vocabulary> <terms_per_doc>
//!
//! # Library diagnostics
//! RUST_LOG=tally_core=debug ./target/release/corpus_bench
//! ```

use std::env;
use std::io;
use std::time::{Duration, Instant};

use tally_core::{Document, SldaWriter, TermId};
use tracing::info;

const WARMUP_RUNS: usize = 1;
const MEASURE_RUNS: usize = 5;

const DEFAULT_DOCUMENTS: usize = 10_000;
const DEFAULT_VOCABULARY: u64 = 50_000;
const DEFAULT_TERMS_PER_DOC: usize = 200;

const LABELS: [&str; 4] = ["sports", "politics", "science", "[NONE]"];

/// Corpus shape taken from the command line.
#[derive(Debug, Clone, Copy)]
struct CorpusShape {
    documents: usize,
    vocabulary: u64,
    terms_per_doc: usize,
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tally_core=info")),
        )
        .init();

    let shape = match parse_args(env::args().skip(1)) {
        Some(shape) => shape,
        None => {
            eprintln!("Usage: corpus_bench [documents] [vocabulary] [terms_per_doc]");
            std::process::exit(1);
        }
    };
    info!(?shape, "Generating corpus");

    let corpus = bench_build(shape)?;
    bench_similarity(&corpus)?;
    bench_filter(&corpus, shape)?;
    bench_export(&corpus)?;

    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Option<CorpusShape> {
    let mut shape = CorpusShape {
        documents: DEFAULT_DOCUMENTS,
        vocabulary: DEFAULT_VOCABULARY,
        terms_per_doc: DEFAULT_TERMS_PER_DOC,
    };
    if let Some(arg) = args.next() {
        shape.documents = arg.parse().ok()?;
    }
    if let Some(arg) = args.next() {
        shape.vocabulary = arg.parse().ok().filter(|&v| v > 0)?;
    }
    if let Some(arg) = args.next() {
        shape.terms_per_doc = arg.parse().ok()?;
    }
    Some(shape)
}

/// xorshift64*, enough to spread term ids without pulling in an RNG crate.
struct TermStream(u64);

impl TermStream {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 >> 12;
        self.0 ^= self.0 << 25;
        self.0 ^= self.0 >> 27;
        self.0.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }
}

fn generate(shape: CorpusShape) -> Vec<Document> {
    let mut stream = TermStream(0x9E37_79B9_7F4A_7C15);
    (0..shape.documents)
        .map(|i| {
            let label = LABELS[i % LABELS.len()];
            let mut doc = Document::with_label(format!("/synthetic/doc{i}.txt"), i as u64, label);
            for _ in 0..shape.terms_per_doc {
                // Squaring skews ids towards the head of the vocabulary.
                let r = (stream.next() % shape.vocabulary) as f64 / shape.vocabulary as f64;
                let term = (r * r * shape.vocabulary as f64) as TermId;
                doc.increment(term, 1.0);
            }
            doc
        })
        .collect()
}

fn bench_build(shape: CorpusShape) -> io::Result<Vec<Document>> {
    let mut corpus = Vec::new();
    let timing = time_runs(|| {
        corpus = generate(shape);
        Ok(())
    })?;

    report("Build", timing, (shape.documents * shape.terms_per_doc) as u64);
    Ok(corpus)
}

fn bench_similarity(corpus: &[Document]) -> io::Result<()> {
    let timing = time_runs(|| {
        let sink: f64 = corpus
            .windows(2)
            .map(|pair| {
                Document::jaccard_similarity(&pair[0], &pair[1])
                    + Document::cosine_similarity(&pair[0], &pair[1])
            })
            .sum();
        std::hint::black_box(sink);
        Ok(())
    })?;

    report("Similarity", timing, corpus.len().saturating_sub(1) as u64 * 2);
    Ok(())
}

fn bench_filter(corpus: &[Document], shape: CorpusShape) -> io::Result<()> {
    // Keep the most frequent tenth of the vocabulary.
    let features: Vec<(TermId, f64)> = (0..(shape.vocabulary / 10).max(1))
        .map(|t| (t, 1.0))
        .collect();

    let timing = time_runs(|| {
        std::hint::black_box(Document::filter_features_batch(corpus, &features));
        Ok(())
    })?;

    report("Filter", timing, corpus.len() as u64);
    Ok(())
}

fn bench_export(corpus: &[Document]) -> io::Result<()> {
    let timing = time_runs(|| {
        let mut writer = SldaWriter::new(io::sink(), io::sink());
        writer.write_all(corpus)?;
        writer.flush()
    })?;

    report("Export", timing, corpus.len() as u64);
    Ok(())
}

/// Mean and fastest wall time over the measured runs.
#[derive(Debug, Clone, Copy)]
struct Timing {
    mean: Duration,
    best: Duration,
}

/// Runs `op` `WARMUP_RUNS` times untimed, then `MEASURE_RUNS` times timed.
fn time_runs(mut op: impl FnMut() -> io::Result<()>) -> io::Result<Timing> {
    for _ in 0..WARMUP_RUNS {
        op()?;
    }

    let mut total = Duration::ZERO;
    let mut best = Duration::MAX;
    for _ in 0..MEASURE_RUNS {
        let start = Instant::now();
        op()?;
        let elapsed = start.elapsed();
        total += elapsed;
        best = best.min(elapsed);
    }

    Ok(Timing {
        mean: total / MEASURE_RUNS as u32,
        best,
    })
}

fn report(stage: &str, timing: Timing, ops: u64) {
    let mean = timing.mean.as_secs_f64();

    println!("=== {stage} ===");
    println!("  mean     : {mean:.4} s");
    println!("  best     : {:.4} s", timing.best.as_secs_f64());
    println!("  ops      : {}", group_digits(ops));
    if mean > 0.0 {
        println!("  ops/sec  : {}", group_digits((ops as f64 / mean) as u64));
    }
    println!();
}

/// Renders `n` with `_` between thousands groups, e.g. `1_234_567`.
fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let head = match digits.len() % 3 {
        0 => 3,
        r => r,
    };

    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    out.push_str(&digits[..head]);
    for start in (head..digits.len()).step_by(3) {
        out.push('_');
        out.push_str(&digits[start..start + 3]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_defaults() {
        let shape = parse_args(std::iter::empty()).unwrap();
        assert_eq!(shape.documents, DEFAULT_DOCUMENTS);
        assert_eq!(shape.vocabulary, DEFAULT_VOCABULARY);
        assert_eq!(shape.terms_per_doc, DEFAULT_TERMS_PER_DOC);
    }

    #[test]
    fn parse_rejects_garbage_and_zero_vocabulary() {
        assert!(parse_args(["ten".to_string()].into_iter()).is_none());
        assert!(parse_args(["10".to_string(), "0".to_string()].into_iter()).is_none());
    }

    #[test]
    fn generated_corpus_shape() {
        let shape = CorpusShape {
            documents: 8,
            vocabulary: 100,
            terms_per_doc: 30,
        };
        let corpus = generate(shape);
        assert_eq!(corpus.len(), 8);
        for (i, doc) in corpus.iter().enumerate() {
            assert_eq!(doc.id(), i as u64);
            assert_eq!(doc.length(), 30.0);
            assert!(doc.frequencies().keys().all(|&t| t < 100));
        }
    }

    #[test]
    fn digit_grouping() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1000), "1_000");
        assert_eq!(group_digits(123456), "123_456");
        assert_eq!(group_digits(1234567), "1_234_567");
    }

    #[test]
    fn time_runs_counts_every_call() {
        let mut calls = 0;
        let timing = time_runs(|| {
            calls += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(calls, WARMUP_RUNS + MEASURE_RUNS);
        assert!(timing.best <= timing.mean);
    }

    #[test]
    fn time_runs_stops_on_error() {
        let mut calls = 0;
        let result = time_runs(|| {
            calls += 1;
            Err(io::Error::new(io::ErrorKind::Other, "sink closed"))
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
