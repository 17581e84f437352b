//! Benchmarks for the automaton pipeline
//!
//! Run with: cargo bench --bench pipeline_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fsa_core::Automaton;

/// All words of `length` letters over an `alphabet`-letter alphabet
fn generate_words(alphabet: i32, length: usize) -> Vec<Vec<i32>> {
    let mut words = vec![Vec::new()];
    for _ in 0..length {
        words = words
            .into_iter()
            .flat_map(|w: Vec<i32>| {
                (0..alphabet).map(move |letter| {
                    let mut next = w.clone();
                    next.push(letter);
                    next
                })
            })
            .collect();
    }
    words
}

/// One branch per word off the shared root state
fn trie(words: &[Vec<i32>]) -> Automaton {
    let mut a = Automaton::new();
    a.add_state(0);
    a.add_initial_state(0);
    let mut next = 1;
    for w in words {
        let mut state = 0;
        for &label in w {
            a.add_transition(state, label, next);
            state = next;
            next += 1;
        }
        a.set_state_finality(state, 1);
    }
    a.sort();
    a
}

fn bench_trie_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("trie_construction");

    for length in [3, 4, 5] {
        let words = generate_words(3, length);
        group.throughput(Throughput::Elements(words.len() as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_words", words.len())),
            &words,
            |b, words| {
                b.iter(|| trie(black_box(words)));
            },
        );
    }

    group.finish();
}

fn bench_determinize(c: &mut Criterion) {
    let mut group = c.benchmark_group("determinize");

    for length in [3, 4, 5] {
        let nfa = trie(&generate_words(3, length));
        group.throughput(Throughput::Elements(nfa.num_states() as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_states", nfa.num_states())),
            &nfa,
            |b, nfa| {
                b.iter(|| black_box(nfa).determinize());
            },
        );
    }

    group.finish();
}

fn bench_minimize(c: &mut Criterion) {
    let mut group = c.benchmark_group("minimize");

    for length in [3, 4, 5] {
        let dfa = trie(&generate_words(3, length)).determinize();
        group.throughput(Throughput::Elements(dfa.num_states() as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_states", dfa.num_states())),
            &dfa,
            |b, dfa| {
                b.iter(|| black_box(dfa).minimize());
            },
        );
    }

    group.finish();
}

/// Full build + sort + determinize + minimize over 81 four-letter words
fn bench_full_pipeline(c: &mut Criterion) {
    let words = generate_words(3, 4);

    c.bench_function("pipeline_81_words", |b| {
        b.iter(|| trie(black_box(&words)).determinize().minimize());
    });
}

fn bench_accepts(c: &mut Criterion) {
    let minimal = trie(&generate_words(3, 5)).determinize().minimize();
    let probe: Vec<i32> = vec![0, 1, 2, 1, 0];

    c.bench_function("accepts_5_letters", |b| {
        b.iter(|| black_box(&minimal).accepts(black_box(&probe)));
    });
}

criterion_group!(
    benches,
    bench_trie_construction,
    bench_determinize,
    bench_minimize,
    bench_full_pipeline,
    bench_accepts,
);

criterion_main!(benches);
