use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use levelks::ks::KeySwitcher;
use levelks::params::Params;
use levelks::rlwe::{Encryptor, KeyGenerator};

/// The research driver's chain: 36 ciphertext primes, 4 special primes.
/// A smaller ring keeps the sweep affordable on a laptop; pass
/// `--features` nothing, just raise LOG_N for the full-size numbers.
const LOG_N: usize = 12;
const Q_COUNT: usize = 36;
const P_COUNT: usize = 4;

fn bench_params() -> Params {
    Params::research_truncated(LOG_N, Q_COUNT, P_COUNT)
}

fn keyswitch_benchmark(c: &mut Criterion) {
    let params = bench_params();
    let mut kgen = KeyGenerator::with_seed(params.clone(), 1);
    let sk = kgen.gen_secret_key();
    let sk_out = kgen.gen_secret_key();
    let swk = kgen.gen_switching_key(&sk, &sk_out);
    let mut enc = Encryptor::with_seed(&params, &sk, 2);
    let mut ks = KeySwitcher::new(params.clone());
    let ring = ks.ring_q().clone();

    let ct = enc.encrypt_zero_ntt(params.max_level());
    let mut p0 = ring.new_poly();
    let mut p1 = ring.new_poly();

    let mut group = c.benchmark_group("switch_keys");
    for level in [3usize, 7, 11, 15, 19, 23, 27, 31, 35] {
        let sp = ks.sp_index(level);
        group.bench_with_input(
            BenchmarkId::new("level", format!("l{}_sp{}", level + 1, sp + 1)),
            &level,
            |b, &level| {
                b.iter(|| ks.switch_keys_in_place(level, &ct.c1, &swk, &mut p0, &mut p1));
            },
        );
    }
    group.finish();
}

fn hoisted_benchmark(c: &mut Criterion) {
    let params = bench_params();
    let mut kgen = KeyGenerator::with_seed(params.clone(), 3);
    let sk = kgen.gen_secret_key();
    let sk_out = kgen.gen_secret_key();
    let swk = kgen.gen_switching_key(&sk, &sk_out);
    let mut enc = Encryptor::with_seed(&params, &sk, 4);
    let mut ks = KeySwitcher::new(params.clone());
    let ring = ks.ring_q().clone();

    let level = params.max_level();
    let ct = enc.encrypt_zero_ntt(level);
    let level_p = ks.level_pk(level);
    let mut decomp = ks.new_hoist_buffer();
    ks.decompose_ntt(level, level_p, level_p + 1, &ct.c1, &mut decomp);

    let p_rows = (params.beta() / 2 + 1) * params.p_count();
    let mut c0q = ring.new_poly();
    let mut c1q = ring.new_poly();
    let mut c0p = levelks::ring::Poly::zero(p_rows, params.n());
    let mut c1p = levelks::ring::Poly::zero(p_rows, params.n());

    let mut group = c.benchmark_group("hoisted");
    group.bench_function("decompose_ntt", |b| {
        b.iter(|| ks.decompose_ntt(level, level_p, level_p + 1, &ct.c1, &mut decomp));
    });
    group.bench_function("keyswitch_hoisted", |b| {
        b.iter(|| {
            ks.keyswitch_hoisted(level, &decomp, &swk, &mut c0q, &mut c1q, &mut c0p, &mut c1p)
        });
    });
    group.finish();
}

criterion_group!(benches, keyswitch_benchmark, hoisted_benchmark);
criterion_main!(benches);
