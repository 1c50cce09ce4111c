use num_complex::Complex64;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::hint::black_box;
use std::time::{Duration, Instant};
use strided_fft::{
    c2c, c2c_in_place, c2r, genuine_hartley, r2c, r2r_fftpack, NdArray, StridedArray,
};

fn mean(durations: &[Duration]) -> Duration {
    let total_nanos: u128 = durations.iter().map(|d| d.as_nanos()).sum();
    Duration::from_nanos((total_nanos / durations.len() as u128) as u64)
}

fn bench_n(label: &str, warmup_iters: usize, iters: usize, mut f: impl FnMut()) -> Duration {
    for _ in 0..warmup_iters {
        f();
    }

    let mut samples = Vec::with_capacity(iters);
    for _ in 0..iters {
        let t0 = Instant::now();
        f();
        samples.push(t0.elapsed());
    }

    let avg = mean(&samples);
    println!("{label}: {:.3} ms", avg.as_secs_f64() * 1e3);
    avg
}

fn make_random_real(dims: &[usize], seed: u64) -> StridedArray<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    StridedArray::<f64>::from_fn_row_major(dims, |_| rng.sample(StandardNormal))
}

fn make_random_complex(dims: &[usize], seed: u64) -> StridedArray<Complex64> {
    let mut rng = StdRng::seed_from_u64(seed);
    StridedArray::<Complex64>::from_fn_row_major(dims, |_| {
        Complex64::new(rng.sample(StandardNormal), rng.sample(StandardNormal))
    })
}

fn main() {
    println!("Rust runner: benches/fft_bench.rs");
    println!();

    // 1) c2c_1024x1024, contiguous vs transposed input
    {
        println!("=== Benchmark 1: c2c_1024x1024 ===");
        let n = 1024usize;
        let a = make_random_complex(&[n, n], 0);
        let contiguous = NdArray::Complex128(a.clone());
        let transposed = NdArray::Complex128(a.permute(&[1, 0]).unwrap());

        for nthreads in [1, 0] {
            bench_n(&format!("contiguous nthreads={nthreads}"), 1, 5, || {
                black_box(c2c(&contiguous, None, true, 0, None, nthreads).unwrap());
            });
            bench_n(&format!("transposed nthreads={nthreads}"), 1, 5, || {
                black_box(c2c(&transposed, None, true, 0, None, nthreads).unwrap());
            });
        }

        let mut work = contiguous.clone();
        bench_n("in_place nthreads=0", 1, 5, || {
            c2c_in_place(&mut work, None, true, 2, 0).unwrap();
            black_box(&work);
        });
        println!();
    }

    // 2) real_c2c_vs_r2c_512x512
    {
        println!("=== Benchmark 2: real_c2c_vs_r2c_512x512 ===");
        let a = NdArray::Float64(make_random_real(&[512, 512], 1));

        bench_n("c2c (mirror fill)", 2, 10, || {
            black_box(c2c(&a, None, true, 0, None, 0).unwrap());
        });
        bench_n("r2c", 2, 10, || {
            black_box(r2c(&a, None, true, 0, None, 0).unwrap());
        });
        let spectrum = r2c(&a, None, true, 0, None, 0).unwrap();
        bench_n("c2r", 2, 10, || {
            black_box(c2r(&spectrum, None, 512, false, 2, None, 0).unwrap());
        });
        println!();
    }

    // 3) real_to_real_64x64x64
    {
        println!("=== Benchmark 3: real_to_real_64x64x64 ===");
        let a = NdArray::Float64(make_random_real(&[64, 64, 64], 2));

        bench_n("r2r_fftpack", 2, 10, || {
            black_box(r2r_fftpack(&a, None, true, true, 0, None, 0).unwrap());
        });
        bench_n("genuine_hartley", 2, 10, || {
            black_box(genuine_hartley(&a, None, 0, None, 0).unwrap());
        });
        println!();
    }
}
