use dicom_pixel_codecs::jpeg1::dct::{idct_8x8_baseline, idct_8x8_fixed_point};
use dicom_pixel_codecs::jpeg2000::dwt::forward_multilevel_53;
use dicom_pixel_codecs::jpeg2000::mq_coder::MqCoder;
use std::time::Instant;

fn bench_idct() {
    println!("Benchmarking IDCT implementations...");

    let input = [
        10.0, 5.0, -2.0, 1.0, 0.0, 0.0, 0.0, 0.0,
        3.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        -1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
    ]; // Simple mock DCT coefficients

    let iterations = 1_000_000;

    let mut output_baseline = [0.0f32; 64];
    let start = Instant::now();
    for _ in 0..iterations {
        idct_8x8_baseline(&input, &mut output_baseline);
        std::hint::black_box(output_baseline);
    }
    let duration_baseline = start.elapsed();
    println!("Baseline (Float) IDCT: {:?} for {} iterations", duration_baseline, iterations);

    let mut output_fixed = [0.0f32; 64];
    let start = Instant::now();
    for _ in 0..iterations {
        idct_8x8_fixed_point(&input, &mut output_fixed);
        std::hint::black_box(output_fixed);
    }
    let duration_fixed = start.elapsed();
    println!("Fixed Point IDCT: {:?} for {} iterations", duration_fixed, iterations);

    let speedup = duration_baseline.as_secs_f64() / duration_fixed.as_secs_f64();
    println!("Speedup: {:.2}x", speedup);

    let mut max_diff = 0.0f32;
    for i in 0..64 {
        let diff = (output_baseline[i] - output_fixed[i]).abs();
        if diff > max_diff {
            max_diff = diff;
        }
    }
    println!("Max difference between baseline and fixed-point: {}", max_diff);

    if max_diff < 2.0 {
        println!("Accuracy: PASSED (Tolerance < 2.0)");
    } else {
        println!("Accuracy: FAILED (Tolerance > 2.0)");
    }
}

fn bench_dwt() {
    println!("\nBenchmarking 5/3 wavelet transform...");

    let width = 256u32;
    let height = 256u32;
    let data: Vec<i32> = (0..(width * height) as usize)
        .map(|i| ((i * 37) % 256) as i32 - 128)
        .collect();

    let iterations = 200;
    let start = Instant::now();
    for _ in 0..iterations {
        let result = forward_multilevel_53(&data, width, height, 5);
        std::hint::black_box(&result);
    }
    let duration = start.elapsed();
    println!(
        "5-level forward 5/3 DWT on {width}x{height}: {:?} for {iterations} iterations ({:?}/iter)",
        duration,
        duration / iterations
    );
}

fn bench_mq_coder() {
    println!("\nBenchmarking MQ coder...");

    let iterations = 500_000;
    let mut mq = MqCoder::new();
    mq.init_contexts(19);

    let start = Instant::now();
    for i in 0..iterations {
        let bit = (i % 3 == 0) as u8;
        mq.encode(bit, i % 19);
    }
    mq.flush();
    let duration = start.elapsed();
    println!(
        "MQ encode: {:?} for {iterations} symbols, {} bytes output",
        duration,
        mq.get_buffer().len()
    );
}

fn main() {
    bench_idct();
    bench_dwt();
    bench_mq_coder();
}
