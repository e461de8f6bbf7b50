use betuimg::compression::{
    decode, decode_lossless, decode_lossless_raw, decode_lossy, encode_lossless,
    encode_lossless_raw, encode_lossy, grid, record_len, DecompressionError, ExactPalette,
    PaletteOracle, BLOCK_SIZE, LOSSLESS_HEADER_LEN, LOSSY_HEADER_LEN,
};
use betuimg::stats::CompressionStats;
use image::{Rgb, RgbImage};
use rand::{rngs::ThreadRng, Rng};
use std::time::Instant;

struct BenchmarkMetrics {
    compress_tm: f64,
    decompress_tm: f64,
    stats: CompressionStats,
}

// Returns a random image that uses at most `colors` distinct colors.
fn random_palette_image(width: u32, height: u32, colors: usize, rng: &mut ThreadRng) -> RgbImage {
    let palette: Vec<Rgb<u8>> = (0..colors).map(|_| Rgb(rng.gen())).collect();
    RgbImage::from_fn(width, height, |_, _| palette[rng.gen_range(0..colors)])
}

fn random_rgb(width: u32, height: u32, rng: &mut ThreadRng) -> RgbImage {
    RgbImage::from_fn(width, height, |_, _| Rgb(rng.gen()))
}

// Smooth image with large flat areas, closer to a photograph than noise.
fn stripes(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x / 10 * 25) as u8, (y / 7 * 30) as u8, ((x + y) / 20 * 40) as u8])
    })
}

fn lossless_metrics(image: &RgbImage) -> BenchmarkMetrics {
    let now = Instant::now();
    let compressed = encode_lossless(image, &ExactPalette).unwrap();
    let compress_tm = now.elapsed().as_secs_f64();

    let now = Instant::now();
    let decompressed = decode_lossless(&compressed).unwrap();
    let decompress_tm = now.elapsed().as_secs_f64();

    assert_eq!(image, &decompressed);

    BenchmarkMetrics {
        compress_tm,
        decompress_tm,
        stats: CompressionStats::new(image.width(), image.height(), compressed.len() as u64),
    }
}

#[test]
fn lossless_roundtrip_suite() {
    let mut rng = rand::thread_rng();
    let dimensions = vec![
        (1, 1),
        (2, 1),
        (1, 2),
        (4, 7),
        (100, 40),
        (124, 274),
        (1447, 8),
        (1, 100),
        (640, 480),
    ];

    for (width, height) in dimensions {
        for colors in [1, 2, 16, 256] {
            let image = random_palette_image(width, height, colors, &mut rng);
            let metrics = lossless_metrics(&image);
            println!(
                "{}x{}, {} colors - CTime: {}, DTime: {}, Size: {}",
                width,
                height,
                colors,
                metrics.compress_tm,
                metrics.decompress_tm,
                metrics.stats.compressed_size
            );
        }
    }
}

#[test]
fn lzw_stage_is_exact() {
    let mut rng = rand::thread_rng();
    for len in [1, 2, 3, 100, 5000, 70_000] {
        let bytes: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        assert_eq!(decode_lossless_raw(&encode_lossless_raw(&bytes)).unwrap(), bytes);

        let bytes: Vec<u8> = (0..len).map(|_| rng.gen_range(0..3)).collect();
        assert_eq!(decode_lossless_raw(&encode_lossless_raw(&bytes)).unwrap(), bytes);
    }
}

#[test]
fn lzw_repeated_bytes() {
    let codes = encode_lossless_raw(b"AAAA");
    assert_eq!(codes, vec![0, 65, 1, 0, 0, 65]);
    assert_eq!(decode_lossless_raw(&codes).unwrap(), b"AAAA");
}

#[test]
fn lossless_length_law() {
    let mut rng = rand::thread_rng();
    let image = random_palette_image(90, 61, 12, &mut rng);
    let indices = ExactPalette.reduce(&image).indices;
    let code_count = encode_lossless_raw(&indices).len() / 2;

    let stream = encode_lossless(&image, &ExactPalette).unwrap();
    assert_eq!(stream.len(), LOSSLESS_HEADER_LEN + 2 * code_count);
}

#[test]
fn lossy_length_law() {
    let mut rng = rand::thread_rng();
    for (width, height) in [(16, 16), (17, 33), (1, 1), (200, 7), (64, 48)] {
        let image = random_rgb(width, height, &mut rng);
        let stream = encode_lossy(&image).unwrap();
        let expected: usize = grid(width, height, BLOCK_SIZE as u32)
            .map(|rect| record_len(rect.pixel_count()))
            .sum();
        assert_eq!(stream.len(), LOSSY_HEADER_LEN + expected);
    }
}

#[test]
fn lossy_reconstruction_is_a_fixed_point() {
    let mut rng = rand::thread_rng();
    for (width, height) in [(16, 16), (45, 37), (3, 100)] {
        let image = random_rgb(width, height, &mut rng);
        let first = decode_lossy(&encode_lossy(&image).unwrap()).unwrap();
        let second = decode_lossy(&encode_lossy(&first).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    let image = stripes(123, 77);
    let first = decode_lossy(&encode_lossy(&image).unwrap()).unwrap();
    let second = decode_lossy(&encode_lossy(&first).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn lossy_blocks_use_two_colors() {
    let image = stripes(48, 32);
    let decoded = decode(&encode_lossy(&image).unwrap()).unwrap();
    for rect in grid(48, 32, 16) {
        let mut colors: Vec<Rgb<u8>> = Vec::new();
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                let pixel = *decoded.get_pixel(x, y);
                if !colors.contains(&pixel) {
                    colors.push(pixel);
                }
            }
        }
        assert!(colors.len() <= 2);
    }
}

#[test]
fn uniform_image_survives_lossy_coding() {
    let image = RgbImage::from_pixel(16, 16, Rgb([200, 100, 50]));
    let stream = encode_lossy(&image).unwrap();
    assert_eq!(&stream[6..9], &[200, 100, 50]);
    assert_eq!(&stream[9..12], &[200, 100, 50]);
    assert_eq!(decode_lossy(&stream).unwrap(), image);
}

#[test]
fn invalid_streams() {
    let short = vec![0u8; 100];
    assert!(matches!(
        decode(&short),
        Err(DecompressionError::TruncatedStream)
    ));

    let mut unknown = vec![0u8; 1000];
    unknown[0] = 9;
    assert!(matches!(
        decode(&unknown),
        Err(DecompressionError::UnrecognizedMode(9))
    ));

    // A lossy stream cut in the middle of its last block.
    let mut rng = rand::thread_rng();
    let mut stream = encode_lossy(&random_rgb(20, 20, &mut rng)).unwrap();
    stream.truncate(stream.len() - 3);
    assert!(matches!(
        decode(&stream),
        Err(DecompressionError::TruncatedStream)
    ));

    // Huge declared dimensions with no payload at all.
    assert!(matches!(
        decode(&[4, 0xFF, 0xFF, 0xFF, 0xFF, 16]),
        Err(DecompressionError::TruncatedStream)
    ));

    // A lossless stream whose second code was never defined.
    let mut stream = encode_lossless(&RgbImage::new(2, 1), &ExactPalette).unwrap();
    stream.truncate(LOSSLESS_HEADER_LEN);
    stream.extend_from_slice(&[0, 0, 0x0F, 0xFF]);
    assert!(matches!(
        decode(&stream),
        Err(DecompressionError::InvalidCode { code: 4095, .. })
    ));
}

#[test]
#[ignore]
fn lossless_roundtrip_intensive() {
    let mut rng = rand::thread_rng();
    for width in 0..20 {
        for height in 0..20 {
            let image = random_palette_image(width, height, 1 + (width * height) as usize % 256, &mut rng);
            lossless_metrics(&image);
        }
    }
}
