//! Benchmark suite for PPM and KWZ decoding
//!
//! Notes are generated in memory, so no sample files are needed.
//!
//! Run with: cargo bench --manifest-path benches/Cargo.toml
//!
//! For flamegraph profiling:
//! cargo bench --manifest-path benches/Cargo.toml -- --profile-time=5

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use flipnote_benches::{XorShift, kwz, ppm, sizes};
use flipnote_types::file::{KwzFile, PpmFile};
use std::hint::black_box;

/// Sequential playback: every frame decoded in order
fn bench_kwz_playback(c: &mut Criterion) {
	let mut group = c.benchmark_group("kwz_playback");

	for (name, frames) in [("short", sizes::SHORT), ("typical", sizes::TYPICAL)] {
		let data = kwz::animated_note(frames, 0xC0FFEE).build();
		group.throughput(Throughput::Elements(frames as u64));
		group.bench_with_input(BenchmarkId::new("decode_all", name), &data, |b, data| {
			b.iter(|| {
				let mut note = KwzFile::from_bytes(data.clone()).unwrap();
				for frame in 0..note.frame_count() {
					black_box(note.decode_frame(frame).unwrap());
				}
			});
		});
	}

	group.finish();
}

/// Seeking to the last frame from a fresh parser walks the whole diff chain
fn bench_kwz_seek(c: &mut Criterion) {
	let mut group = c.benchmark_group("kwz_seek");

	let data = kwz::animated_note(sizes::LONG, 7).build();
	group.bench_function("last_frame", |b| {
		b.iter(|| {
			let mut note = KwzFile::from_bytes(data.clone()).unwrap();
			let last = note.frame_count() - 1;
			black_box(note.frame_rgba(last).unwrap())
		});
	});

	group.finish();
}

/// Layer codec on its own, over a dense plane
fn bench_kwz_layer(c: &mut Criterion) {
	let mut group = c.benchmark_group("kwz_layer");

	let mut rng = XorShift::new(42);
	let mut frame = kwz::KwzFrame::blank();
	for layer in &mut frame.layers {
		*layer = kwz::random_plane(&mut rng);
	}
	let data = kwz::KwzBuilder::with_frames(vec![frame]).build();
	group.throughput(Throughput::Elements((kwz::WIDTH * kwz::HEIGHT * 3) as u64));
	group.bench_function("dense_keyframe", |b| {
		b.iter(|| {
			let mut note = KwzFile::from_bytes(data.clone()).unwrap();
			black_box(note.frame_pixels(0).unwrap())
		});
	});

	group.finish();
}

/// ADPCM decoding throughput
fn bench_adpcm(c: &mut Criterion) {
	let mut group = c.benchmark_group("adpcm");

	let mut rng = XorShift::new(1);
	let src: Vec<u8> = (0..16384).map(|_| rng.next_u32() as u8).collect();
	group.throughput(Throughput::Bytes(src.len() as u64));
	group.bench_function("kwz", |b| {
		b.iter(|| black_box(flipnote_types::file::kwz::decode_adpcm(black_box(&src), 0, 40)));
	});
	group.bench_function("kwz_search", |b| {
		b.iter(|| black_box(flipnote_types::file::kwz::decode_adpcm_search(black_box(&src), 0)));
	});
	group.bench_function("ppm", |b| {
		b.iter(|| black_box(flipnote_types::file::ppm::decode_adpcm(black_box(&src))));
	});

	group.finish();
}

/// PPM playback, including translated diff frames
fn bench_ppm_playback(c: &mut Criterion) {
	let mut group = c.benchmark_group("ppm_playback");

	for (name, frames) in [("short", sizes::SHORT), ("typical", sizes::TYPICAL)] {
		let data = ppm::animated_note(frames, 99).build();
		group.throughput(Throughput::Elements(frames as u64));
		group.bench_with_input(BenchmarkId::new("decode_all", name), &data, |b, data| {
			b.iter(|| {
				let mut note = PpmFile::from_bytes(data.clone()).unwrap();
				for frame in 0..note.frame_count() {
					black_box(note.frame_pixels(frame).unwrap());
				}
			});
		});
	}

	group.finish();
}

criterion_group!(
	benches,
	bench_kwz_playback,
	bench_kwz_seek,
	bench_kwz_layer,
	bench_adpcm,
	bench_ppm_playback,
);
criterion_main!(benches);
