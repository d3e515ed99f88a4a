//! Flipnote inspection utility.
//!
//! Provides three subcommands:
//! - `info`: print metadata and per-frame details as JSON
//! - `frame`: export one composited frame as PNG
//! - `audio`: export the mixed soundtrack as WAV
//!
//! Parser settings come from an optional TOML file (`--config`) and from
//! `FLIPNOTE_*` environment variables, e.g. `FLIPNOTE_APPLY_LAYER_VISIBILITY=false`.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example flipnote_info info note.kwz
//! cargo run --example flipnote_info frame note.ppm --index 3 -o frame.png
//! cargo run --example flipnote_info audio note.kwz -o note.wav --rate 44100
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use flipnote_rs::file::audio;
use flipnote_rs::file::{AudioTrack, Flipnote, MasterAudio, ParserSettings, Thumbnail};
use image::{ImageBuffer, RgbaImage};
use log::{debug, info};
use serde_json::json;

#[derive(Parser)]
#[command(name = "flipnote_info")]
#[command(author = "flipnote-rs project")]
#[command(version)]
#[command(about = "Inspect Flipnote Studio (PPM) and Flipnote Studio 3D (KWZ) files", long_about = None)]
struct Cli {
	/// TOML file with parser settings
	#[arg(short, long, global = true, value_name = "FILE")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Print metadata as JSON
	Info(InfoArgs),
	/// Export a frame as PNG
	Frame(FrameArgs),
	/// Export the mixed soundtrack as WAV
	Audio(AudioArgs),
}

#[derive(Args)]
struct InfoArgs {
	/// Path to a .ppm or .kwz file
	#[arg(value_name = "FILE")]
	file: PathBuf,

	/// Include per-frame palette and sound effect flags
	#[arg(short, long, default_value_t = false)]
	frames: bool,

	/// Check the signature against the official public key
	#[arg(short, long, default_value_t = false)]
	verify: bool,
}

#[derive(Args)]
struct FrameArgs {
	/// Path to a .ppm or .kwz file
	#[arg(value_name = "FILE")]
	file: PathBuf,

	/// Frame index; defaults to the thumbnail frame
	#[arg(short, long, value_name = "INDEX")]
	index: Option<usize>,

	/// Output PNG path
	#[arg(short, long, value_name = "PNG", default_value = "frame.png")]
	output: PathBuf,

	/// Export the stored thumbnail instead of a decoded frame
	#[arg(long, default_value_t = false)]
	thumbnail: bool,
}

#[derive(Args)]
struct AudioArgs {
	/// Path to a .ppm or .kwz file
	#[arg(value_name = "FILE")]
	file: PathBuf,

	/// Output WAV path
	#[arg(short, long, value_name = "WAV", default_value = "note.wav")]
	output: PathBuf,

	/// Output sample rate in Hz; defaults to the format's output rate
	#[arg(short, long, value_name = "HZ")]
	rate: Option<u32>,

	/// Export a single track (bgm, se1, se2, se3, se4) instead of the mix
	#[arg(short, long, value_name = "TRACK")]
	track: Option<String>,
}

fn main() -> Result<()> {
	env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

	let cli = Cli::parse();
	let settings = load_settings(cli.config.as_deref())?;
	debug!("Parser settings: {settings:?}");

	match cli.command {
		Command::Info(args) => run_info(args, settings),
		Command::Frame(args) => run_frame(args, settings),
		Command::Audio(args) => run_audio(args, settings),
	}
}

fn load_settings(path: Option<&Path>) -> Result<ParserSettings> {
	let mut builder = config::Config::builder();
	if let Some(path) = path {
		builder = builder.add_source(config::File::from(path).required(true));
	}
	builder = builder.add_source(config::Environment::with_prefix("FLIPNOTE").try_parsing(true));
	let settings = builder
		.build()
		.context("Failed to load settings")?
		.try_deserialize::<ParserSettings>()
		.context("Invalid parser settings")?;
	Ok(settings)
}

fn open(path: &Path, settings: ParserSettings) -> Result<Flipnote> {
	let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
	Flipnote::from_bytes_with_settings(data, settings)
		.with_context(|| format!("Failed to parse {}", path.display()))
}

fn run_info(args: InfoArgs, settings: ParserSettings) -> Result<()> {
	let note = open(&args.file, settings)?;
	let meta = note.meta();

	let mut report = json!({
		"format": note.format().to_string(),
		"width": note.width(),
		"height": note.height(),
		"layers": note.layer_count(),
		"meta": meta,
		"audio": AudioTrack::ALL
			.iter()
			.filter(|&&track| note.has_audio_track(track))
			.map(ToString::to_string)
			.collect::<Vec<_>>(),
	});

	if args.frames {
		let usage = note.sound_effect_usage();
		let mut frames = Vec::with_capacity(note.frame_count());
		for (index, effects) in usage.iter().enumerate() {
			let palette: Vec<String> =
				note.frame_palette(index)?.iter().map(ToString::to_string).collect();
			frames.push(json!({
				"index": index,
				"keyframe": note.is_keyframe(index)?,
				"palette": palette,
				"sound_effects": effects,
			}));
		}
		report["frames"] = json!(frames);
	}

	if args.verify {
		report["signature_valid"] = json!(note.verify()?);
	}

	println!("{}", serde_json::to_string_pretty(&report)?);
	Ok(())
}

fn save_png(path: &Path, width: usize, height: usize, rgba: Vec<u8>) -> Result<()> {
	let img: RgbaImage = ImageBuffer::from_raw(width as u32, height as u32, rgba)
		.context("Pixel buffer does not match the frame size")?;
	img.save(path).with_context(|| format!("Failed to write {}", path.display()))?;
	Ok(())
}

fn run_frame(args: FrameArgs, settings: ParserSettings) -> Result<()> {
	let mut note = open(&args.file, settings)?;

	if args.thumbnail {
		match note.thumbnail()? {
			Some(Thumbnail::Rgba {
				width,
				height,
				pixels,
			}) => save_png(&args.output, width, height, pixels)?,
			Some(Thumbnail::Jpeg(jpeg)) => {
				let img = image::load_from_memory(&jpeg).context("Embedded thumbnail is not a JPEG")?;
				img.save(&args.output)?;
			}
			None => bail!("{} has no thumbnail", args.file.display()),
		}
		info!("Wrote thumbnail to {}", args.output.display());
		return Ok(());
	}

	let index = args.index.unwrap_or(note.meta().thumb_index);
	if index >= note.frame_count() {
		bail!("Frame {index} out of range, the note has {} frames", note.frame_count());
	}
	let rgba = note.frame_rgba(index)?;
	save_png(&args.output, note.width(), note.height(), rgba)?;
	info!("Wrote frame {index} to {}", args.output.display());
	Ok(())
}

fn parse_track(name: &str) -> Result<AudioTrack> {
	Ok(match name.to_ascii_lowercase().as_str() {
		"bgm" => AudioTrack::Bgm,
		"se1" => AudioTrack::Se1,
		"se2" => AudioTrack::Se2,
		"se3" => AudioTrack::Se3,
		"se4" => AudioTrack::Se4,
		other => bail!("Unknown track {other:?}"),
	})
}

fn run_audio(args: AudioArgs, settings: ParserSettings) -> Result<()> {
	let note = open(&args.file, settings)?;
	let master = match (&args.track, args.rate) {
		(Some(name), rate) => {
			let track = parse_track(name)?;
			if !note.has_audio_track(track) {
				bail!("{} has no {track} track", args.file.display());
			}
			let sample_rate = rate.unwrap_or(note.audio_master_default().sample_rate);
			let samples = note.audio_track_pcm(track, sample_rate);
			MasterAudio {
				clip_ratio: audio::clipping_ratio(&samples),
				samples,
				sample_rate,
			}
		}
		(None, Some(rate)) => note.audio_master(rate),
		(None, None) => note.audio_master_default(),
	};

	let mut out = fs::File::create(&args.output)
		.with_context(|| format!("Failed to create {}", args.output.display()))?;
	master.write(&mut out)?;
	info!(
		"Wrote {:.2}s at {} Hz to {} (clip ratio {:.4})",
		master.duration(),
		master.sample_rate,
		args.output.display(),
		master.clip_ratio
	);
	Ok(())
}
