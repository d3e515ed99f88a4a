use flipnote_benches::kwz::{self as synth, KwzBuilder, KwzFrame, LayerMode};
use flipnote_rs::file::kwz::{File, ICON_SIZE};
use flipnote_rs::file::{AudioTrack, FsidRegion, ParserSettings};

use super::{KWZ_PUBLIC_KEY, sign_kwz};

const DSI_LIBRARY_FSID: [u8; 10] = [0x14, 0x00, 0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xE9];

#[test_log::test]
fn test_frames_match_source_images() {
	let builder = synth::animated_note(30, 0xF11B);
	let mut note = File::from_bytes(builder.build()).unwrap();
	assert_eq!(note.frame_count(), 30);
	for (index, frame) in builder.frames.iter().enumerate() {
		let layers = note.decode_frame(index).unwrap();
		assert_eq!(layers, &frame.layers[..], "frame {index}");
	}
}

#[test_log::test]
fn test_direct_access_matches_playback() {
	let builder = synth::animated_note(20, 77);
	let data = builder.build();
	let mut playback = File::from_bytes(data.clone()).unwrap();
	let decoded: Vec<_> =
		(0..20).map(|frame| playback.decode_frame(frame).unwrap().to_vec()).collect();

	for frame in [19, 0, 8, 12, 11, 1] {
		let mut direct = File::from_bytes(data.clone()).unwrap();
		assert_eq!(direct.decode_frame(frame).unwrap(), &decoded[frame][..], "frame {frame}");
		assert_eq!(playback.decode_frame(frame).unwrap(), &decoded[frame][..]);
		assert_eq!(direct.frame_pixels(frame).unwrap(), playback.frame_pixels(frame).unwrap());
	}
}

#[test_log::test]
fn test_unchanged_layers_survive_seeking() {
	let builder = synth::animated_note(9, 3);
	assert_eq!(builder.frames[8].modes[2], LayerMode::Unchanged);
	let mut note = File::from_bytes(builder.build()).unwrap();
	assert_eq!(note.frame_layer_sizes(8).unwrap()[2], 38);
	let layers = note.decode_frame(8).unwrap();
	assert_eq!(layers[2], builder.frames[7].layers[2]);
}

#[test_log::test]
fn test_metadata_and_regions() {
	let mut builder = synth::animated_note(3, 1);
	builder.lock = true;
	builder.loop_playback = true;
	builder.frame_speed = 10;
	builder.bgm_speed = 7;
	builder.created = 0;
	builder.fsids[0][0] = 0x00;
	builder.fsids[1][0] = 0x12;
	builder.names[2] = "Sudomemo".into();
	builder.frames[1].camera_flags = 0b100;
	builder.frames[1].author[0] = 0x00;
	let note = File::from_bytes(builder.build()).unwrap();
	let meta = note.meta();

	assert!(meta.lock);
	assert!(meta.loop_playback);
	assert_eq!(meta.framerate, 30.0);
	assert_eq!(meta.bgm_framerate, 12.0);
	assert_eq!(meta.created.unwrap().timestamp(), 946_684_800);
	assert_eq!(meta.root.region, FsidRegion::Japan);
	assert_eq!(meta.parent.region, FsidRegion::Europe);
	assert_eq!(meta.current.region, FsidRegion::America);
	assert_eq!(meta.current.fsid, "1012-3456-789A-BCDEF0");
	assert_eq!(meta.current.name, "Sudomemo");
	assert_eq!(meta.current.filename, "cwvgxlnb7fv2caxhlbxact7g2pj3");
	assert!(meta.is_spinoff);
	assert!(!meta.is_dsi_library);

	assert_eq!(note.frame_camera_flags(1).unwrap(), [false, false, true]);
	assert_eq!(note.frame_author(1).unwrap(), "0012-3456-789A-BCDEF0");
	assert_eq!(note.frame_layer_depths(1).unwrap(), [1, 1, 2]);
}

#[test_log::test]
fn test_dsi_library_conversion() {
	let mut builder = synth::animated_note(2, 1);
	builder.fsids = [DSI_LIBRARY_FSID; 3];
	builder.tracks = Some([vec![0x88; 64], vec![], vec![], vec![], vec![]]);
	let data = builder.build();

	let note = File::from_bytes(data.clone()).unwrap();
	let meta = note.meta();
	assert!(meta.is_dsi_library);
	assert_eq!(meta.current.fsid, "14000123456789ABCDE9");
	assert_eq!(meta.current.region, FsidRegion::Europe);
	assert!(!meta.is_spinoff);
	assert!(!note.decode_audio_track(AudioTrack::Bgm).is_empty());

	let settings = ParserSettings {
		dsi_library_step_index: Some(0),
		..ParserSettings::default()
	};
	let fixed = File::from_bytes_with_settings(data.clone(), settings).unwrap();
	let forced = File::from_bytes_with_settings(
		data,
		ParserSettings {
			force_dsi_library: Some(false),
			..ParserSettings::default()
		},
	)
	.unwrap();
	assert!(!forced.meta().is_dsi_library);
	assert_ne!(
		fixed.decode_audio_track(AudioTrack::Bgm),
		forced.decode_audio_track(AudioTrack::Bgm)
	);
}

#[test_log::test]
fn test_folder_icon() {
	let mut frame = KwzFrame::blank();
	frame.layers[0] = synth::random_plane(&mut flipnote_benches::XorShift::new(4));
	let mut builder = KwzBuilder::with_frames(vec![frame.clone()]);
	builder.folder_icon = true;
	builder.header = false;
	builder.tracks = None;
	let mut icon = File::from_bytes(builder.build()).unwrap();

	assert!(icon.is_folder_icon());
	assert_eq!((icon.width(), icon.height()), (ICON_SIZE, ICON_SIZE));
	let pixels = icon.frame_pixels(0).unwrap();
	assert_eq!(pixels.len(), ICON_SIZE * ICON_SIZE);
	for y in 0..ICON_SIZE {
		for x in 0..ICON_SIZE {
			let source = frame.layers[0][y * synth::WIDTH + x];
			assert_eq!(pixels[y * ICON_SIZE + x], source, "({x}, {y})");
		}
	}
}

#[test_log::test]
fn test_effect_lands_on_its_frame() {
	let mut builder = synth::animated_note(8, 21);
	// 4 fps, so a frame is exactly 4091 samples at the stored rate
	builder.frame_speed = 4;
	builder.bgm_speed = 4;
	for frame in &mut builder.frames {
		frame.sound_flags = 0;
	}
	builder.frames[3].sound_flags = 0b0010;
	builder.tracks = Some([vec![], vec![], vec![0x3C; 40], vec![], vec![]]);
	let note = File::from_bytes(builder.build()).unwrap();

	let rate = 16364;
	let effect = note.audio_track_pcm(AudioTrack::Se2, rate);
	// 40 bytes hold between 80 and 160 samples
	assert!((80..=160).contains(&effect.len()));
	let master = note.audio_master(rate);
	let start = 3 * 4091;
	assert_eq!(master.samples.len(), 8 * 4091);
	assert!(master.samples[..start].iter().all(|&s| s == 0));
	assert_eq!(&master.samples[start..start + effect.len()], &effect[..]);
	assert!(master.samples[start + effect.len()..].iter().all(|&s| s == 0));
}

#[test_log::test]
fn test_signature() {
	let builder = synth::animated_note(5, 8);
	let data = builder.build_signed(sign_kwz);
	let note = File::from_bytes(data.clone()).unwrap();
	assert_eq!(&note.body()[..], &builder.body()[..]);
	assert!(note.verify_with_key(KWZ_PUBLIC_KEY).unwrap());

	let mut tampered = data;
	let last_body_byte = builder.body().len() - 1;
	tampered[last_body_byte] ^= 0x01;
	let note = File::from_bytes(tampered).unwrap();
	assert!(!note.verify_with_key(KWZ_PUBLIC_KEY).unwrap());
}
