//! Integration tests for `flipnote-rs` over generated notes

use flipnote_rs::file::audio;
use flipnote_rs::file::{Flipnote, FlipnoteError, FormatKind, Thumbnail, detect_format};
use rsa::pkcs8::DecodePrivateKey;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha1::{Digest, Sha1};
use sha2::Sha256;

mod kwz;

const PPM_PRIVATE_KEY: &str = include_str!("../data/ppm_test_private.pem");
const PPM_PUBLIC_KEY: &str = include_str!("../data/ppm_test_public.pem");
const KWZ_PRIVATE_KEY: &str = include_str!("../data/kwz_test_private.pem");
const KWZ_PUBLIC_KEY: &str = include_str!("../data/kwz_test_public.pem");

/// PKCS#1 v1.5 over SHA-1 with the 1024-bit test key
fn sign_ppm(body: &[u8]) -> Vec<u8> {
	let key = RsaPrivateKey::from_pkcs8_pem(PPM_PRIVATE_KEY).unwrap();
	key.sign(Pkcs1v15Sign::new::<Sha1>(), &Sha1::digest(body)).unwrap()
}

/// PKCS#1 v1.5 over SHA-256 with the 2048-bit test key
fn sign_kwz(body: &[u8]) -> Vec<u8> {
	let key = RsaPrivateKey::from_pkcs8_pem(KWZ_PRIVATE_KEY).unwrap();
	key.sign(Pkcs1v15Sign::new::<Sha256>(), &Sha256::digest(body)).unwrap()
}

#[test_log::test]
fn test_detect_format() {
	let ppm = flipnote_benches::ppm::animated_note(2, 1).build();
	let kwz = flipnote_benches::kwz::animated_note(2, 1).build();
	let mut icon = flipnote_benches::kwz::animated_note(1, 1);
	icon.folder_icon = true;
	icon.header = false;
	icon.tracks = None;
	let icon = icon.build();

	assert_eq!(detect_format(&ppm).unwrap(), FormatKind::Ppm);
	assert_eq!(detect_format(&kwz).unwrap(), FormatKind::Kwz);
	assert_eq!(detect_format(&icon).unwrap(), FormatKind::KwzIcon);
	assert!(matches!(detect_format(b"\x89PNG\r\n"), Err(FlipnoteError::BadMagic { .. })));

	assert_eq!(Flipnote::from_bytes(ppm).unwrap().format(), FormatKind::Ppm);
	assert_eq!(Flipnote::from_bytes(kwz).unwrap().format(), FormatKind::Kwz);
	let icon = Flipnote::from_bytes(icon).unwrap();
	assert_eq!(icon.format(), FormatKind::KwzIcon);
	assert_eq!((icon.width(), icon.height()), (24, 24));
}

#[test_log::test]
fn test_facade_shapes() {
	let mut ppm = Flipnote::from_bytes(flipnote_benches::ppm::animated_note(4, 3).build()).unwrap();
	assert_eq!((ppm.width(), ppm.height(), ppm.layer_count()), (256, 192, 2));
	assert_eq!(ppm.frame_palette(0).unwrap().len(), 3);
	assert_eq!(ppm.decode_frame(3).unwrap().len(), 2);
	assert_eq!(ppm.frame_rgba(3).unwrap().len(), 256 * 192 * 4);
	assert!(matches!(
		ppm.thumbnail().unwrap(),
		Some(Thumbnail::Rgba { width: 64, height: 48, .. })
	));

	let mut kwz = Flipnote::from_bytes(flipnote_benches::kwz::animated_note(4, 3).build()).unwrap();
	assert_eq!((kwz.width(), kwz.height(), kwz.layer_count()), (320, 240, 3));
	assert_eq!(kwz.frame_palette_indices(0).unwrap().len(), 7);
	assert_eq!(kwz.decode_frame(3).unwrap().len(), 3);
	assert_eq!(kwz.frame_pixels(3).unwrap().len(), 320 * 240);
	let Some(Thumbnail::Jpeg(jpeg)) = kwz.thumbnail().unwrap() else {
		panic!("KWZ thumbnail should be the embedded JPEG");
	};
	assert_eq!(&jpeg[..], &[0xFF, 0xD8, 0xFF, 0xD9]);

	assert!(matches!(kwz.decode_frame(4), Err(FlipnoteError::OutOfRange { .. })));
	assert!(matches!(ppm.layer_pixels(0, 2), Err(FlipnoteError::OutOfRange { .. })));
}

#[test_log::test]
fn test_master_mix_places_effects_on_frames() {
	// silent background music, one effect triggered on frame 3
	let bgm = vec![0i16; 1000];
	let effect = vec![30000i16; 100];
	let mut usage = vec![vec![false; 3]; 6];
	usage[3][0] = true;
	let master = audio::mix_master(1000, Some(&bgm), &[Some(effect), None, None], &usage, 100.0);

	assert_eq!(master.len(), 1000);
	assert!(master[..300].iter().all(|&s| s == 0));
	assert!(master[300..400].iter().all(|&s| s == 30000));
	assert!(master[400..].iter().all(|&s| s == 0));
}

#[test_log::test]
fn test_master_mix_clamps() {
	let effect = vec![30000i16; 10];
	let usage = vec![vec![true, true, false]];
	let master =
		audio::mix_master(10, None, &[Some(effect.clone()), Some(effect), None], &usage, 1.0);
	assert!(master.iter().all(|&s| s == i16::MAX));
	assert_eq!(audio::clipping_ratio(&master), 1.0);
}

#[test_log::test]
fn test_signatures_across_formats() {
	let ppm = flipnote_benches::ppm::animated_note(3, 9).build_signed(sign_ppm);
	let note = Flipnote::from_bytes(ppm).unwrap();
	assert!(note.verify_with_key(PPM_PUBLIC_KEY).unwrap());
	assert!(matches!(note.verify_with_key("not a key"), Err(FlipnoteError::InvalidKey(_))));

	let kwz = flipnote_benches::kwz::animated_note(3, 9).build_signed(sign_kwz);
	let note = Flipnote::from_bytes(kwz).unwrap();
	assert!(note.verify_with_key(KWZ_PUBLIC_KEY).unwrap());
	// PPM and KWZ keys are not interchangeable
	assert!(!note.verify_with_key(PPM_PUBLIC_KEY).unwrap());
}
