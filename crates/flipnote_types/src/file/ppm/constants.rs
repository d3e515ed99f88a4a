//! Constants used in `.PPM` files

/// File magic
pub const MAGIC: [u8; 4] = *b"PARA";

/// Frame width in pixels
pub const FRAME_WIDTH: usize = 256;

/// Frame height in pixels
pub const FRAME_HEIGHT: usize = 192;

/// Number of drawing layers per frame
pub const LAYER_COUNT: usize = 2;

/// Number of palette slots per frame (paper plus one pen per layer)
pub const PALETTE_SLOTS: usize = 3;

/// Frames per second for each frame speed
pub const FRAMERATES: [f64; 9] = [0.5, 0.5, 1.0, 2.0, 4.0, 6.0, 12.0, 20.0, 30.0];

/// Sample rate of the stored ADPCM audio
pub const RAW_SAMPLE_RATE: f64 = 8192.0;

/// Default output sample rate
pub const OUTPUT_SAMPLE_RATE: u32 = 32768;

/// Length of the RSA signature following the sound data
pub const SIGNATURE_SIZE: usize = 128;

/// Offset of the thumbnail bitmap
pub const THUMBNAIL_OFFSET: usize = 0xA0;

/// Thumbnail width in pixels
pub const THUMBNAIL_WIDTH: usize = 64;

/// Thumbnail height in pixels
pub const THUMBNAIL_HEIGHT: usize = 48;

/// Offset of the frame data block
pub const FRAME_DATA_OFFSET: usize = 0x6A0;

/// Offset of the animation flags
pub const ANIMATION_FLAGS_OFFSET: usize = 0x6A6;

/// Offset of the frame offset table
pub const FRAME_TABLE_OFFSET: usize = 0x6A8;

/// Size of the sound header
pub const SOUND_HEADER_SIZE: usize = 32;

/// Number of sound effect tracks
pub const SOUND_EFFECT_COUNT: usize = 3;

/// Bytes of line types per layer (2 bits for each of 192 lines)
pub const LINE_TABLE_SIZE: usize = FRAME_HEIGHT / 4;
