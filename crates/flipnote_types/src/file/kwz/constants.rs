//! Constants used in `.KWZ` files

/// Frame width in pixels
pub const FRAME_WIDTH: usize = 320;

/// Frame height in pixels
pub const FRAME_HEIGHT: usize = 240;

/// Number of drawing layers per frame
pub const LAYER_COUNT: usize = 3;

/// Number of palette slots per frame (paper plus two pens per layer)
pub const PALETTE_SLOTS: usize = 7;

/// Side of the square crop used for folder icons
pub const ICON_SIZE: usize = 24;

/// Frames per second for each frame speed index
pub const FRAMERATES: [f64; 11] = [0.2, 0.5, 1.0, 2.0, 4.0, 6.0, 8.0, 12.0, 20.0, 24.0, 30.0];

/// Sample rate of the stored ADPCM audio
pub const RAW_SAMPLE_RATE: f64 = 16364.0;

/// Default output sample rate
pub const OUTPUT_SAMPLE_RATE: u32 = 32768;

/// Length of the trailing RSA signature
pub const SIGNATURE_SIZE: usize = 256;

/// Size of a section header (magic plus length)
pub const SECTION_HEADER_SIZE: usize = 8;

/// Maximum number of sections scanned
pub const MAX_SECTIONS: usize = 6;

/// Size of one `KMI` frame record
pub const FRAME_RECORD_SIZE: usize = 28;

/// Stored size of a layer that did not change since the previous frame
pub const UNCHANGED_LAYER_SIZE: usize = 38;

/// Number of sound effect tracks
pub const SOUND_EFFECT_COUNT: usize = 4;

/// Default initial ADPCM step index
pub const DEFAULT_STEP_INDEX: u8 = 40;

/// Largest initial step index tried when searching DSi Library audio state
pub const DSI_LIBRARY_MAX_STEP_INDEX: u8 = 40;
