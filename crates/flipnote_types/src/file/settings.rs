//! Parser configuration.

use serde::{Deserialize, Serialize};

/// Knobs that change how a note is decoded.
///
/// All fields have defaults, so a partial TOML or JSON document deserializes
/// cleanly:
///
/// ```
/// use flipnote_types::file::ParserSettings;
///
/// let settings: ParserSettings = serde_json::from_str(r#"{ "dsi_library_step_index": 12 }"#).unwrap();
/// assert_eq!(settings.dsi_library_step_index, Some(12));
/// assert_eq!(settings.initial_step_index, 40);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
	/// Initial ADPCM step index for KWZ audio
	pub initial_step_index: u8,
	/// Initial ADPCM step index for DSi Library notes. When unset, the value
	/// giving the quietest output is searched for.
	pub dsi_library_step_index: Option<u8>,
	/// Initial ADPCM predictor for DSi Library notes (defaults to 0)
	pub dsi_library_predictor: Option<i16>,
	/// Skip layers flagged as hidden when compositing frames
	pub apply_layer_visibility: bool,
	/// Overrides DSi Library detection for KWZ notes
	pub force_dsi_library: Option<bool>,
}

impl Default for ParserSettings {
	fn default() -> Self {
		Self {
			initial_step_index: 40,
			dsi_library_step_index: None,
			dsi_library_predictor: None,
			apply_layer_visibility: true,
			force_dsi_library: None,
		}
	}
}
