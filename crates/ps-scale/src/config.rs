use ps_core::AddressMode;
use serde::{Deserialize, Serialize};

use crate::format::OutputFormat;

/// Scaler options, usually read from JSON.
///
/// Missing fields take their defaults, so `{}` scales nothing and keeps the
/// input format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScaleConfig {
    /// Output width expression, see [`crate::eval_dimensions`].
    pub width: String,
    pub height: String,
    pub format: OutputFormat,
    /// Ordered dithering when the output has fewer bits than the input.
    pub dither: bool,
    pub address_mode: AddressMode,
    /// Copy frames through unchanged when size and format already match.
    pub passthrough: bool,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            width: "iw".to_string(),
            height: "ih".to_string(),
            format: OutputFormat::Same,
            dither: true,
            address_mode: AddressMode::Clamp,
            passthrough: true,
        }
    }
}

impl ScaleConfig {
    pub fn with_size(width: impl Into<String>, height: impl Into<String>) -> Self {
        Self {
            width: width.into(),
            height: height.into(),
            ..Self::default()
        }
    }
}
