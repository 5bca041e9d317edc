use serde::{Deserialize, Serialize};

/// Tile kind laid down by default on the shadow side.
pub const DEFAULT_TILE_KIND: &str = "FloorChromite";

/// Immutable generation parameters.
///
/// Together with the source grid contents these fully determine the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowMapParams {
    pub seed: u64,

    #[serde(default = "default_tile_kind")]
    pub tile_kind: String,

    /// Draw tile variants from the seeded RNG instead of always using 0.
    #[serde(default)]
    pub tile_variation: bool,
}

fn default_tile_kind() -> String {
    DEFAULT_TILE_KIND.to_string()
}

impl ShadowMapParams {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            tile_kind: default_tile_kind(),
            tile_variation: false,
        }
    }

    pub fn with_tile_kind(mut self, kind: impl Into<String>) -> Self {
        self.tile_kind = kind.into();
        self
    }

    pub fn with_tile_variation(mut self, enabled: bool) -> Self {
        self.tile_variation = enabled;
        self
    }
}
