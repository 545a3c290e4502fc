//! Deterministic material derivation for loaded assets.
//!
//! Colors are CSS-style tokens end to end; anything the normalizer does
//! not recognize passes through for the renderer to interpret. The rules,
//! the neutral default, and the palette are part of the display contract.

use crate::api::ModelAsset;
use crate::render::Material;

/// Neutral color used when an asset carries a material label but no color.
pub const NEUTRAL_COLOR: &str = "#D9DEE7";

/// Fallback palette cycled by asset index when an asset carries neither a
/// color nor a material label. Order matters: it is what makes colors
/// repeatable across sessions.
pub const FALLBACK_PALETTE: [&str; 8] = [
    "#D9DEE7", "#BFC9D6", "#C9D3C1", "#D6C7B8", "#C7CCD3", "#D1D7DD",
    "#C9C2C9", "#D0D0C8",
];

/// Normalize a color value: trim, give bare 6-hex-digit strings a `#`
/// prefix, pass everything else through unchanged. Empty in, empty out.
#[must_use]
pub fn normalize_color_hex(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with('#') {
        return trimmed.to_owned();
    }
    if trimmed.len() == 6 && trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
        return format!("#{trimmed}");
    }
    trimmed.to_owned()
}

/// Display color for an asset.
///
/// In precedence order: a usable `color_hex` always wins (normalized); a
/// material label alone gets the neutral default; neither gets the palette
/// entry at `index % len`.
#[must_use]
pub fn color_for(asset: &ModelAsset, index: usize) -> String {
    let color = asset
        .color_hex
        .as_deref()
        .map(normalize_color_hex)
        .filter(|c| !c.is_empty());
    let has_material = asset
        .material_text
        .as_deref()
        .is_some_and(|t| !t.trim().is_empty());

    match (color, has_material) {
        (Some(color), _) => color,
        (None, true) => NEUTRAL_COLOR.to_owned(),
        (None, false) => {
            FALLBACK_PALETTE[index % FALLBACK_PALETTE.len()].to_owned()
        }
    }
}

/// Initial material record for an asset: full opacity on a
/// translucency-capable, double-sided, non-metallic rough surface. The
/// transparency flags are settled by the first opacity write during
/// registration.
#[must_use]
pub fn material_for(asset: &ModelAsset, index: usize) -> Material {
    Material {
        color: color_for(asset, index),
        opacity: 1.0,
        transparent: true,
        depth_write: true,
        depth_test: true,
        double_sided: true,
        metalness: 0.05,
        roughness: 0.85,
    }
}
