// Material tokens and their display form.
//
// A token is `NAME_VARIANT_RRGGBB` (e.g. `PLA_Black_000000`); an empty token
// means the slot accepts any material.

use serde::Serialize;

/// Token written by selectors for "no constraint"; stored as an empty slot.
pub const ANY_MATERIAL: &str = "Any";

pub const TEXT_DARK: &str = "#000000";
pub const TEXT_LIGHT: &str = "#FFFFFF";
pub const TRANSPARENT: &str = "transparent";

/// Tool slots a set can constrain; writes past this are refused.
pub const MAX_SLOTS: usize = 64;

/// Luma at or above which a background gets dark text.
pub const LUMA_THRESHOLD: f64 = 128.0;

/// Display entry for one tool slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterialView {
    pub title: String,
    pub short_name: String,
    /// Foreground (text) color.
    pub color: String,
    pub bg_color: String,
    /// The raw token this entry was built from.
    pub key: String,
}

impl MaterialView {
    pub fn any() -> Self {
        Self {
            title: "any".to_string(),
            short_name: " ".to_string(),
            color: TRANSPARENT.to_string(),
            bg_color: TRANSPARENT.to_string(),
            key: String::new(),
        }
    }

    pub fn from_token(token: &str) -> Self {
        if token.is_empty() {
            return Self::any();
        }
        let mut parts = token.split('_');
        let name = parts.next().unwrap_or_default();
        let variant = parts.next();
        let bg_color = parts.next().unwrap_or_default().to_string();
        let title = match variant {
            Some(variant) => format!("{} ({})", name, variant),
            None => name.to_string(),
        };
        Self {
            title,
            short_name: short_name(name),
            color: text_color_for_background(&bg_color).to_string(),
            bg_color,
            key: token.to_string(),
        }
    }
}

/// One-letter badge for a material name. PETG gets "G" so it doesn't collide
/// with PLA.
pub fn short_name(name: &str) -> String {
    let name = name.trim().to_uppercase();
    if name == "PETG" {
        return "G".to_string();
    }
    name.chars().next().map(String::from).unwrap_or_else(|| " ".to_string())
}

/// ITU-R BT.709 luma of an sRGB triple, without gamma correction.
pub fn luma(r: u8, g: u8, b: u8) -> f64 {
    0.2126 * f64::from(r) + 0.7152 * f64::from(g) + 0.0722 * f64::from(b)
}

/// Decode `RRGGBB` (optionally `#`-prefixed). Unparseable input decodes as black.
pub fn decode_rgb(rrggbb: &str) -> (u8, u8, u8) {
    let hex = rrggbb.trim().trim_start_matches('#');
    let rgb = u32::from_str_radix(hex, 16).unwrap_or(0);
    (((rgb >> 16) & 0xff) as u8, ((rgb >> 8) & 0xff) as u8, (rgb & 0xff) as u8)
}

/// Text color that stays readable on the given background.
pub fn text_color_for_background(rrggbb: &str) -> &'static str {
    let (r, g, b) = decode_rgb(rrggbb);
    if luma(r, g, b) >= LUMA_THRESHOLD { TEXT_DARK } else { TEXT_LIGHT }
}

/// Write `value` into `slot`, padding with empty slots as needed, then drop
/// trailing empties so the list stays canonical. Returns false, leaving the
/// list untouched, when `slot` is not below [`MAX_SLOTS`].
pub fn assign_slot(materials: &mut Vec<String>, slot: usize, value: &str) -> bool {
    if slot >= MAX_SLOTS {
        return false;
    }
    let value = if value == ANY_MATERIAL { "" } else { value };
    if slot >= materials.len() {
        materials.resize(slot + 1, String::new());
    }
    materials[slot] = value.to_string();
    while materials.last().is_some_and(|m| m.is_empty()) {
        materials.pop();
    }
    true
}
