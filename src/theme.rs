//! Dashboard colors.
//!
//! A Nord palette with semantic aliases; widgets use the aliases where one
//! exists.

use ratatui::style::Color;

// === Nord palette ===

/// Darkest polar night shade, used behind the progress gauge.
pub const NORD_POLAR_NIGHT_1: Color = Color::Rgb(46, 52, 64);
pub const NORD_POLAR_NIGHT_3: Color = Color::Rgb(67, 76, 94);
/// Scrollbar tracks and muted text.
pub const NORD_POLAR_NIGHT_4: Color = Color::Rgb(76, 86, 106);
pub const NORD_SNOW_STORM_1: Color = Color::Rgb(216, 222, 233);
/// Cyan accent; also TOML keys in the config viewer.
pub const NORD_FROST_2: Color = Color::Rgb(136, 192, 208);
pub const NORD_RED: Color = Color::Rgb(191, 97, 106);
/// TOML section headers and warnings.
pub const NORD_YELLOW: Color = Color::Rgb(235, 203, 139);
/// TOML strings and success.
pub const NORD_GREEN: Color = Color::Rgb(163, 190, 140);
/// TOML numbers and booleans.
pub const NORD_PURPLE: Color = Color::Rgb(180, 142, 173);

// === Semantic aliases ===

pub const TEXT_PRIMARY: Color = NORD_SNOW_STORM_1;
pub const TEXT_SECONDARY: Color = NORD_POLAR_NIGHT_4;
pub const ACCENT_PRIMARY: Color = NORD_FROST_2;
pub const SUCCESS: Color = NORD_GREEN;
pub const WARNING: Color = NORD_YELLOW;
pub const ERROR: Color = NORD_RED;
/// Steps that have not started yet.
pub const INACTIVE: Color = Color::Gray;

// === UI elements ===

pub const BORDER_DEFAULT: Color = NORD_POLAR_NIGHT_3;
pub const BORDER_FOCUSED: Color = NORD_FROST_2;
pub const ROW_SELECTED_BG: Color = Color::Rgb(40, 40, 40);
pub const ROW_SELECTED_FG: Color = NORD_FROST_2;
