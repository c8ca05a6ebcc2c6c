// RptWatch - ui/theme.rs
//
// Severity colour mapping for terminal output.
// No dependencies on app state or business logic.

use crate::core::model::Severity;
use crossterm::style::Color;

/// Foreground colour for an entry, or `None` to keep the terminal default.
pub fn severity_colour(severity: Severity) -> Option<Color> {
    match severity {
        Severity::Error => Some(Color::Red),
        Severity::Warning => Some(Color::Yellow),
        Severity::Normal => None,
    }
}

/// Colour of the banner printed when the active file changes.
pub const SWITCH_BANNER: Color = Color::Cyan;
