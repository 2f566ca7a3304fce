// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::sync::Arc;

use lazy_static::lazy_static;

lazy_static! {
    // Department colours, in the order new departments receive them.
    static ref DEPARTMENT_PALETTE: Arc<Vec<String>> = Arc::new(vec![
        "#3B82F6".to_string(), // Blue
        "#10B981".to_string(), // Emerald
        "#F59E0B".to_string(), // Amber
        "#EF4444".to_string(), // Red
        "#8B5CF6".to_string(), // Violet
        "#EC4899".to_string(), // Pink
        "#F97316".to_string(), // Orange
        "#06B6D4".to_string(), // Cyan
        "#6366F1".to_string(), // Indigo
        "#84CC16".to_string(), // Lime
        "#059669".to_string(), // Green
        "#6B7280".to_string(), // Grey
    ]);
}

pub fn palette() -> Arc<Vec<String>> {
    Arc::clone(&DEPARTMENT_PALETTE)
}

/// Palette colour at `index`, wrapping around.
pub fn palette_color(index: usize) -> String {
    DEPARTMENT_PALETTE[index % DEPARTMENT_PALETTE.len()].clone()
}

/// Case-insensitive palette membership.
pub fn is_palette_color(color: &str) -> bool {
    DEPARTMENT_PALETTE
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(color))
}

/// Canonical (uppercase) spelling of a palette colour.
pub fn normalize_color(color: &str) -> Option<String> {
    DEPARTMENT_PALETTE
        .iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(color))
        .cloned()
}

/// Picks a colour for a new department.
/// The first palette colour nobody uses wins; once all are taken the
/// palette is cycled by the number of colours already in use.
pub fn next_department_color(used: &[String]) -> String {
    DEPARTMENT_PALETTE
        .iter()
        .find(|candidate| !used.iter().any(|u| u.eq_ignore_ascii_case(candidate)))
        .cloned()
        .unwrap_or_else(|| palette_color(used.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_color_when_nothing_used() {
        assert_eq!(next_department_color(&[]), "#3B82F6");
    }

    #[test]
    fn test_skips_used_colors() {
        let used = vec!["#3b82f6".to_string(), "#F59E0B".to_string()];
        assert_eq!(next_department_color(&used), "#10B981");
    }

    #[test]
    fn test_palette_wraps_around() {
        let used: Vec<String> = palette().iter().cloned().chain(["#3B82F6".to_string()]).collect();
        // 13 colours in use, 12 in the palette.
        assert_eq!(next_department_color(&used), "#10B981");
        assert_eq!(palette_color(12), "#3B82F6");
    }

    #[test]
    fn test_palette_membership() {
        assert!(is_palette_color("#6b7280"));
        assert!(!is_palette_color("#123456"));
        assert_eq!(normalize_color("#ec4899").as_deref(), Some("#EC4899"));
        assert_eq!(normalize_color("pink"), None);
    }
}
