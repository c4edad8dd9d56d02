//! Terminal output utilities.
//!
//! Provides formatting helpers for terminal output.

/// Format a value as a left-aligned column of at least `width` characters.
///
/// # Arguments
/// * `value` - The value to format
/// * `width` - The minimum width of the field
///
/// # Returns
/// The value padded on the right, or unchanged when already wider
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let value_str = value.to_string();
    if value_str.chars().count() >= width {
        value_str
    } else {
        format!("{value_str:<width$}")
    }
}

/// Horizontal rule with an optional title, as wide as `width`.
pub fn rule(title: &str, width: usize) -> String {
    if title.is_empty() {
        return "=".repeat(width);
    }
    let title = format!(" {title} ");
    let left = width.saturating_sub(title.chars().count()) / 2;
    let right = width.saturating_sub(title.chars().count() + left);
    format!("{}{}{}", "=".repeat(left), title, "=".repeat(right))
}
