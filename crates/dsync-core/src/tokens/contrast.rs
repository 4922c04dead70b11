//! WCAG 2.x contrast checks.

use serde::{Deserialize, Serialize};

use crate::error::{DsyncError, DsyncResult};

/// AA threshold for normal-size text.
pub const WCAG_AA_NORMAL: f64 = 4.5;

/// Outcome of a contrast check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContrastCheck {
    pub valid: bool,
    /// Contrast ratio rounded to two decimals, between 1 and 21.
    pub ratio: f64,
}

/// Check `fg` on `bg` against the AA normal-text threshold.
pub fn validate_contrast(fg: &str, bg: &str) -> DsyncResult<ContrastCheck> {
    check_contrast(fg, bg, WCAG_AA_NORMAL)
}

/// Check `fg` on `bg` against an explicit threshold.
pub fn check_contrast(fg: &str, bg: &str, threshold: f64) -> DsyncResult<ContrastCheck> {
    let ratio = contrast_ratio(fg, bg)?;
    Ok(ContrastCheck {
        valid: ratio >= threshold,
        ratio: (ratio * 100.0).round() / 100.0,
    })
}

/// Unrounded contrast ratio between two hex colors.
pub fn contrast_ratio(fg: &str, bg: &str) -> DsyncResult<f64> {
    let l1 = relative_luminance(parse_hex(fg)?);
    let l2 = relative_luminance(parse_hex(bg)?);
    let (lighter, darker) = if l1 >= l2 { (l1, l2) } else { (l2, l1) };
    Ok((lighter + 0.05) / (darker + 0.05))
}

/// Relative luminance of an sRGB color.
pub fn relative_luminance([r, g, b]: [u8; 3]) -> f64 {
    0.2126 * linearize(r) + 0.7152 * linearize(g) + 0.0722 * linearize(b)
}

fn linearize(channel: u8) -> f64 {
    let c = f64::from(channel) / 255.0;
    if c <= 0.03928 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Parse `#RGB` or `#RRGGBB` (the leading `#` is optional).
pub fn parse_hex(raw: &str) -> DsyncResult<[u8; 3]> {
    let hex = raw.trim().trim_start_matches('#');
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return Err(DsyncError::InvalidColor(raw.to_string())),
    };
    let channel = |i: usize| {
        expanded
            .get(i..i + 2)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .ok_or_else(|| DsyncError::InvalidColor(raw.to_string()))
    };
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extremes() {
        let max = validate_contrast("#000000", "#FFFFFF").unwrap();
        assert_eq!(max.ratio, 21.0);
        assert!(max.valid);

        let min = validate_contrast("#FFFFFF", "#FFFFFF").unwrap();
        assert_eq!(min.ratio, 1.0);
        assert!(!min.valid);
    }

    #[test]
    fn test_threshold_boundary() {
        let pass = validate_contrast("#767676", "#FFFFFF").unwrap();
        assert_eq!(pass.ratio, 4.54);
        assert!(pass.valid);

        let fail = validate_contrast("#777777", "#FFFFFF").unwrap();
        assert_eq!(fail.ratio, 4.48);
        assert!(!fail.valid);
    }

    #[test]
    fn test_order_independent() {
        let a = validate_contrast("#0066CC", "#FFFFFF").unwrap();
        let b = validate_contrast("#FFFFFF", "#0066CC").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#fff").unwrap(), [255, 255, 255]);
        assert_eq!(parse_hex("0066CC").unwrap(), [0, 102, 204]);
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#GGGGGG").is_err());
        assert!(parse_hex("rgb(0,0,0)").is_err());
    }
}
