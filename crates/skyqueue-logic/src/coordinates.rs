//! Sexagesimal RA/Dec conversion for display.
//!
//! Coordinates only drive the telescope readout, so parsing fails closed:
//! anything malformed becomes 0.0 instead of an error.

use serde::{Deserialize, Serialize};

/// Telescope pointing in decimal hours (RA) and decimal degrees (Dec).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pointing {
    pub ra_hours: f64,
    pub dec_degrees: f64,
}

impl Pointing {
    pub fn parse(ra: &str, dec: &str) -> Self {
        Self {
            ra_hours: parse_ra(ra),
            dec_degrees: parse_dec(dec),
        }
    }

    pub fn ra_text(&self) -> String {
        format_ra(self.ra_hours)
    }

    pub fn dec_text(&self) -> String {
        format_dec(self.dec_degrees)
    }
}

/// Parse `HH:MM:SS` into decimal hours. Returns 0.0 on malformed input.
pub fn parse_ra(text: &str) -> f64 {
    let parts: Vec<&str> = text.trim().split(':').collect();
    if parts.len() != 3 {
        return 0.0;
    }
    let mut values = [0.0f64; 3];
    for (slot, part) in values.iter_mut().zip(&parts) {
        match part.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => *slot = v,
            _ => return 0.0,
        }
    }
    values[0] + values[1] / 60.0 + values[2] / 3600.0
}

/// Parse `±DD°MM'SS"` into decimal degrees. Returns 0.0 on malformed input.
pub fn parse_dec(text: &str) -> f64 {
    parse_dec_parts(text.trim()).unwrap_or(0.0)
}

fn parse_dec_parts(text: &str) -> Option<f64> {
    let (degrees, rest) = text.split_once('°')?;
    let (minutes, rest) = rest.split_once('\'')?;
    let (seconds, _) = rest.split_once('"')?;

    let negative = degrees.starts_with('-');
    let degrees = degrees.trim_start_matches(['+', '-']);
    if [degrees, minutes, seconds]
        .iter()
        .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    let d: f64 = degrees.parse().ok()?;
    let m: f64 = minutes.parse().ok()?;
    let s: f64 = seconds.parse().ok()?;
    let sign = if negative { -1.0 } else { 1.0 };
    Some(sign * (d + m / 60.0 + s / 3600.0))
}

fn split_sexagesimal(value: f64) -> (u32, u32, u32) {
    let whole = value.floor();
    let minutes = ((value - whole) * 60.0).floor();
    let seconds = (((value - whole) * 60.0 - minutes) * 60.0).floor();
    (whole as u32, minutes as u32, seconds as u32)
}

/// Format decimal hours as `HH:MM:SS`.
pub fn format_ra(ra_hours: f64) -> String {
    let (h, m, s) = split_sexagesimal(ra_hours.max(0.0));
    format!("{:02}:{:02}:{:02}", h, m, s)
}

/// Format decimal degrees as `±DD°MM'SS"`.
pub fn format_dec(dec_degrees: f64) -> String {
    let sign = if dec_degrees >= 0.0 { '+' } else { '-' };
    let (d, m, s) = split_sexagesimal(dec_degrees.abs());
    format!("{}{:02}°{:02}'{:02}\"", sign, d, m, s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ra() {
        let ra = parse_ra("05:35:17");
        assert!((ra - (5.0 + 35.0 / 60.0 + 17.0 / 3600.0)).abs() < 1e-9);
        assert_eq!(parse_ra("00:00:00"), 0.0);
    }

    #[test]
    fn test_parse_ra_fails_closed() {
        assert_eq!(parse_ra(""), 0.0);
        assert_eq!(parse_ra("5h35m"), 0.0);
        assert_eq!(parse_ra("05:xx:17"), 0.0);
        assert_eq!(parse_ra("05:35"), 0.0);
    }

    #[test]
    fn test_parse_dec() {
        let dec = parse_dec("-05°23'28\"");
        assert!((dec + (5.0 + 23.0 / 60.0 + 28.0 / 3600.0)).abs() < 1e-9);
        let north = parse_dec("+41°16'09\"");
        assert!((north - (41.0 + 16.0 / 60.0 + 9.0 / 3600.0)).abs() < 1e-9);
        // Sign survives a zero degree field
        assert!(parse_dec("-00°30'00\"") < 0.0);
    }

    #[test]
    fn test_parse_dec_fails_closed() {
        assert_eq!(parse_dec("not a dec"), 0.0);
        assert_eq!(parse_dec("12°18'"), 0.0);
        assert_eq!(parse_dec("+1a°18'32\""), 0.0);
    }

    #[test]
    fn test_format_roundtrip_display() {
        let p = Pointing::parse("22:15:44", "+12°18'32\"");
        // Floating point may shave a second off either readout
        let dec = p.dec_text();
        assert!(dec == "+12°18'32\"" || dec == "+12°18'31\"", "got {}", dec);
        let ra = p.ra_text();
        assert!(ra == "22:15:44" || ra == "22:15:43", "got {}", ra);
        assert_eq!(format_dec(-0.5), "-00°30'00\"");
        assert_eq!(format_ra(0.0), "00:00:00");
    }
}
