//! Marker colour tags.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Colour tag attached to a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarkerColor {
    /// Default colour.
    #[default]
    Red,
    Blue,
    Green,
    Orange,
    Purple,
}

impl MarkerColor {
    /// All colours in picker order.
    pub const ALL: [MarkerColor; 5] = [
        MarkerColor::Red,
        MarkerColor::Blue,
        MarkerColor::Green,
        MarkerColor::Orange,
        MarkerColor::Purple,
    ];

    /// Display hex code for map pins.
    pub fn hex(&self) -> &'static str {
        match self {
            MarkerColor::Red => "#FF3B30",
            MarkerColor::Blue => "#007AFF",
            MarkerColor::Green => "#34C759",
            MarkerColor::Orange => "#FF9500",
            MarkerColor::Purple => "#AF52DE",
        }
    }

    /// Stable name used for storage.
    pub fn name(&self) -> &'static str {
        match self {
            MarkerColor::Red => "RED",
            MarkerColor::Blue => "BLUE",
            MarkerColor::Green => "GREEN",
            MarkerColor::Orange => "ORANGE",
            MarkerColor::Purple => "PURPLE",
        }
    }

    /// Resolve a stored colour, falling back to red for missing or unknown values.
    pub fn resolve(stored: Option<&str>) -> Self {
        stored
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

impl FromStr for MarkerColor {
    type Err = String;

    /// Accepts a colour name (any case) or its hex code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        MarkerColor::ALL
            .into_iter()
            .find(|c| {
                c.name().eq_ignore_ascii_case(trimmed) || c.hex().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| format!("unknown marker colour '{}'", s))
    }
}

impl std::fmt::Display for MarkerColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_red() {
        assert_eq!(MarkerColor::default(), MarkerColor::Red);
        assert_eq!(MarkerColor::default().hex(), "#FF3B30");
    }

    #[test]
    fn test_parse_name_and_hex() {
        assert_eq!("blue".parse::<MarkerColor>().unwrap(), MarkerColor::Blue);
        assert_eq!("PURPLE".parse::<MarkerColor>().unwrap(), MarkerColor::Purple);
        assert_eq!("#34c759".parse::<MarkerColor>().unwrap(), MarkerColor::Green);
        assert!("teal".parse::<MarkerColor>().is_err());
    }

    #[test]
    fn test_resolve_falls_back_to_red() {
        assert_eq!(MarkerColor::resolve(None), MarkerColor::Red);
        assert_eq!(MarkerColor::resolve(Some("nonsense")), MarkerColor::Red);
        assert_eq!(MarkerColor::resolve(Some("#FF9500")), MarkerColor::Orange);
    }

    #[test]
    fn test_serde_uses_uppercase_names() {
        let json = serde_json::to_string(&MarkerColor::Orange).unwrap();
        assert_eq!(json, "\"ORANGE\"");
    }
}
