use std::fmt;

use serde::Serialize;

/// Display bands for a rainfall amount in mm per hour. Alerting uses the
/// configured thresholds, never these bands.
///
/// Lower bounds: light 1, moderate 5, heavy 15, flood 30. Amounts between
/// the published bands (10-15, 20-30) fall into the band below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SeverityBand {
    Dry,
    Light,
    Moderate,
    Heavy,
    Flood,
}

impl SeverityBand {
    pub fn classify(precipitation_mm: f64) -> Self {
        if precipitation_mm >= 30.0 {
            SeverityBand::Flood
        } else if precipitation_mm >= 15.0 {
            SeverityBand::Heavy
        } else if precipitation_mm >= 5.0 {
            SeverityBand::Moderate
        } else if precipitation_mm >= 1.0 {
            SeverityBand::Light
        } else {
            SeverityBand::Dry
        }
    }
}

impl fmt::Display for SeverityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SeverityBand::Dry => "dry",
            SeverityBand::Light => "light rain",
            SeverityBand::Moderate => "moderate rain",
            SeverityBand::Heavy => "heavy rain",
            SeverityBand::Flood => "flood risk",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::SeverityBand;

    #[test]
    fn band_edges() {
        assert_eq!(SeverityBand::classify(0.0), SeverityBand::Dry);
        assert_eq!(SeverityBand::classify(0.9), SeverityBand::Dry);
        assert_eq!(SeverityBand::classify(1.0), SeverityBand::Light);
        assert_eq!(SeverityBand::classify(5.0), SeverityBand::Moderate);
        assert_eq!(SeverityBand::classify(12.0), SeverityBand::Moderate);
        assert_eq!(SeverityBand::classify(15.0), SeverityBand::Heavy);
        assert_eq!(SeverityBand::classify(25.0), SeverityBand::Heavy);
        assert_eq!(SeverityBand::classify(30.0), SeverityBand::Flood);
    }
}
