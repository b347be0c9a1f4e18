use serde::Serialize;

use crate::config::{Config, PointConfig};

/// A fixed coordinate watched for localized rainfall.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitoredPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
}

impl MonitoredPoint {
    pub fn new(label: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            label: label.into(),
        }
    }

    /// Labels arrive as `"<index> - <place>"`; this returns the place part.
    pub fn display_name(&self) -> &str {
        match self.label.split_once(" - ") {
            Some((_, name)) if !name.trim().is_empty() => name.trim(),
            _ => self.label.as_str(),
        }
    }
}

impl From<&PointConfig> for MonitoredPoint {
    fn from(point: &PointConfig) -> Self {
        Self::new(point.label.clone(), point.latitude, point.longitude)
    }
}

pub fn points_from_config(config: &Config) -> Vec<MonitoredPoint> {
    config.points.iter().map(MonitoredPoint::from).collect()
}

#[cfg(test)]
mod tests {
    use super::MonitoredPoint;

    #[test]
    fn display_name_strips_index_prefix() {
        let point = MonitoredPoint::new("14 - Raj Bhavan Road", 17.41, 78.46);
        assert_eq!(point.display_name(), "Raj Bhavan Road");
    }

    #[test]
    fn display_name_falls_back_to_full_label() {
        let point = MonitoredPoint::new("Tank Bund", 17.42, 78.47);
        assert_eq!(point.display_name(), "Tank Bund");

        let dangling = MonitoredPoint::new("7 - ", 17.42, 78.47);
        assert_eq!(dangling.display_name(), "7 - ");
    }
}
