//! Band identity and per-band tuning

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two monitored frequency regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    /// Bass / kick fundamentals
    Low,
    /// Voice / presence
    High,
}

impl Band {
    /// Both bands in evaluation order. Low always comes first.
    pub const ALL: [Band; 2] = [Band::Low, Band::High];

    /// Name of the event raised when this band fires
    pub fn event_name(self) -> &'static str {
        match self {
            Band::Low => "sharp",
            Band::High => "subtle",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Filter and threshold parameters for a single band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandSettings {
    /// Bandpass center frequency in Hz
    pub center_hz: f32,
    /// Bandpass quality factor
    pub q: f32,
    /// Threshold floor in dB; the adaptive threshold never goes below this
    pub min_threshold_db: f32,
}

impl BandSettings {
    /// Defaults for the given band
    pub fn default_for(band: Band) -> Self {
        match band {
            Band::Low => Self {
                center_hz: 100.0,
                q: 1.0,
                min_threshold_db: -38.0,
            },
            Band::High => Self {
                center_hz: 2000.0,
                q: 3.0,
                min_threshold_db: -42.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Band::Low.event_name(), "sharp");
        assert_eq!(Band::High.event_name(), "subtle");
    }

    #[test]
    fn test_evaluation_order() {
        assert_eq!(Band::ALL, [Band::Low, Band::High]);
    }

    #[test]
    fn test_default_thresholds() {
        assert_eq!(BandSettings::default_for(Band::Low).min_threshold_db, -38.0);
        assert_eq!(BandSettings::default_for(Band::High).min_threshold_db, -42.0);
    }
}
