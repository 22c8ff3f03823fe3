// Coarse geographic buckets for the sidebar filter.
// The boxes are rough rectangles around the main rail hubs, not administrative borders.
use crate::ftt_models::FTTError;
use geo_types::{Rect, coord};
use lazy_static::lazy_static;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Region {
    /// No filter.
    #[default]
    All,
    Uusimaa,
    Pirkanmaa,
    CentralFinland,
    NorthernOstrobothnia,
    Lapland,
    Other,
}

lazy_static! {
    // Ordered: the first box that strictly contains the point wins.
    // Rects are stored as x = longitude, y = latitude.
    static ref REGION_BOXES: [(Region, Rect<f64>); 5] = [
        (Region::Uusimaa, Rect::new(coord! { x: 24.4, y: 59.8 }, coord! { x: 25.5, y: 60.5 })),
        (Region::Pirkanmaa, Rect::new(coord! { x: 23.5, y: 60.5 }, coord! { x: 24.5, y: 61.7 })),
        (Region::CentralFinland, Rect::new(coord! { x: 25.0, y: 61.7 }, coord! { x: 27.0, y: 63.0 })),
        (Region::NorthernOstrobothnia, Rect::new(coord! { x: 25.0, y: 63.0 }, coord! { x: 30.0, y: 66.0 })),
        (
            Region::Lapland,
            Rect::new(
                coord! { x: f64::NEG_INFINITY, y: 66.0 },
                coord! { x: f64::INFINITY, y: f64::INFINITY },
            ),
        ),
    ];
}

impl Region {
    /// Every selectable value, in dropdown order.
    pub const ALL: [Region; 7] = [
        Region::All,
        Region::Uusimaa,
        Region::Pirkanmaa,
        Region::CentralFinland,
        Region::NorthernOstrobothnia,
        Region::Lapland,
        Region::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Region::All => "All",
            Region::Uusimaa => "Uusimaa",
            Region::Pirkanmaa => "Pirkanmaa",
            Region::CentralFinland => "Central Finland",
            Region::NorthernOstrobothnia => "Northern Ostrobothnia",
            Region::Lapland => "Lapland",
            Region::Other => "Other",
        }
    }

    /// Classify a coordinate. Total: anything outside every box (NaN included) is `Other`.
    pub fn classify(lat: f64, lon: f64) -> Region {
        REGION_BOXES
            .iter()
            .find(|(_, rect)| strictly_inside(rect, lat, lon))
            .map(|(region, _)| *region)
            .unwrap_or(Region::Other)
    }

    /// Whether a train in `region` passes this filter. Trains without a
    /// position only pass `All`.
    pub fn admits(self, region: Option<Region>) -> bool {
        match self {
            Region::All => true,
            selected => region == Some(selected),
        }
    }
}

fn strictly_inside(rect: &Rect<f64>, lat: f64, lon: f64) -> bool {
    lon > rect.min().x && lon < rect.max().x && lat > rect.min().y && lat < rect.max().y
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Region {
    type Err = FTTError;

    /// Case-insensitive; `-` and `_` may stand in for spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['-', '_'], " ");
        Region::ALL
            .into_iter()
            .find(|region| region.label().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| {
                let names: Vec<&str> = Region::ALL.iter().map(|r| r.label()).collect();
                FTTError::ConfigError(format!(
                    "unknown region '{}', expected one of: {}",
                    s,
                    names.join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_rail_hubs() {
        assert_eq!(Region::classify(60.17, 24.94), Region::Uusimaa); // Helsinki
        assert_eq!(Region::classify(61.50, 23.76), Region::Pirkanmaa); // Tampere
        assert_eq!(Region::classify(62.24, 25.75), Region::CentralFinland); // Jyväskylä
        assert_eq!(Region::classify(65.01, 25.47), Region::NorthernOstrobothnia); // Oulu
        assert_eq!(Region::classify(66.50, 25.72), Region::Lapland); // Rovaniemi
        assert_eq!(Region::classify(60.45, 22.27), Region::Other); // Turku
    }

    #[test]
    fn bounds_are_exclusive() {
        assert_eq!(Region::classify(59.8, 25.0), Region::Other);
        assert_eq!(Region::classify(60.5, 24.45), Region::Other);
        assert_eq!(Region::classify(60.0, 24.4), Region::Other);
        assert_eq!(Region::classify(63.0, 26.0), Region::Other);
        assert_eq!(Region::classify(66.0, 26.0), Region::Other);
        assert_eq!(Region::classify(66.000001, 26.0), Region::Lapland);
    }

    #[test]
    fn first_matching_box_wins() {
        // 24.45 lies in both the Uusimaa and Pirkanmaa longitude bands.
        assert_eq!(Region::classify(60.4, 24.45), Region::Uusimaa);
        assert_eq!(Region::classify(60.6, 24.45), Region::Pirkanmaa);
    }

    #[test]
    fn classification_is_total() {
        let mut lat = -90.0;
        while lat <= 90.0 {
            let mut lon = -180.0;
            while lon <= 180.0 {
                let region = Region::classify(lat, lon);
                assert_ne!(region, Region::All);
                assert!(Region::ALL.contains(&region));
                lon += 0.7;
            }
            lat += 0.3;
        }
        assert_eq!(Region::classify(f64::NAN, 25.0), Region::Other);
        assert_eq!(Region::classify(70.0, f64::NAN), Region::Other);
    }

    #[test]
    fn lapland_ignores_longitude() {
        assert_eq!(Region::classify(68.0, -120.0), Region::Lapland);
        assert_eq!(Region::classify(68.0, 179.0), Region::Lapland);
    }

    #[test]
    fn admits_filters_by_region() {
        assert!(Region::All.admits(None));
        assert!(Region::All.admits(Some(Region::Lapland)));
        assert!(Region::Uusimaa.admits(Some(Region::Uusimaa)));
        assert!(!Region::Lapland.admits(Some(Region::Uusimaa)));
        assert!(!Region::Other.admits(None));
    }

    #[test]
    fn parses_labels_loosely() {
        assert_eq!("all".parse::<Region>().unwrap(), Region::All);
        assert_eq!("Central Finland".parse::<Region>().unwrap(), Region::CentralFinland);
        assert_eq!("northern-ostrobothnia".parse::<Region>().unwrap(), Region::NorthernOstrobothnia);
        assert!("Karelia".parse::<Region>().is_err());
        for region in Region::ALL {
            assert_eq!(region.to_string().parse::<Region>().unwrap(), region);
        }
    }
}
