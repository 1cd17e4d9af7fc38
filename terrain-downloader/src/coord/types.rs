//! Coordinate type definitions

use std::fmt;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Valid latitude range
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Highest level the tiling scheme can represent without overflowing `u32` tile counts.
pub const MAX_LEVEL: u32 = 30;

/// A rectangle in geographic degrees.
///
/// `east < west` means the rectangle crosses the antimeridian; `width`
/// accounts for the wrap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeographicRectangle {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeographicRectangle {
    /// The whole globe, used as the reference rectangle of the tiling grid.
    pub const GLOBAL: GeographicRectangle = GeographicRectangle {
        west: MIN_LON,
        south: MIN_LAT,
        east: MAX_LON,
        north: MAX_LAT,
    };

    /// Creates a validated rectangle.
    ///
    /// Longitudes must lie in [-180, 180], latitudes in [-90, 90], and
    /// `south` must not exceed `north`.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Result<Self, CoordError> {
        for lon in [west, east] {
            if !lon.is_finite() || !(MIN_LON..=MAX_LON).contains(&lon) {
                return Err(CoordError::InvalidLongitude(lon));
            }
        }
        for lat in [south, north] {
            if !lat.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&lat) {
                return Err(CoordError::InvalidLatitude(lat));
            }
        }
        if south > north {
            return Err(CoordError::InvertedLatitudes { south, north });
        }

        Ok(Self {
            west,
            south,
            east,
            north,
        })
    }

    /// Width in degrees, adding 360 when the rectangle wraps the antimeridian.
    pub fn width(&self) -> f64 {
        let mut east = self.east;
        if east < self.west {
            east += 360.0;
        }
        east - self.west
    }

    /// Height in degrees.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// South-west corner as `(longitude, latitude)`.
    pub fn south_west(&self) -> (f64, f64) {
        (self.west, self.south)
    }

    /// North-east corner as `(longitude, latitude)`.
    pub fn north_east(&self) -> (f64, f64) {
        (self.east, self.north)
    }
}

impl std::str::FromStr for GeographicRectangle {
    type Err = CoordError;

    /// Parses `west,south,east,north`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| CoordError::Malformed(s.to_string()))?;

        match parts.as_slice() {
            [west, south, east, north] => Self::new(*west, *south, *east, *north),
            _ => Err(CoordError::Malformed(s.to_string())),
        }
    }
}

impl fmt::Display for GeographicRectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "W {:.4} S {:.4} E {:.4} N {:.4}",
            self.west, self.south, self.east, self.north
        )
    }
}

/// A tile address in the geographic tiling scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileIndex {
    /// Zoom level
    pub level: u32,
    /// Column, 0 at the west edge
    pub x: u32,
    /// Row as counted by the terrain service
    pub y: u32,
}

impl TileIndex {
    pub fn new(level: u32, x: u32, y: u32) -> Self {
        Self { level, x, y }
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.level, self.x, self.y)
    }
}

/// Errors that can occur while building coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Longitude outside [-180, 180] or not finite
    InvalidLongitude(f64),
    /// Latitude outside [-90, 90] or not finite
    InvalidLatitude(f64),
    /// South edge lies north of the north edge
    InvertedLatitudes { south: f64, north: f64 },
    /// Text that is not four comma separated numbers
    Malformed(String),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLongitude(lon) => {
                write!(f, "Invalid longitude: {} (must be -180 to 180)", lon)
            }
            CoordError::InvalidLatitude(lat) => {
                write!(f, "Invalid latitude: {} (must be -90 to 90)", lat)
            }
            CoordError::InvertedLatitudes { south, north } => {
                write!(f, "South edge {} is north of north edge {}", south, north)
            }
            CoordError::Malformed(s) => {
                write!(f, "Expected 'west,south,east,north', got '{}'", s)
            }
        }
    }
}

impl std::error::Error for CoordError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_dimensions() {
        assert_eq!(GeographicRectangle::GLOBAL.width(), 360.0);
        assert_eq!(GeographicRectangle::GLOBAL.height(), 180.0);
    }

    #[test]
    fn test_width_wraps_antimeridian() {
        let rect = GeographicRectangle::new(170.0, -10.0, -170.0, 10.0).unwrap();
        assert_eq!(rect.width(), 20.0);
        assert_eq!(rect.height(), 20.0);
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(matches!(
            GeographicRectangle::new(-181.0, 0.0, 0.0, 1.0),
            Err(CoordError::InvalidLongitude(_))
        ));
        assert!(matches!(
            GeographicRectangle::new(0.0, -91.0, 1.0, 1.0),
            Err(CoordError::InvalidLatitude(_))
        ));
        assert!(matches!(
            GeographicRectangle::new(0.0, f64::NAN, 1.0, 1.0),
            Err(CoordError::InvalidLatitude(_))
        ));
        assert!(matches!(
            GeographicRectangle::new(0.0, 10.0, 1.0, 5.0),
            Err(CoordError::InvertedLatitudes { .. })
        ));
    }

    #[test]
    fn test_parse_rectangle() {
        let rect: GeographicRectangle = "116.0, 39.5,117.0,40.5".parse().unwrap();
        assert_eq!(rect.south_west(), (116.0, 39.5));
        assert_eq!(rect.north_east(), (117.0, 40.5));
    }

    #[test]
    fn test_parse_rectangle_malformed() {
        assert!(matches!(
            "1,2,3".parse::<GeographicRectangle>(),
            Err(CoordError::Malformed(_))
        ));
        assert!(matches!(
            "a,b,c,d".parse::<GeographicRectangle>(),
            Err(CoordError::Malformed(_))
        ));
    }

    #[test]
    fn test_tile_index_display() {
        assert_eq!(TileIndex::new(3, 5, 2).to_string(), "3/5/2");
    }
}
