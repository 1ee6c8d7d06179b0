//! Client-side unit conversion and UTM zone selection.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::errors::{SpatialError, SpatialResult};

/// The unit a sphere or spheroid distance is reported in. The database
/// always answers in meters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistanceUnit {
    #[default]
    Meters,
    Kilometers,
    Miles,
    NauticalMiles,
    Feet,
}

impl DistanceUnit {
    /// Length of one unit in meters.
    pub fn meters_per_unit(&self) -> f64 {
        match self {
            DistanceUnit::Meters => 1.0,
            DistanceUnit::Kilometers => 1_000.0,
            DistanceUnit::Miles => 1_609.344,
            DistanceUnit::NauticalMiles => 1_852.0,
            DistanceUnit::Feet => 0.3048,
        }
    }

    pub fn from_meters(&self, meters: f64) -> f64 {
        meters / self.meters_per_unit()
    }

    pub fn to_meters(&self, value: f64) -> f64 {
        value * self.meters_per_unit()
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            DistanceUnit::Meters => "m",
            DistanceUnit::Kilometers => "km",
            DistanceUnit::Miles => "mi",
            DistanceUnit::NauticalMiles => "nmi",
            DistanceUnit::Feet => "ft",
        }
    }
}

impl Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// WGS 84 / UTM northern zones are `32601..=32660`.
pub const UTM_NORTH_BASE: i32 = 32600;
/// WGS 84 / UTM southern zones are `32701..=32760`.
pub const UTM_SOUTH_BASE: i32 = 32700;

/// The UTM zone number (1 to 60) for a WGS 84 position, including the
/// Norway and Svalbard exceptions.
pub fn utm_zone_number(longitude: f64, latitude: f64) -> SpatialResult<i32> {
    if !longitude.is_finite()
        || !latitude.is_finite()
        || !(-180.0..=180.0).contains(&longitude)
        || !(-90.0..=90.0).contains(&latitude)
    {
        log::error!("Position ({}, {}) is not a WGS 84 coordinate", longitude, latitude);
        return Err(SpatialError::InvalidParameter(format!(
            "({}, {}) is not a longitude/latitude pair",
            longitude, latitude
        )));
    }

    if (56.0..64.0).contains(&latitude) && (3.0..12.0).contains(&longitude) {
        return Ok(32);
    }

    if (72.0..84.0).contains(&latitude) {
        match longitude {
            lon if (0.0..9.0).contains(&lon) => return Ok(31),
            lon if (9.0..21.0).contains(&lon) => return Ok(33),
            lon if (21.0..33.0).contains(&lon) => return Ok(35),
            lon if (33.0..42.0).contains(&lon) => return Ok(37),
            _ => {}
        }
    }

    let zone = ((longitude + 180.0) / 6.0).floor() as i32 + 1;
    Ok(zone.clamp(1, 60))
}

/// The EPSG code of the WGS 84 / UTM zone covering a position: `326zz` in
/// the northern hemisphere and `327zz` in the southern one.
pub fn utm_srid(longitude: f64, latitude: f64) -> SpatialResult<i32> {
    let zone = utm_zone_number(longitude, latitude)?;
    let base = if latitude >= 0.0 {
        UTM_NORTH_BASE
    } else {
        UTM_SOUTH_BASE
    };
    Ok(base + zone)
}
