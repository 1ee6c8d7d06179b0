use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{SpatialError, SpatialResult};
use crate::geometry::GeometryKind;

/// The declared type of a geometry column.
///
/// `Geometry` is the generic PostGIS column type that accepts any shape.
/// `Unknown` is what the registry answers when neither a declaration nor the
/// catalog says anything about a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
    Geometry,
    Unknown,
}

impl GeometryType {
    /// The type name PostGIS uses in DDL and in `geometry_columns`.
    pub fn sql_name(&self) -> &'static str {
        match self {
            GeometryType::Point => "POINT",
            GeometryType::LineString => "LINESTRING",
            GeometryType::Polygon => "POLYGON",
            GeometryType::MultiPoint => "MULTIPOINT",
            GeometryType::MultiLineString => "MULTILINESTRING",
            GeometryType::MultiPolygon => "MULTIPOLYGON",
            GeometryType::GeometryCollection => "GEOMETRYCOLLECTION",
            GeometryType::Geometry | GeometryType::Unknown => "GEOMETRY",
        }
    }

    /// Snake-case name, as used in model declarations.
    pub fn symbol(&self) -> &'static str {
        match self {
            GeometryType::Point => "point",
            GeometryType::LineString => "line_string",
            GeometryType::Polygon => "polygon",
            GeometryType::MultiPoint => "multi_point",
            GeometryType::MultiLineString => "multi_line_string",
            GeometryType::MultiPolygon => "multi_polygon",
            GeometryType::GeometryCollection => "geometry_collection",
            GeometryType::Geometry => "geometry",
            GeometryType::Unknown => "unknown",
        }
    }

    pub fn from_kind(kind: GeometryKind) -> Self {
        match kind {
            GeometryKind::Point => GeometryType::Point,
            GeometryKind::LineString => GeometryType::LineString,
            GeometryKind::Polygon => GeometryType::Polygon,
            GeometryKind::MultiPoint => GeometryType::MultiPoint,
            GeometryKind::MultiLineString => GeometryType::MultiLineString,
            GeometryKind::MultiPolygon => GeometryType::MultiPolygon,
            GeometryKind::GeometryCollection => GeometryType::GeometryCollection,
        }
    }

    /// Returns `true` if a value of `kind` may be stored in a column of this
    /// type.
    pub fn accepts(&self, kind: GeometryKind) -> bool {
        match self {
            GeometryType::Geometry | GeometryType::Unknown => true,
            declared => *declared == GeometryType::from_kind(kind),
        }
    }
}

impl FromStr for GeometryType {
    type Err = SpatialError;

    /// Parses snake-case symbols (`line_string`) as well as SQL names
    /// (`LINESTRING`), case-insensitively.
    fn from_str(s: &str) -> SpatialResult<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();

        match normalized.as_str() {
            "POINT" => Ok(GeometryType::Point),
            "LINESTRING" => Ok(GeometryType::LineString),
            "POLYGON" => Ok(GeometryType::Polygon),
            "MULTIPOINT" => Ok(GeometryType::MultiPoint),
            "MULTILINESTRING" => Ok(GeometryType::MultiLineString),
            "MULTIPOLYGON" => Ok(GeometryType::MultiPolygon),
            "GEOMETRYCOLLECTION" => Ok(GeometryType::GeometryCollection),
            "GEOMETRY" => Ok(GeometryType::Geometry),
            "UNKNOWN" => Ok(GeometryType::Unknown),
            _ => Err(SpatialError::Schema(format!("unknown geometry type '{}'", s))),
        }
    }
}

impl Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbols_and_sql_names() {
        assert_eq!("point".parse::<GeometryType>().unwrap(), GeometryType::Point);
        assert_eq!("line_string".parse::<GeometryType>().unwrap(), GeometryType::LineString);
        assert_eq!("LINESTRING".parse::<GeometryType>().unwrap(), GeometryType::LineString);
        assert_eq!("MultiPolygon".parse::<GeometryType>().unwrap(), GeometryType::MultiPolygon);
        assert_eq!(
            "geometry_collection".parse::<GeometryType>().unwrap(),
            GeometryType::GeometryCollection
        );
        assert!("circle".parse::<GeometryType>().is_err());
    }

    #[test]
    fn test_symbol_roundtrip() {
        for ty in [
            GeometryType::Point,
            GeometryType::LineString,
            GeometryType::Polygon,
            GeometryType::MultiPoint,
            GeometryType::MultiLineString,
            GeometryType::MultiPolygon,
            GeometryType::GeometryCollection,
            GeometryType::Geometry,
        ] {
            assert_eq!(ty.symbol().parse::<GeometryType>().unwrap(), ty);
            assert_eq!(ty.sql_name().parse::<GeometryType>().unwrap(), ty);
        }
    }

    #[test]
    fn test_accepts() {
        assert!(GeometryType::Point.accepts(GeometryKind::Point));
        assert!(!GeometryType::Point.accepts(GeometryKind::Polygon));
        assert!(GeometryType::Geometry.accepts(GeometryKind::MultiPolygon));
        assert!(GeometryType::Unknown.accepts(GeometryKind::LineString));
    }
}
