//! The closed set of spatial operations the adapter can emit.

use std::fmt::{self, Display};
use std::str::FromStr;

use crate::config::FunctionNaming;
use crate::errors::{SpatialError, SpatialResult};

/// PostGIS bounding-box operators.
///
/// These compare bounding boxes only and are rendered infix between the two
/// geometry expressions, e.g. `(w1.geom << w2.geom)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BboxOperator {
    /// `<<`
    StrictlyLeft,
    /// `>>`
    StrictlyRight,
    /// `&<`
    OverlapsOrLeft,
    /// `&>`
    OverlapsOrRight,
    /// `<<|`
    StrictlyBelow,
    /// `|>>`
    StrictlyAbove,
    /// `&<|`
    OverlapsOrBelow,
    /// `|&>`
    OverlapsOrAbove,
    /// `=`
    Same,
    /// `@`
    ContainedBy,
    /// `~`
    Contains,
    /// `&&`
    Interacts,
    /// `~=`
    BinaryEqual,
}

impl BboxOperator {
    pub const ALL: [BboxOperator; 13] = [
        BboxOperator::StrictlyLeft,
        BboxOperator::StrictlyRight,
        BboxOperator::OverlapsOrLeft,
        BboxOperator::OverlapsOrRight,
        BboxOperator::StrictlyBelow,
        BboxOperator::StrictlyAbove,
        BboxOperator::OverlapsOrBelow,
        BboxOperator::OverlapsOrAbove,
        BboxOperator::Same,
        BboxOperator::ContainedBy,
        BboxOperator::Contains,
        BboxOperator::Interacts,
        BboxOperator::BinaryEqual,
    ];

    /// The operator token as written in SQL.
    pub fn token(&self) -> &'static str {
        match self {
            BboxOperator::StrictlyLeft => "<<",
            BboxOperator::StrictlyRight => ">>",
            BboxOperator::OverlapsOrLeft => "&<",
            BboxOperator::OverlapsOrRight => "&>",
            BboxOperator::StrictlyBelow => "<<|",
            BboxOperator::StrictlyAbove => "|>>",
            BboxOperator::OverlapsOrBelow => "&<|",
            BboxOperator::OverlapsOrAbove => "|&>",
            BboxOperator::Same => "=",
            BboxOperator::ContainedBy => "@",
            BboxOperator::Contains => "~",
            BboxOperator::Interacts => "&&",
            BboxOperator::BinaryEqual => "~=",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BboxOperator::StrictlyLeft => "strictly left of",
            BboxOperator::StrictlyRight => "strictly right of",
            BboxOperator::OverlapsOrLeft => "overlaps or is left of",
            BboxOperator::OverlapsOrRight => "overlaps or is right of",
            BboxOperator::StrictlyBelow => "strictly below",
            BboxOperator::StrictlyAbove => "strictly above",
            BboxOperator::OverlapsOrBelow => "overlaps or is below",
            BboxOperator::OverlapsOrAbove => "overlaps or is above",
            BboxOperator::Same => "same bounding box as",
            BboxOperator::ContainedBy => "contained by",
            BboxOperator::Contains => "contains",
            BboxOperator::Interacts => "interacts with",
            BboxOperator::BinaryEqual => "binary equal to",
        }
    }
}

impl FromStr for BboxOperator {
    type Err = SpatialError;

    fn from_str(token: &str) -> SpatialResult<Self> {
        BboxOperator::ALL
            .into_iter()
            .find(|op| op.token() == token)
            .ok_or_else(|| {
                log::error!("Unknown bounding box operator {:?}", token);
                SpatialError::InvalidOperation(format!("unknown bounding box operator '{}'", token))
            })
    }
}

impl Display for BboxOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

macro_rules! spatial_functions {
    ($($variant:ident => $symbol:literal, $modern:literal, $legacy:literal;)*) => {
        /// Spatial SQL functions, each with its symbolic name and the base
        /// names used by the two naming generations.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum SpatialFunction {
            $($variant,)*
        }

        impl SpatialFunction {
            pub const ALL: &'static [SpatialFunction] = &[$(SpatialFunction::$variant,)*];

            /// Lower-case symbolic name, e.g. `line_locate_point`.
            pub fn symbol(&self) -> &'static str {
                match self {
                    $(SpatialFunction::$variant => $symbol,)*
                }
            }

            fn base_name(&self, naming: FunctionNaming) -> &'static str {
                match naming {
                    FunctionNaming::Modern => match self {
                        $(SpatialFunction::$variant => $modern,)*
                    },
                    FunctionNaming::Legacy => match self {
                        $(SpatialFunction::$variant => $legacy,)*
                    },
                }
            }
        }
    };
}

spatial_functions! {
    Equals => "equals", "Equals", "equals";
    OrderingEquals => "ordering_equals", "OrderingEquals", "orderingequals";
    Envelope => "envelope", "Envelope", "envelope";
    Centroid => "centroid", "Centroid", "centroid";
    Boundary => "boundary", "Boundary", "boundary";
    PointOnSurface => "point_on_surface", "PointOnSurface", "pointonsurface";
    Distance => "distance", "Distance", "distance";
    DistanceSphere => "distance_sphere", "DistanceSphere", "distance_sphere";
    DistanceSpheroid => "distance_spheroid", "DistanceSpheroid", "distance_spheroid";
    DWithin => "dwithin", "DWithin", "dwithin";
    Within => "within", "Within", "within";
    Contains => "contains", "Contains", "contains";
    Covers => "covers", "Covers", "covers";
    CoveredBy => "coveredby", "CoveredBy", "coveredby";
    Disjoint => "disjoint", "Disjoint", "disjoint";
    Intersects => "intersects", "Intersects", "intersects";
    Intersection => "intersection", "Intersection", "intersection";
    Overlaps => "overlaps", "Overlaps", "overlaps";
    Touches => "touches", "Touches", "touches";
    Crosses => "crosses", "Crosses", "crosses";
    Relate => "relate", "Relate", "relate";
    Dimension => "dimension", "Dimension", "dimension";
    NumGeometries => "num_geometries", "NumGeometries", "numgeometries";
    Simplify => "simplify", "Simplify", "simplify";
    SimplifyPreserveTopology => "simplify_preserve_topology", "SimplifyPreserveTopology", "simplifypreservetopology";
    ConvexHull => "convex_hull", "ConvexHull", "convexhull";
    BuildArea => "build_area", "BuildArea", "buildarea";
    Polygonize => "polygonize", "Polygonize", "polygonize";
    IsSimple => "is_simple", "IsSimple", "issimple";
    IsClosed => "is_closed", "IsClosed", "isclosed";
    Transform => "transform", "Transform", "transform";
    SetSrid => "set_srid", "SetSRID", "setsrid";
    Srid => "srid", "SRID", "srid";
    GeometryType => "geometry_type", "GeometryType", "GeometryType";
    AsGeoJson => "as_geo_json", "AsGeoJSON", "asgeojson";
    AsText => "as_text", "AsText", "astext";
    MakeEnvelope => "make_envelope", "MakeEnvelope", "makeenvelope";
    X => "x", "X", "x";
    Y => "y", "Y", "y";
    Azimuth => "azimuth", "Azimuth", "azimuth";
    PointInsideCircle => "point_inside_circle", "PointInsideCircle", "point_inside_circle";
    Length => "length", "Length", "length";
    Length3d => "length3d", "3DLength", "length3d";
    LengthSpheroid => "length_spheroid", "LengthSpheroid", "length_spheroid";
    NumPoints => "num_points", "NPoints", "npoints";
    StartPoint => "start_point", "StartPoint", "startpoint";
    EndPoint => "end_point", "EndPoint", "endpoint";
    LineLocatePoint => "line_locate_point", "LineLocatePoint", "line_locate_point";
    LineInterpolatePoint => "line_interpolate_point", "LineInterpolatePoint", "line_interpolate_point";
    LineSubstring => "line_substring", "LineSubstring", "line_substring";
    LocateAlongMeasure => "locate_along_measure", "LocateAlong", "locate_along_measure";
    LocateBetweenMeasures => "locate_between_measures", "LocateBetween", "locate_between_measures";
    Segmentize => "segmentize", "Segmentize", "segmentize";
    Area => "area", "Area", "area";
    Perimeter => "perimeter", "Perimeter", "perimeter";
    Perimeter3d => "perimeter3d", "3DPerimeter", "perimeter3d";
}

/// Functions emitted without the configured prefix under modern naming.
pub const MODERN_UNPREFIXED: &[SpatialFunction] = &[SpatialFunction::GeometryType];

/// Functions emitted without the configured prefix under legacy naming.
pub const LEGACY_UNPREFIXED: &[SpatialFunction] = &[
    SpatialFunction::GeometryType,
    SpatialFunction::Length3d,
    SpatialFunction::Perimeter3d,
    SpatialFunction::LengthSpheroid,
];

impl SpatialFunction {
    /// The SQL function name under the given naming generation and prefix.
    ///
    /// ```rust,ignore
    /// use postgis_adapter::config::FunctionNaming;
    /// use postgis_adapter::sql::SpatialFunction;
    ///
    /// assert_eq!(SpatialFunction::Length3d.sql_name(FunctionNaming::Modern, "ST_"), "ST_3DLength");
    /// assert_eq!(SpatialFunction::Length3d.sql_name(FunctionNaming::Legacy, "ST_"), "length3d");
    /// ```
    pub fn sql_name(&self, naming: FunctionNaming, prefix: &str) -> String {
        let base = self.base_name(naming);
        let unprefixed = match naming {
            FunctionNaming::Modern => MODERN_UNPREFIXED,
            FunctionNaming::Legacy => LEGACY_UNPREFIXED,
        };
        if unprefixed.contains(self) {
            base.to_string()
        } else {
            format!("{}{}", prefix, base)
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<SpatialFunction> {
        SpatialFunction::ALL
            .iter()
            .copied()
            .find(|f| f.symbol() == symbol)
    }
}

impl Display for SpatialFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A spatial operation: either a named function or a bounding-box operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Function(SpatialFunction),
    BoundingBox(BboxOperator),
}

impl Operation {
    /// Label used in logs and calculation errors.
    pub fn label(&self) -> String {
        match self {
            Operation::Function(function) => function.symbol().to_string(),
            Operation::BoundingBox(op) => op.token().to_string(),
        }
    }
}

impl From<SpatialFunction> for Operation {
    fn from(value: SpatialFunction) -> Self {
        Operation::Function(value)
    }
}

impl From<BboxOperator> for Operation {
    fn from(value: BboxOperator) -> Self {
        Operation::BoundingBox(value)
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_tokens() {
        let tokens: Vec<&str> = BboxOperator::ALL.iter().map(|op| op.token()).collect();
        assert_eq!(
            tokens,
            vec!["<<", ">>", "&<", "&>", "<<|", "|>>", "&<|", "|&>", "=", "@", "~", "&&", "~="]
        );
    }

    #[test]
    fn test_bbox_from_token() {
        for op in BboxOperator::ALL {
            assert_eq!(op.token().parse::<BboxOperator>().unwrap(), op);
        }
        assert!("<>".parse::<BboxOperator>().is_err());
    }

    #[test]
    fn test_modern_names() {
        let naming = FunctionNaming::Modern;
        assert_eq!(SpatialFunction::Distance.sql_name(naming, "ST_"), "ST_Distance");
        assert_eq!(SpatialFunction::Length3d.sql_name(naming, "ST_"), "ST_3DLength");
        assert_eq!(SpatialFunction::Perimeter3d.sql_name(naming, "ST_"), "ST_3DPerimeter");
        assert_eq!(SpatialFunction::DistanceSphere.sql_name(naming, "ST_"), "ST_DistanceSphere");
        assert_eq!(SpatialFunction::LengthSpheroid.sql_name(naming, "ST_"), "ST_LengthSpheroid");
        assert_eq!(SpatialFunction::LineLocatePoint.sql_name(naming, "ST_"), "ST_LineLocatePoint");
        assert_eq!(SpatialFunction::NumPoints.sql_name(naming, "ST_"), "ST_NPoints");
        assert_eq!(SpatialFunction::GeometryType.sql_name(naming, "ST_"), "GeometryType");
    }

    #[test]
    fn test_legacy_names() {
        let naming = FunctionNaming::Legacy;
        assert_eq!(SpatialFunction::Distance.sql_name(naming, "ST_"), "ST_distance");
        assert_eq!(SpatialFunction::Length3d.sql_name(naming, "ST_"), "length3d");
        assert_eq!(SpatialFunction::Perimeter3d.sql_name(naming, "ST_"), "perimeter3d");
        assert_eq!(SpatialFunction::LengthSpheroid.sql_name(naming, "ST_"), "length_spheroid");
        assert_eq!(SpatialFunction::DistanceSphere.sql_name(naming, "ST_"), "ST_distance_sphere");
        assert_eq!(
            SpatialFunction::PointInsideCircle.sql_name(naming, "ST_"),
            "ST_point_inside_circle"
        );
    }

    #[test]
    fn test_prefix_is_configurable() {
        assert_eq!(SpatialFunction::Area.sql_name(FunctionNaming::Modern, ""), "Area");
        assert_eq!(SpatialFunction::Area.sql_name(FunctionNaming::Modern, "gis_"), "gis_Area");
        assert_eq!(
            SpatialFunction::GeometryType.sql_name(FunctionNaming::Modern, "gis_"),
            "GeometryType"
        );
    }

    #[test]
    fn test_symbols_are_unique() {
        for function in SpatialFunction::ALL {
            assert_eq!(SpatialFunction::from_symbol(function.symbol()), Some(*function));
        }
    }

    #[test]
    fn test_operation_label() {
        assert_eq!(Operation::from(SpatialFunction::Azimuth).label(), "azimuth");
        assert_eq!(Operation::from(BboxOperator::Interacts).label(), "&&");
    }
}
