//! Client-side geometry values.
//!
//! A [`Geometry`] is what travels between Rust records and PostGIS: one of
//! the seven OGC shapes plus an SRID and two dimension flags. Values are
//! exchanged with the database as hex-encoded EWKB (see [`ewkb`]).
//!
//! The types here do no geometric computation of their own beyond what is
//! needed to build and validate values. Distances, areas, predicates and the
//! like are all delegated to the database through the calculation layer.

pub mod bounding_box;
pub mod ewkb;

use std::fmt::{self, Display};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

pub use bounding_box::BoundingBox;

use crate::errors::{SpatialError, SpatialResult};

/// A coordinate with optional Z and M ordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub m: Option<f64>,
}

impl Coordinate {
    /// Creates a 2D coordinate.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            m: None,
        }
    }

    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z: Some(z),
            m: None,
        }
    }

    pub fn xym(x: f64, y: f64, m: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            m: Some(m),
        }
    }

    pub fn xyzm(x: f64, y: f64, z: f64, m: f64) -> Self {
        Self {
            x,
            y,
            z: Some(z),
            m: Some(m),
        }
    }

    pub fn has_z(&self) -> bool {
        self.z.is_some()
    }

    pub fn has_m(&self) -> bool {
        self.m.is_some()
    }

    /// Planar distance to another coordinate, ignoring Z and M.
    pub fn distance(&self, other: &Coordinate) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    fn is_nan_point(&self) -> bool {
        self.x.is_nan() && self.y.is_nan()
    }

    fn write_wkt(&self, out: &mut String) {
        out.push_str(&format!("{} {}", self.x, self.y));
        if let Some(z) = self.z {
            out.push_str(&format!(" {}", z));
        }
        if let Some(m) = self.m {
            out.push_str(&format!(" {}", m));
        }
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from(value: [f64; 2]) -> Self {
        Coordinate::new(value[0], value[1])
    }
}

impl From<[f64; 3]> for Coordinate {
    fn from(value: [f64; 3]) -> Self {
        Coordinate::xyz(value[0], value[1], value[2])
    }
}

impl From<[f64; 4]> for Coordinate {
    fn from(value: [f64; 4]) -> Self {
        Coordinate::xyzm(value[0], value[1], value[2], value[3])
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from(value: (f64, f64)) -> Self {
        Coordinate::new(value.0, value.1)
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_wkt(&mut out);
        f.write_str(&out)
    }
}

/// The seven OGC geometry kinds a [`Geometry`] value can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

impl GeometryKind {
    /// The WKB type code, 1 through 7.
    pub fn wkb_code(&self) -> u32 {
        match self {
            GeometryKind::Point => 1,
            GeometryKind::LineString => 2,
            GeometryKind::Polygon => 3,
            GeometryKind::MultiPoint => 4,
            GeometryKind::MultiLineString => 5,
            GeometryKind::MultiPolygon => 6,
            GeometryKind::GeometryCollection => 7,
        }
    }

    pub fn from_wkb_code(code: u32) -> Option<GeometryKind> {
        match code {
            1 => Some(GeometryKind::Point),
            2 => Some(GeometryKind::LineString),
            3 => Some(GeometryKind::Polygon),
            4 => Some(GeometryKind::MultiPoint),
            5 => Some(GeometryKind::MultiLineString),
            6 => Some(GeometryKind::MultiPolygon),
            7 => Some(GeometryKind::GeometryCollection),
            _ => None,
        }
    }

    /// Upper-case WKT tag, e.g. `LINESTRING`.
    pub fn wkt_name(&self) -> &'static str {
        match self {
            GeometryKind::Point => "POINT",
            GeometryKind::LineString => "LINESTRING",
            GeometryKind::Polygon => "POLYGON",
            GeometryKind::MultiPoint => "MULTIPOINT",
            GeometryKind::MultiLineString => "MULTILINESTRING",
            GeometryKind::MultiPolygon => "MULTIPOLYGON",
            GeometryKind::GeometryCollection => "GEOMETRYCOLLECTION",
        }
    }
}

impl Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wkt_name())
    }
}

/// The coordinate payload of a geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Point(Coordinate),
    LineString(Vec<Coordinate>),
    /// Exterior ring first, then holes.
    Polygon(Vec<Vec<Coordinate>>),
    MultiPoint(Vec<Coordinate>),
    MultiLineString(Vec<Vec<Coordinate>>),
    MultiPolygon(Vec<Vec<Vec<Coordinate>>>),
    GeometryCollection(Vec<Geometry>),
}

impl Shape {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Shape::Point(_) => GeometryKind::Point,
            Shape::LineString(_) => GeometryKind::LineString,
            Shape::Polygon(_) => GeometryKind::Polygon,
            Shape::MultiPoint(_) => GeometryKind::MultiPoint,
            Shape::MultiLineString(_) => GeometryKind::MultiLineString,
            Shape::MultiPolygon(_) => GeometryKind::MultiPolygon,
            Shape::GeometryCollection(_) => GeometryKind::GeometryCollection,
        }
    }

    fn for_each_coordinate<'a>(&'a self, f: &mut impl FnMut(&'a Coordinate)) {
        match self {
            Shape::Point(c) => f(c),
            Shape::LineString(points) | Shape::MultiPoint(points) => points.iter().for_each(f),
            Shape::Polygon(rings) | Shape::MultiLineString(rings) => {
                rings.iter().flatten().for_each(f)
            }
            Shape::MultiPolygon(polygons) => polygons.iter().flatten().flatten().for_each(f),
            Shape::GeometryCollection(geometries) => {
                for geometry in geometries {
                    geometry.shape.for_each_coordinate(f);
                }
            }
        }
    }
}

/// A geometry value: a shape, its SRID and its dimension flags.
///
/// An SRID of zero or less means "unspecified"; such geometries are encoded
/// without the EWKB SRID flag.
///
/// # Examples
///
/// ```rust,ignore
/// use postgis_adapter::geometry::Geometry;
///
/// let point = Geometry::point(1.0, 1.0, 4326);
/// let line = Geometry::line_string(vec![[1.0, 1.0], [2.0, 2.0]], 4326)?;
/// assert_eq!(line.num_points(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    shape: Shape,
    srid: i32,
    with_z: bool,
    with_m: bool,
}

/// SRID carried by geometries that have none.
pub const NO_SRID: i32 = 0;

impl Geometry {
    /// Builds a geometry from a shape, deriving the dimension flags from the
    /// coordinates.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGeometry` if coordinates disagree on Z or M, a line
    /// string has a single point, or a polygon ring is open or too short.
    pub fn new(shape: Shape, srid: i32) -> SpatialResult<Geometry> {
        let mut dims: Option<(bool, bool)> = None;
        let mut mixed = false;
        shape.for_each_coordinate(&mut |c| {
            let current = (c.has_z(), c.has_m());
            match dims {
                None => dims = Some(current),
                Some(expected) if expected != current => mixed = true,
                _ => {}
            }
        });

        if mixed {
            log::error!("Geometry mixes coordinate dimensions");
            return Err(SpatialError::InvalidGeometry(
                "all coordinates must share the same dimensions".to_string(),
            ));
        }

        validate_shape(&shape)?;

        let (with_z, with_m) = match (&shape, dims) {
            (_, Some(dims)) => dims,
            (Shape::GeometryCollection(children), None) => children
                .first()
                .map(|child| (child.with_z, child.with_m))
                .unwrap_or((false, false)),
            _ => (false, false),
        };

        if let Shape::GeometryCollection(children) = &shape {
            if children
                .iter()
                .any(|child| child.with_z != with_z || child.with_m != with_m)
            {
                return Err(SpatialError::InvalidGeometry(
                    "collection members must share the same dimensions".to_string(),
                ));
            }
        }

        Ok(Geometry {
            shape,
            srid,
            with_z,
            with_m,
        })
    }

    /// A 2D point.
    pub fn point(x: f64, y: f64, srid: i32) -> Geometry {
        Geometry::from_point(Coordinate::new(x, y), srid)
    }

    pub fn point_z(x: f64, y: f64, z: f64, srid: i32) -> Geometry {
        Geometry::from_point(Coordinate::xyz(x, y, z), srid)
    }

    pub fn point_m(x: f64, y: f64, m: f64, srid: i32) -> Geometry {
        Geometry::from_point(Coordinate::xym(x, y, m), srid)
    }

    pub fn point_zm(x: f64, y: f64, z: f64, m: f64, srid: i32) -> Geometry {
        Geometry::from_point(Coordinate::xyzm(x, y, z, m), srid)
    }

    /// A point from any coordinate; dimension flags follow the coordinate.
    pub fn from_point(coordinate: Coordinate, srid: i32) -> Geometry {
        Geometry {
            with_z: coordinate.has_z(),
            with_m: coordinate.has_m(),
            shape: Shape::Point(coordinate),
            srid,
        }
    }

    pub fn line_string<I, C>(points: I, srid: i32) -> SpatialResult<Geometry>
    where
        I: IntoIterator<Item = C>,
        C: Into<Coordinate>,
    {
        Geometry::new(Shape::LineString(collect_points(points)), srid)
    }

    /// A polygon from its rings, exterior ring first.
    pub fn polygon<R, I, C>(rings: R, srid: i32) -> SpatialResult<Geometry>
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = C>,
        C: Into<Coordinate>,
    {
        Geometry::new(Shape::Polygon(collect_rings(rings)), srid)
    }

    pub fn multi_point<I, C>(points: I, srid: i32) -> SpatialResult<Geometry>
    where
        I: IntoIterator<Item = C>,
        C: Into<Coordinate>,
    {
        Geometry::new(Shape::MultiPoint(collect_points(points)), srid)
    }

    pub fn multi_line_string<R, I, C>(lines: R, srid: i32) -> SpatialResult<Geometry>
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = C>,
        C: Into<Coordinate>,
    {
        Geometry::new(Shape::MultiLineString(collect_rings(lines)), srid)
    }

    pub fn multi_polygon<P, R, I, C>(polygons: P, srid: i32) -> SpatialResult<Geometry>
    where
        P: IntoIterator<Item = R>,
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = C>,
        C: Into<Coordinate>,
    {
        let polygons = polygons.into_iter().map(collect_rings).collect();
        Geometry::new(Shape::MultiPolygon(polygons), srid)
    }

    pub fn collection(geometries: Vec<Geometry>, srid: i32) -> SpatialResult<Geometry> {
        Geometry::new(Shape::GeometryCollection(geometries), srid)
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn into_shape(self) -> Shape {
        self.shape
    }

    pub fn kind(&self) -> GeometryKind {
        self.shape.kind()
    }

    pub fn srid(&self) -> i32 {
        self.srid
    }

    /// Returns `true` if the geometry carries a real SRID.
    pub fn has_srid(&self) -> bool {
        self.srid > 0
    }

    pub fn set_srid(&mut self, srid: i32) {
        self.srid = srid;
    }

    pub fn with_srid(mut self, srid: i32) -> Geometry {
        self.srid = srid;
        self
    }

    pub fn with_z(&self) -> bool {
        self.with_z
    }

    pub fn with_m(&self) -> bool {
        self.with_m
    }

    /// Number of ordinates per coordinate, 2 to 4.
    pub fn coordinate_dimension(&self) -> u8 {
        2 + self.with_z as u8 + self.with_m as u8
    }

    /// The coordinate of a point geometry.
    pub fn as_point(&self) -> Option<&Coordinate> {
        match &self.shape {
            Shape::Point(c) => Some(c),
            _ => None,
        }
    }

    pub fn x(&self) -> Option<f64> {
        self.as_point().map(|c| c.x)
    }

    pub fn y(&self) -> Option<f64> {
        self.as_point().map(|c| c.y)
    }

    pub fn z(&self) -> Option<f64> {
        self.as_point().and_then(|c| c.z)
    }

    pub fn m(&self) -> Option<f64> {
        self.as_point().and_then(|c| c.m)
    }

    /// The points of a line string or multi point.
    pub fn points(&self) -> Option<&[Coordinate]> {
        match &self.shape {
            Shape::LineString(points) | Shape::MultiPoint(points) => Some(points),
            _ => None,
        }
    }

    /// The rings of a polygon.
    pub fn rings(&self) -> Option<&[Vec<Coordinate>]> {
        match &self.shape {
            Shape::Polygon(rings) => Some(rings),
            _ => None,
        }
    }

    /// Every coordinate in the geometry, in encoding order.
    pub fn coordinates(&self) -> Vec<&Coordinate> {
        let mut all = Vec::new();
        self.shape.for_each_coordinate(&mut |c| all.push(c));
        all
    }

    pub fn num_points(&self) -> usize {
        let mut count = 0;
        self.shape.for_each_coordinate(&mut |_| count += 1);
        count
    }

    pub fn is_empty(&self) -> bool {
        match &self.shape {
            Shape::Point(c) => c.is_nan_point(),
            _ => self.num_points() == 0,
        }
    }

    /// Splits multi geometries and collections into their members. A single
    /// geometry yields itself.
    pub fn geometries(&self) -> Vec<Geometry> {
        let part = |shape: Shape| Geometry {
            shape,
            srid: self.srid,
            with_z: self.with_z,
            with_m: self.with_m,
        };

        match &self.shape {
            Shape::MultiPoint(points) => points.iter().map(|c| part(Shape::Point(*c))).collect(),
            Shape::MultiLineString(lines) => lines
                .iter()
                .map(|line| part(Shape::LineString(line.clone())))
                .collect(),
            Shape::MultiPolygon(polygons) => polygons
                .iter()
                .map(|rings| part(Shape::Polygon(rings.clone())))
                .collect(),
            Shape::GeometryCollection(geometries) => geometries.clone(),
            _ => vec![self.clone()],
        }
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let coordinates = self.coordinates();
        BoundingBox::from_coordinates(coordinates.into_iter().filter(|c| !c.is_nan_point()))
    }

    /// The WKT body without the type tag, e.g. `1 1` for a point or
    /// `(0 0,1 0,1 1,0 0)` for a polygon.
    pub fn text_representation(&self) -> String {
        let mut out = String::new();
        write_shape_body(&self.shape, &mut out);
        out
    }

    /// PostGIS-style WKT without the SRID, e.g. `POINTM(1 2 3)`.
    pub fn to_wkt(&self) -> String {
        let mut out = String::from(self.kind().wkt_name());
        if self.with_m && !self.with_z {
            out.push('M');
        }
        if self.is_empty() {
            out.push_str(" EMPTY");
            return out;
        }
        match &self.shape {
            Shape::Point(c) => {
                out.push('(');
                c.write_wkt(&mut out);
                out.push(')');
            }
            Shape::GeometryCollection(children) => {
                out.push('(');
                out.push_str(&children.iter().map(|g| g.to_wkt()).join(","));
                out.push(')');
            }
            shape => write_shape_body(shape, &mut out),
        }
        out
    }

    /// Extended WKT, prefixed with `SRID=<n>;` when an SRID is set.
    pub fn to_ewkt(&self) -> String {
        if self.has_srid() {
            format!("SRID={};{}", self.srid, self.to_wkt())
        } else {
            self.to_wkt()
        }
    }
}

impl Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ewkt())
    }
}

fn collect_points<I, C>(points: I) -> Vec<Coordinate>
where
    I: IntoIterator<Item = C>,
    C: Into<Coordinate>,
{
    points.into_iter().map(Into::into).collect()
}

fn collect_rings<R, I, C>(rings: R) -> Vec<Vec<Coordinate>>
where
    R: IntoIterator<Item = I>,
    I: IntoIterator<Item = C>,
    C: Into<Coordinate>,
{
    rings.into_iter().map(collect_points).collect()
}

fn validate_line(points: &[Coordinate]) -> SpatialResult<()> {
    if points.len() == 1 {
        log::error!("Line string with a single point");
        return Err(SpatialError::InvalidGeometry(
            "a line string needs at least two points".to_string(),
        ));
    }
    Ok(())
}

fn validate_ring(ring: &[Coordinate]) -> SpatialResult<()> {
    if ring.len() < 4 {
        log::error!("Polygon ring with {} points", ring.len());
        return Err(SpatialError::InvalidGeometry(format!(
            "a polygon ring needs at least four points, got {}",
            ring.len()
        )));
    }

    let first = &ring[0];
    let last = &ring[ring.len() - 1];
    if first.x != last.x || first.y != last.y || first.z != last.z {
        log::error!("Polygon ring is not closed");
        return Err(SpatialError::InvalidGeometry(
            "a polygon ring must start and end at the same point".to_string(),
        ));
    }
    Ok(())
}

fn validate_shape(shape: &Shape) -> SpatialResult<()> {
    match shape {
        Shape::Point(_) | Shape::MultiPoint(_) | Shape::GeometryCollection(_) => Ok(()),
        Shape::LineString(points) => validate_line(points),
        Shape::MultiLineString(lines) => lines.iter().try_for_each(|line| validate_line(line)),
        Shape::Polygon(rings) => rings.iter().try_for_each(|ring| validate_ring(ring)),
        Shape::MultiPolygon(polygons) => polygons
            .iter()
            .flatten()
            .try_for_each(|ring| validate_ring(ring)),
    }
}

fn write_points(points: &[Coordinate], out: &mut String) {
    out.push('(');
    for (i, c) in points.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        c.write_wkt(out);
    }
    out.push(')');
}

fn write_rings(rings: &[Vec<Coordinate>], out: &mut String) {
    out.push('(');
    for (i, ring) in rings.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_points(ring, out);
    }
    out.push(')');
}

fn write_shape_body(shape: &Shape, out: &mut String) {
    match shape {
        Shape::Point(c) => c.write_wkt(out),
        Shape::LineString(points) | Shape::MultiPoint(points) => write_points(points, out),
        Shape::Polygon(rings) | Shape::MultiLineString(rings) => write_rings(rings, out),
        Shape::MultiPolygon(polygons) => {
            out.push('(');
            for (i, rings) in polygons.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_rings(rings, out);
            }
            out.push(')');
        }
        Shape::GeometryCollection(children) => {
            out.push_str(&children.iter().map(|g| g.to_wkt()).join(","));
        }
    }
}
