//! Hex-encoded EWKB, the text form PostGIS uses for geometry values.
//!
//! Layout of one geometry:
//!
//! ```text
//! byte order (00 big / 01 little)
//! u32 type code | 0x80000000 (Z) | 0x40000000 (M) | 0x20000000 (SRID)
//! [u32 srid]                       only when the SRID flag is set
//! payload                          coordinates, counts, nested geometries
//! ```
//!
//! Reading and writing the binary form is done by the `postgis` crate;
//! this module converts between its `GeometryT` values and [`Geometry`].
//! Input is checked before it is handed over: byte order markers, counts
//! against the remaining input, matching dimensions in nested members,
//! nesting depth and trailing bytes.
//!
//! Encoding produces little-endian, upper-case hex, the form PostGIS
//! itself outputs. Such strings re-encode identically after decoding;
//! big-endian or lower-case input comes back in that canonical form.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use postgis::ewkb as wire;

use crate::errors::{SpatialError, SpatialResult};

use super::{Coordinate, Geometry, GeometryKind, NO_SRID};

pub const Z_FLAG: u32 = 0x8000_0000;
pub const M_FLAG: u32 = 0x4000_0000;
pub const SRID_FLAG: u32 = 0x2000_0000;

const FLAG_MASK: u32 = Z_FLAG | M_FLAG | SRID_FLAG;

/// Deepest nesting of multi geometries and collections accepted on input.
pub const MAX_NESTING: usize = 64;

/// Decodes a hex-EWKB string into a geometry.
///
/// # Errors
///
/// Returns `Codec` on odd length, non-hex characters, truncated input, an
/// unknown type code, nesting deeper than [`MAX_NESTING`] or trailing bytes.
pub fn decode_hex(hex: &str) -> SpatialResult<Geometry> {
    let bytes = hex::decode(hex.trim()).map_err(|err| {
        log::error!("Invalid hex EWKB: {}", err);
        SpatialError::Codec(format!("invalid hex input: {}", err))
    })?;
    decode(&bytes)
}

/// Decodes raw EWKB bytes into a geometry.
pub fn decode(bytes: &[u8]) -> SpatialResult<Geometry> {
    let header = check_layout(bytes)?;
    let srid = header.srid.unwrap_or(NO_SRID);

    let mut input = bytes;
    let shape = match (header.with_z, header.with_m) {
        (false, false) => xy::read(&mut input, srid),
        (true, false) => xyz::read(&mut input, srid),
        (false, true) => xym::read(&mut input, srid),
        (true, true) => xyzm::read(&mut input, srid),
    }
    .map_err(|err| {
        log::error!("Could not read EWKB {}: {}", header.kind, err);
        SpatialError::Codec(format!("cannot read {}: {}", header.kind, err))
    })?;

    Ok(Geometry {
        shape,
        srid,
        with_z: header.with_z,
        with_m: header.with_m,
    })
}

/// Encodes a geometry as little-endian, upper-case hex EWKB.
pub fn encode_hex(geometry: &Geometry) -> SpatialResult<String> {
    encode(geometry).map(hex::encode_upper)
}

/// Encodes a geometry as little-endian EWKB bytes.
pub fn encode(geometry: &Geometry) -> SpatialResult<Vec<u8>> {
    match (geometry.with_z, geometry.with_m) {
        (false, false) => xy::write(geometry),
        (true, false) => xyz::write(geometry),
        (false, true) => xym::write(geometry),
        (true, true) => xyzm::write(geometry),
    }
    .map_err(|err| {
        log::error!("Could not write {} as EWKB: {}", geometry.kind(), err);
        SpatialError::Codec(format!("cannot write {}: {}", geometry.kind(), err))
    })
}

impl Geometry {
    /// Hex-EWKB representation, e.g. `0101000020E6100000...`.
    pub fn as_hex_ewkb(&self) -> SpatialResult<String> {
        encode_hex(self)
    }

    pub fn as_ewkb(&self) -> SpatialResult<Vec<u8>> {
        encode(self)
    }

    pub fn from_hex_ewkb(hex: &str) -> SpatialResult<Geometry> {
        decode_hex(hex)
    }

    pub fn from_ewkb(bytes: &[u8]) -> SpatialResult<Geometry> {
        decode(bytes)
    }

    /// The geometry as an SQL literal, `'<HEX>'::geometry`.
    pub fn sql_literal(&self) -> SpatialResult<String> {
        Ok(format!("'{}'::geometry", self.as_hex_ewkb()?))
    }

    /// The form used for geometry values in fixture files: bare hex EWKB.
    pub fn to_fixture_format(&self) -> SpatialResult<String> {
        self.as_hex_ewkb()
    }
}

pub(crate) fn is_hex_string(text: &str) -> bool {
    text.len() % 2 == 0 && text.bytes().all(|b| b.is_ascii_hexdigit())
}

// ==================== Layout check ====================

#[derive(Debug, Clone, Copy)]
struct Header {
    kind: GeometryKind,
    big_endian: bool,
    with_z: bool,
    with_m: bool,
    srid: Option<i32>,
}

impl Header {
    fn coordinate_size(&self) -> usize {
        8 * (2 + self.with_z as usize + self.with_m as usize)
    }

    fn member_kind(&self) -> Option<GeometryKind> {
        match self.kind {
            GeometryKind::MultiPoint => Some(GeometryKind::Point),
            GeometryKind::MultiLineString => Some(GeometryKind::LineString),
            GeometryKind::MultiPolygon => Some(GeometryKind::Polygon),
            _ => None,
        }
    }
}

/// Walks the whole input without building anything and returns the
/// header of the outermost geometry.
fn check_layout(bytes: &[u8]) -> SpatialResult<Header> {
    let mut layout = Layout { bytes, offset: 0 };
    let header = layout.check_geometry(None, 0)?;

    let trailing = layout.remaining();
    if trailing != 0 {
        log::error!("EWKB has {} trailing bytes", trailing);
        return Err(SpatialError::Codec(format!(
            "{} trailing bytes after geometry",
            trailing
        )));
    }
    Ok(header)
}

struct Layout<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Layout<'a> {
    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn take(&mut self, len: usize, what: &str) -> SpatialResult<&'a [u8]> {
        if len > self.remaining() {
            log::error!("EWKB truncated while reading {}", what);
            return Err(SpatialError::Codec(format!(
                "input truncated while reading {}",
                what
            )));
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn read_u32(&mut self, big_endian: bool, what: &str) -> SpatialResult<u32> {
        let raw = self.take(4, what)?;
        Ok(if big_endian {
            BigEndian::read_u32(raw)
        } else {
            LittleEndian::read_u32(raw)
        })
    }

    /// Reads a count and checks it against the bytes left, so a corrupt
    /// count cannot trigger a huge allocation.
    fn read_count(&mut self, big_endian: bool, min_item_size: usize) -> SpatialResult<usize> {
        let count = self.read_u32(big_endian, "count")? as usize;
        if count.saturating_mul(min_item_size) > self.remaining() {
            log::error!("EWKB count {} exceeds remaining input", count);
            return Err(SpatialError::Codec(format!(
                "count {} exceeds the remaining input",
                count
            )));
        }
        Ok(count)
    }

    fn read_header(&mut self) -> SpatialResult<Header> {
        let big_endian = match self.take(1, "byte order")?[0] {
            0x00 => true,
            0x01 => false,
            marker => {
                log::error!("Invalid EWKB byte order marker {:#04x}", marker);
                return Err(SpatialError::Codec(format!(
                    "invalid byte order marker: {:#04x}",
                    marker
                )));
            }
        };

        let raw_type = self.read_u32(big_endian, "type code")?;
        let code = raw_type & !FLAG_MASK;
        let kind = GeometryKind::from_wkb_code(code).ok_or_else(|| {
            log::error!("Unknown EWKB type code {:#010x}", raw_type);
            SpatialError::Codec(format!("unknown geometry type code {}", code))
        })?;

        let srid = if raw_type & SRID_FLAG != 0 {
            Some(self.read_u32(big_endian, "srid")? as i32)
        } else {
            None
        };

        Ok(Header {
            kind,
            big_endian,
            with_z: raw_type & Z_FLAG != 0,
            with_m: raw_type & M_FLAG != 0,
            srid,
        })
    }

    fn skip_points(&mut self, header: &Header) -> SpatialResult<()> {
        let size = header.coordinate_size();
        let count = self.read_count(header.big_endian, size)?;
        self.take(count * size, "coordinates")?;
        Ok(())
    }

    fn check_geometry(&mut self, parent: Option<&Header>, depth: usize) -> SpatialResult<Header> {
        if depth > MAX_NESTING {
            log::error!("EWKB nests deeper than {} levels", MAX_NESTING);
            return Err(SpatialError::Codec(format!(
                "geometry nests deeper than {} levels",
                MAX_NESTING
            )));
        }

        let header = self.read_header()?;
        if let Some(parent) = parent {
            if (parent.with_z, parent.with_m) != (header.with_z, header.with_m) {
                return Err(SpatialError::Codec(
                    "nested geometry dimensions differ from the parent".to_string(),
                ));
            }
            if header.srid.is_some() {
                return Err(SpatialError::Codec(
                    "nested geometry must not carry an SRID".to_string(),
                ));
            }
        }

        match header.kind {
            GeometryKind::Point => {
                self.take(header.coordinate_size(), "coordinate")?;
            }
            GeometryKind::LineString => self.skip_points(&header)?,
            GeometryKind::Polygon => {
                let rings = self.read_count(header.big_endian, 4)?;
                for _ in 0..rings {
                    self.skip_points(&header)?;
                }
            }
            GeometryKind::MultiPoint
            | GeometryKind::MultiLineString
            | GeometryKind::MultiPolygon
            | GeometryKind::GeometryCollection => {
                // smallest nested geometry: marker, type code and an empty count
                let members = self.read_count(header.big_endian, 9)?;
                for _ in 0..members {
                    let member = self.check_geometry(Some(&header), depth + 1)?;
                    match header.member_kind() {
                        Some(expected) if expected != member.kind => {
                            log::error!("{} contains a {}", header.kind, member.kind);
                            return Err(SpatialError::Codec(format!(
                                "{} cannot contain a {}",
                                header.kind, member.kind
                            )));
                        }
                        _ => {}
                    }
                }
            }
        }
        Ok(header)
    }
}

// ==================== Conversions ====================

trait WirePoint {
    fn from_coordinate(c: &Coordinate) -> Self;
    fn to_coordinate(&self) -> Coordinate;
}

impl WirePoint for wire::Point {
    fn from_coordinate(c: &Coordinate) -> Self {
        wire::Point {
            x: c.x,
            y: c.y,
            srid: None,
        }
    }

    fn to_coordinate(&self) -> Coordinate {
        Coordinate::new(self.x, self.y)
    }
}

impl WirePoint for wire::PointZ {
    fn from_coordinate(c: &Coordinate) -> Self {
        wire::PointZ {
            x: c.x,
            y: c.y,
            z: c.z.unwrap_or(0.0),
            srid: None,
        }
    }

    fn to_coordinate(&self) -> Coordinate {
        Coordinate::xyz(self.x, self.y, self.z)
    }
}

impl WirePoint for wire::PointM {
    fn from_coordinate(c: &Coordinate) -> Self {
        wire::PointM {
            x: c.x,
            y: c.y,
            m: c.m.unwrap_or(0.0),
            srid: None,
        }
    }

    fn to_coordinate(&self) -> Coordinate {
        Coordinate::xym(self.x, self.y, self.m)
    }
}

impl WirePoint for wire::PointZM {
    fn from_coordinate(c: &Coordinate) -> Self {
        wire::PointZM {
            x: c.x,
            y: c.y,
            z: c.z.unwrap_or(0.0),
            m: c.m.unwrap_or(0.0),
            srid: None,
        }
    }

    fn to_coordinate(&self) -> Coordinate {
        Coordinate::xyzm(self.x, self.y, self.z, self.m)
    }
}

/// One conversion module per point flavour of the `postgis` types.
macro_rules! wire_format {
    ($module:ident, $point:ty, $with_z:expr, $with_m:expr) => {
        mod $module {
            use postgis::error::Error;
            use postgis::ewkb::{
                AsEwkbGeometry, EwkbRead, EwkbWrite, GeometryCollectionT, GeometryT, LineStringT,
                MultiLineStringT, MultiPointT, MultiPolygonT, PolygonT,
            };

            use super::WirePoint;
            use crate::geometry::{Coordinate, Geometry, Shape};

            type Wire = GeometryT<$point>;

            pub(super) fn read(input: &mut &[u8], srid: i32) -> Result<Shape, Error> {
                let wire = Wire::read_ewkb(input)?;
                Ok(from_wire(&wire, srid))
            }

            pub(super) fn write(geometry: &Geometry) -> Result<Vec<u8>, Error> {
                let mut wire = to_wire(geometry.shape());
                set_srid(&mut wire, geometry.has_srid().then_some(geometry.srid()));
                let mut buf = Vec::new();
                wire.as_ewkb().write_ewkb(&mut buf)?;
                Ok(buf)
            }

            fn point(c: &Coordinate) -> $point {
                <$point as WirePoint>::from_coordinate(c)
            }

            fn line(points: &[Coordinate]) -> LineStringT<$point> {
                LineStringT {
                    points: points.iter().map(point).collect(),
                    srid: None,
                }
            }

            fn polygon(rings: &[Vec<Coordinate>]) -> PolygonT<$point> {
                PolygonT {
                    rings: rings.iter().map(|ring| line(ring)).collect(),
                    srid: None,
                }
            }

            fn to_wire(shape: &Shape) -> Wire {
                match shape {
                    Shape::Point(c) => GeometryT::Point(point(c)),
                    Shape::LineString(points) => GeometryT::LineString(line(points)),
                    Shape::Polygon(rings) => GeometryT::Polygon(polygon(rings)),
                    Shape::MultiPoint(points) => GeometryT::MultiPoint(MultiPointT {
                        points: points.iter().map(point).collect(),
                        srid: None,
                    }),
                    Shape::MultiLineString(lines) => GeometryT::MultiLineString(MultiLineStringT {
                        lines: lines.iter().map(|l| line(l)).collect(),
                        srid: None,
                    }),
                    Shape::MultiPolygon(polygons) => GeometryT::MultiPolygon(MultiPolygonT {
                        polygons: polygons.iter().map(|p| polygon(p)).collect(),
                        srid: None,
                    }),
                    Shape::GeometryCollection(members) => {
                        GeometryT::GeometryCollection(GeometryCollectionT {
                            geometries: members.iter().map(|m| to_wire(m.shape())).collect(),
                            srid: None,
                        })
                    }
                }
            }

            fn set_srid(wire: &mut Wire, srid: Option<i32>) {
                match wire {
                    GeometryT::Point(p) => p.srid = srid,
                    GeometryT::LineString(l) => l.srid = srid,
                    GeometryT::Polygon(p) => p.srid = srid,
                    GeometryT::MultiPoint(m) => m.srid = srid,
                    GeometryT::MultiLineString(m) => m.srid = srid,
                    GeometryT::MultiPolygon(m) => m.srid = srid,
                    GeometryT::GeometryCollection(c) => c.srid = srid,
                }
            }

            fn coordinates(points: &[$point]) -> Vec<Coordinate> {
                points.iter().map(WirePoint::to_coordinate).collect()
            }

            fn rings(lines: &[LineStringT<$point>]) -> Vec<Vec<Coordinate>> {
                lines.iter().map(|l| coordinates(&l.points)).collect()
            }

            // Collection members take the SRID of the outermost geometry.
            fn from_wire(wire: &Wire, srid: i32) -> Shape {
                match wire {
                    GeometryT::Point(p) => Shape::Point(p.to_coordinate()),
                    GeometryT::LineString(l) => Shape::LineString(coordinates(&l.points)),
                    GeometryT::Polygon(p) => Shape::Polygon(rings(&p.rings)),
                    GeometryT::MultiPoint(m) => Shape::MultiPoint(coordinates(&m.points)),
                    GeometryT::MultiLineString(m) => Shape::MultiLineString(rings(&m.lines)),
                    GeometryT::MultiPolygon(m) => Shape::MultiPolygon(
                        m.polygons.iter().map(|p| rings(&p.rings)).collect(),
                    ),
                    GeometryT::GeometryCollection(c) => Shape::GeometryCollection(
                        c.geometries
                            .iter()
                            .map(|member| Geometry {
                                shape: from_wire(member, srid),
                                srid,
                                with_z: $with_z,
                                with_m: $with_m,
                            })
                            .collect(),
                    ),
                }
            }
        }
    };
}

wire_format!(xy, postgis::ewkb::Point, false, false);
wire_format!(xyz, postgis::ewkb::PointZ, true, false);
wire_format!(xym, postgis::ewkb::PointM, false, true);
wire_format!(xyzm, postgis::ewkb::PointZM, true, true);
