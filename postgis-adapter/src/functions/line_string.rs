use crate::connection::SpatialConnection;
use crate::errors::{SpatialError, SpatialResult};
use crate::geometry::Geometry;
use crate::registry::LineStringGeometry;
use crate::sql::{Parameter, SpatialFunction, Spheroid};
use crate::subject::AsSubject;

use super::{GeomRef, SpatialCalculation};

/// Functions of line strings and multi line strings.
pub trait LineStringFunctions: SpatialCalculation {
    /// 2D length in SRID units.
    fn length(&self) -> SpatialResult<f64> {
        self.unary(SpatialFunction::Length, Vec::new())?.into_f64()
    }

    fn length_3d(&self) -> SpatialResult<f64> {
        self.unary(SpatialFunction::Length3d, Vec::new())?.into_f64()
    }

    /// Length in meters on an ellipsoid. `None` uses the configured spheroid.
    fn length_spheroid(&self, spheroid: impl Into<Option<Spheroid>>) -> SpatialResult<f64> {
        let spheroid = spheroid.into().unwrap_or_else(|| self.config().spheroid().clone());
        self.unary(SpatialFunction::LengthSpheroid, vec![Parameter::from(spheroid)])?
            .into_f64()
    }

    fn num_points(&self) -> SpatialResult<i64> {
        self.unary(SpatialFunction::NumPoints, Vec::new())?.into_i64()
    }

    fn start_point(&self) -> SpatialResult<Geometry> {
        self.unary(SpatialFunction::StartPoint, Vec::new())?
            .into_geometry()
    }

    fn end_point(&self) -> SpatialResult<Geometry> {
        self.unary(SpatialFunction::EndPoint, Vec::new())?.into_geometry()
    }

    fn crosses<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<bool> {
        self.binary(SpatialFunction::Crosses, other, Vec::new())?.into_bool()
    }

    /// Fraction of this line's length at which the point of the line closest
    /// to `point` lies.
    fn locate_point<P: AsSubject + ?Sized>(&self, point: &P) -> SpatialResult<f64> {
        self.binary(SpatialFunction::LineLocatePoint, point, Vec::new())?
            .into_f64()
    }

    /// The points of a measured line carrying measure `m`.
    fn locate_along_measure(&self, m: f64) -> SpatialResult<Geometry> {
        self.unary(SpatialFunction::LocateAlongMeasure, vec![Parameter::from(m)])?
            .into_geometry()
    }

    /// The parts of a measured line whose measures lie in `start..=end`.
    fn locate_between_measures(&self, start: f64, end: f64) -> SpatialResult<Geometry> {
        self.unary(
            SpatialFunction::LocateBetweenMeasures,
            vec![Parameter::from(start), Parameter::from(end)],
        )?
        .into_geometry()
    }

    /// The point at `fraction` (0 to 1) of the line's length.
    fn interpolate_point(&self, fraction: f64) -> SpatialResult<Geometry> {
        check_fraction("fraction", fraction)?;
        self.unary(SpatialFunction::LineInterpolatePoint, vec![Parameter::from(fraction)])?
            .into_geometry()
    }

    /// The part of the line between two fractions of its length.
    fn line_substring(&self, start: f64, end: f64) -> SpatialResult<Geometry> {
        check_fraction("start", start)?;
        check_fraction("end", end)?;
        let calculation = self
            .calculation(SpatialFunction::LineSubstring)?
            .parameter(start)
            .parameter(end);
        self.run(&calculation)?.into_geometry()
    }

    /// The line with extra vertices so no segment is longer than
    /// `max_length`.
    fn segmentize(&self, max_length: f64) -> SpatialResult<Geometry> {
        if max_length <= 0.0 {
            log::error!("Segment length {} must be positive", max_length);
            return Err(SpatialError::InvalidParameter(format!(
                "segment length must be positive, got {}",
                max_length
            )));
        }
        self.unary(SpatialFunction::Segmentize, vec![Parameter::from(max_length)])?
            .into_geometry()
    }
}

fn check_fraction(name: &str, value: f64) -> SpatialResult<()> {
    if (0.0..=1.0).contains(&value) {
        return Ok(());
    }
    log::error!("Line fraction {} = {} is outside 0..1", name, value);
    Err(SpatialError::InvalidParameter(format!(
        "{} must be between 0 and 1, got {}",
        name, value
    )))
}

impl<C, S> LineStringFunctions for GeomRef<'_, C, S>
where
    C: SpatialConnection + ?Sized,
    S: LineStringGeometry + ?Sized,
{
}
