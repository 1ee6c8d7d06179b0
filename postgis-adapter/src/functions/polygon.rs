use crate::connection::SpatialConnection;
use crate::errors::SpatialResult;
use crate::registry::PolygonGeometry;
use crate::sql::SpatialFunction;
use crate::subject::AsSubject;

use super::{GeomRef, SpatialCalculation};

/// Functions of polygons and multi polygons.
pub trait PolygonFunctions: SpatialCalculation {
    /// Area in square SRID units.
    fn area(&self) -> SpatialResult<f64> {
        self.unary(SpatialFunction::Area, Vec::new())?.into_f64()
    }

    /// Area after reprojecting to `srid`, e.g. a metric UTM zone.
    fn area_in(&self, srid: i32) -> SpatialResult<f64> {
        let calculation = self.calculation(SpatialFunction::Area)?.transform_to(srid);
        self.run(&calculation)?.into_f64()
    }

    /// 2D perimeter in SRID units.
    fn perimeter(&self) -> SpatialResult<f64> {
        self.unary(SpatialFunction::Perimeter, Vec::new())?.into_f64()
    }

    fn perimeter_3d(&self) -> SpatialResult<f64> {
        self.unary(SpatialFunction::Perimeter3d, Vec::new())?.into_f64()
    }

    /// `true` if no point of `other` lies outside this polygon.
    fn covers<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<bool> {
        self.binary(SpatialFunction::Covers, other, Vec::new())?.into_bool()
    }
}

impl<C, S> PolygonFunctions for GeomRef<'_, C, S>
where
    C: SpatialConnection + ?Sized,
    S: PolygonGeometry + ?Sized,
{
}
