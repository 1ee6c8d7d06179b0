use crate::config::FunctionNaming;
use crate::connection::SpatialConnection;
use crate::errors::SpatialResult;
use crate::geometry::Geometry;
use crate::registry::PointGeometry;
use crate::sql::{Calculation, Parameter, SpatialFunction, Spheroid};
use crate::subject::AsSubject;

use super::units::DistanceUnit;
use super::{GeomRef, SpatialCalculation};

/// Functions of point geometries.
pub trait PointFunctions: SpatialCalculation {
    /// `true` if `other` is within `margin` SRID units. `None` uses the
    /// configured margin.
    fn d_within<O: AsSubject + ?Sized>(&self, other: &O, margin: impl Into<Option<f64>>) -> SpatialResult<bool> {
        let margin = margin.into().unwrap_or(self.config().dwithin_margin());
        self.binary(SpatialFunction::DWithin, other, vec![Parameter::from(margin)])?
            .into_bool()
    }

    /// Same as [`d_within`](Self::d_within).
    fn in_bounds<O: AsSubject + ?Sized>(&self, other: &O, margin: impl Into<Option<f64>>) -> SpatialResult<bool> {
        self.d_within(other, margin)
    }

    /// Fraction of `line`'s length at which the point closest to this one
    /// lies, between 0 and 1.
    fn where_on_line<L: AsSubject + ?Sized>(&self, line: &L) -> SpatialResult<f64> {
        let calculation = Calculation::new(SpatialFunction::LineLocatePoint)
            .with_subject(line)?
            .subject(self.own_subject()?);
        self.run(&calculation)?.into_f64()
    }

    /// Great-circle distance in meters on a sphere of radius 6370986 m.
    fn distance_sphere_to<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<f64> {
        self.binary(SpatialFunction::DistanceSphere, other, Vec::new())?
            .into_f64()
    }

    fn distance_sphere_in<O: AsSubject + ?Sized>(&self, other: &O, unit: DistanceUnit) -> SpatialResult<f64> {
        self.distance_sphere_to(other).map(|meters| unit.from_meters(meters))
    }

    /// Ellipsoidal distance in meters. `None` uses the configured spheroid.
    fn distance_spheroid_to<O: AsSubject + ?Sized>(
        &self,
        other: &O,
        spheroid: impl Into<Option<Spheroid>>,
    ) -> SpatialResult<f64> {
        let spheroid = spheroid.into().unwrap_or_else(|| self.config().spheroid().clone());
        self.binary(SpatialFunction::DistanceSpheroid, other, vec![Parameter::from(spheroid)])?
            .into_f64()
    }

    fn distance_spheroid_in<O: AsSubject + ?Sized>(
        &self,
        other: &O,
        spheroid: impl Into<Option<Spheroid>>,
        unit: DistanceUnit,
    ) -> SpatialResult<f64> {
        self.distance_spheroid_to(other, spheroid)
            .map(|meters| unit.from_meters(meters))
    }

    /// North-based azimuth to `other` in radians.
    fn azimuth<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<f64> {
        self.binary(SpatialFunction::Azimuth, other, Vec::new())?.into_f64()
    }

    /// `true` if the point lies within `radius` of `(x, y)`.
    ///
    /// Modern naming compares against a point literal in the subject's SRID,
    /// looking the SRID up in the database when the geometry is not loaded.
    fn inside_circle(&self, x: f64, y: f64, radius: f64) -> SpatialResult<bool> {
        match self.config().naming() {
            FunctionNaming::Legacy => self
                .unary(
                    SpatialFunction::PointInsideCircle,
                    vec![Parameter::Floats(vec![x, y, radius])],
                )?
                .into_bool(),
            FunctionNaming::Modern => {
                let srid = match self.loaded_geometry() {
                    Some(geometry) if geometry.has_srid() => geometry.srid(),
                    _ => self.unary(SpatialFunction::Srid, Vec::new())?.into_i64()? as i32,
                };
                let center = Geometry::point(x, y, srid);
                self.binary(SpatialFunction::DWithin, &center, vec![Parameter::from(radius)])?
                    .into_bool()
            }
        }
    }

    /// The X coordinate as stored.
    fn x(&self) -> SpatialResult<f64> {
        self.unary(SpatialFunction::X, Vec::new())?.into_f64()
    }

    /// The Y coordinate as stored.
    fn y(&self) -> SpatialResult<f64> {
        self.unary(SpatialFunction::Y, Vec::new())?.into_f64()
    }
}

impl<C, S> PointFunctions for GeomRef<'_, C, S>
where
    C: SpatialConnection + ?Sized,
    S: PointGeometry + ?Sized,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpatialConfig;
    use crate::subject::Subject;
    use crate::test_support::RecordingConnection;

    fn position(id: i64) -> Subject<'static> {
        Subject::persisted("positions", "id", id, "geom")
    }

    #[test]
    fn test_d_within_default_margin() {
        let conn = RecordingConnection::new();
        conn.push_value(Some("t"));
        let config = SpatialConfig::default();
        let (a, b) = (position(1), position(2));

        assert!(GeomRef::new(&conn, &config, &a).d_within(&b, None).unwrap());
        assert_eq!(
            conn.last_statement().unwrap(),
            "SELECT ST_DWithin(w1.geom, w2.geom, 0.1) FROM positions w1, positions w2 WHERE w1.id = 1 AND w2.id = 2"
        );
    }

    #[test]
    fn test_where_on_line_puts_line_first() {
        let conn = RecordingConnection::new();
        conn.push_value(Some("0.5"));
        let config = SpatialConfig::default();
        let point = position(1);
        let street = Subject::persisted("streets", "id", 3, "geom");

        let fraction = GeomRef::new(&conn, &config, &point).where_on_line(&street).unwrap();
        assert_eq!(fraction, 0.5);
        assert_eq!(
            conn.last_statement().unwrap(),
            "SELECT ST_LineLocatePoint(w1.geom, w2.geom) FROM streets w1, positions w2 WHERE w1.id = 3 AND w2.id = 1"
        );
    }

    #[test]
    fn test_spheroid_distance_literal() {
        let conn = RecordingConnection::new();
        conn.push_value(Some("1000.0"));
        let config = SpatialConfig::default();
        let (a, b) = (position(1), position(2));
        let geom = GeomRef::new(&conn, &config, &a);

        let km = geom.distance_spheroid_in(&b, None, DistanceUnit::Kilometers).unwrap();
        assert_eq!(km, 1.0);
        assert_eq!(
            conn.last_statement().unwrap(),
            "SELECT ST_DistanceSpheroid(w1.geom, w2.geom, 'SPHEROID[\"IERS_2003\",6378136.6,298.25642]') FROM positions w1, positions w2 WHERE w1.id = 1 AND w2.id = 2"
        );
    }

    #[test]
    fn test_sphere_distance_in_miles() {
        let conn = RecordingConnection::new();
        conn.push_value(Some("1609.344"));
        let config = SpatialConfig::default();
        let (a, b) = (position(1), position(2));

        let miles = GeomRef::new(&conn, &config, &a)
            .distance_sphere_in(&b, DistanceUnit::Miles)
            .unwrap();
        assert!((miles - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_inside_circle_modern_uses_loaded_srid() {
        let conn = RecordingConnection::new();
        conn.push_value(Some("t"));
        let config = SpatialConfig::default();
        let point = Geometry::point(1.0, 1.0, 123);

        assert!(GeomRef::new(&conn, &config, &point).inside_circle(0.0, 0.0, 2.0).unwrap());
        let center = Geometry::point(0.0, 0.0, 123);
        assert_eq!(
            conn.statements(),
            vec![format!(
                "SELECT ST_DWithin({}, {}, 2)",
                point.sql_literal().unwrap(),
                center.sql_literal().unwrap()
            )]
        );
    }

    #[test]
    fn test_inside_circle_modern_queries_srid_of_records() {
        let conn = RecordingConnection::new();
        conn.push_value(Some("4326"));
        conn.push_value(Some("f"));
        let config = SpatialConfig::default();
        let a = position(1);

        assert!(!GeomRef::new(&conn, &config, &a).inside_circle(10.0, 10.0, 1.0).unwrap());
        let statements = conn.statements();
        assert_eq!(statements[0], "SELECT ST_SRID(w1.geom) FROM positions w1 WHERE w1.id = 1");
        assert!(statements[1].starts_with("SELECT ST_DWithin(w1.geom, '0101000020E6100000"));
    }

    #[test]
    fn test_inside_circle_legacy() {
        let conn = RecordingConnection::new();
        conn.push_value(Some("t"));
        let config = SpatialConfig::builder()
            .naming(FunctionNaming::Legacy)
            .build()
            .unwrap();
        let a = position(1);

        assert!(GeomRef::new(&conn, &config, &a).inside_circle(1.5, 2.0, 3.0).unwrap());
        assert_eq!(
            conn.last_statement().unwrap(),
            "SELECT ST_point_inside_circle(w1.geom, 1.5, 2, 3) FROM positions w1 WHERE w1.id = 1"
        );
    }

    #[test]
    fn test_azimuth_error_surfaces() {
        let conn = RecordingConnection::new();
        conn.push_error(crate::errors::SpatialError::Database(
            "Operation on mixed SRID geometries".into(),
        ));
        let config = SpatialConfig::default();
        let (a, b) = (position(1), position(2));

        let err = GeomRef::new(&conn, &config, &a).azimuth(&b).unwrap_err();
        assert!(err.is_calculation());
    }
}
