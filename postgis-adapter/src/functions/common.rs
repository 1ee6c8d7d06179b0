use crate::config::DEFAULT_SRID;
use crate::connection::SpatialConnection;
use crate::errors::{SpatialError, SpatialResult};
use crate::geometry::Geometry;
use crate::sql::{Calculation, Parameter, SpatialFunction};
use crate::subject::AsSubject;

use super::units::utm_srid;
use super::{GeomRef, SpatialCalculation};

impl<C: SpatialConnection + ?Sized, S: AsSubject + ?Sized> GeomRef<'_, C, S> {
    // =========================================================================
    // Relationship predicates
    // =========================================================================

    /// `true` if both represent the same point set, ignoring direction.
    pub fn spatially_equal<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<bool> {
        self.binary(SpatialFunction::Equals, other, Vec::new())?.into_bool()
    }

    /// `true` if both have the same points in the same order.
    pub fn ordering_equals<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<bool> {
        self.binary(SpatialFunction::OrderingEquals, other, Vec::new())?
            .into_bool()
    }

    pub fn within<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<bool> {
        self.binary(SpatialFunction::Within, other, Vec::new())?.into_bool()
    }

    pub fn contains<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<bool> {
        self.binary(SpatialFunction::Contains, other, Vec::new())?.into_bool()
    }

    /// `true` if no point of this geometry lies outside `other`.
    pub fn covered_by<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<bool> {
        self.binary(SpatialFunction::CoveredBy, other, Vec::new())?.into_bool()
    }

    /// Same as [`covered_by`](Self::covered_by).
    pub fn inside<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<bool> {
        self.covered_by(other)
    }

    /// The negation of [`covered_by`](Self::covered_by).
    pub fn outside<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<bool> {
        self.covered_by(other).map(|covered| !covered)
    }

    pub fn disjoint<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<bool> {
        self.binary(SpatialFunction::Disjoint, other, Vec::new())?.into_bool()
    }

    pub fn intersects<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<bool> {
        self.binary(SpatialFunction::Intersects, other, Vec::new())?
            .into_bool()
    }

    pub fn overlaps<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<bool> {
        self.binary(SpatialFunction::Overlaps, other, Vec::new())?.into_bool()
    }

    pub fn touches<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<bool> {
        self.binary(SpatialFunction::Touches, other, Vec::new())?.into_bool()
    }

    /// Tests the DE-9IM matrix of the pair against `pattern`, e.g.
    /// `"T*T***T**"`.
    pub fn relate<O: AsSubject + ?Sized>(&self, other: &O, pattern: &str) -> SpatialResult<bool> {
        self.binary(SpatialFunction::Relate, other, vec![Parameter::from(pattern)])?
            .into_bool()
    }

    /// The DE-9IM matrix of the pair, e.g. `"FF0FFF102"`.
    pub fn relate_matrix<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<String> {
        let calculation = self.calculation(SpatialFunction::Relate)?.with_subject(other)?;
        self.run_text(&calculation)?.ok_or_else(|| {
            SpatialError::Decode("relate returned NULL".to_string())
        })
    }

    pub fn is_simple(&self) -> SpatialResult<bool> {
        self.unary(SpatialFunction::IsSimple, Vec::new())?.into_bool()
    }

    /// `true` if the start and end points coincide.
    pub fn is_closed(&self) -> SpatialResult<bool> {
        self.unary(SpatialFunction::IsClosed, Vec::new())?.into_bool()
    }

    // =========================================================================
    // Measurement
    // =========================================================================

    /// Minimum planar distance in SRID units.
    pub fn distance_to<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<f64> {
        self.binary(SpatialFunction::Distance, other, Vec::new())?.into_f64()
    }

    /// 0 for points, 1 for lines, 2 for polygons.
    pub fn dimension(&self) -> SpatialResult<i64> {
        self.unary(SpatialFunction::Dimension, Vec::new())?.into_i64()
    }

    /// Member count of a collection. PostGIS versions before 2.0 answer
    /// NULL for single geometries.
    pub fn num_geometries(&self) -> SpatialResult<Option<i64>> {
        match self.unary(SpatialFunction::NumGeometries, Vec::new())? {
            value if value.is_null() => Ok(None),
            value => value.into_i64().map(Some),
        }
    }

    /// The SRID stored in the database.
    pub fn srid_in_database(&self) -> SpatialResult<i32> {
        let srid = self.unary(SpatialFunction::Srid, Vec::new())?.into_i64()?;
        i32::try_from(srid).map_err(|_| SpatialError::Decode(format!("SRID {} out of range", srid)))
    }

    /// The database's name for the subtype, e.g. `POINT`.
    pub fn geometry_type_in_database(&self) -> SpatialResult<String> {
        self.unary(SpatialFunction::GeometryType, Vec::new())?.into_text()
    }

    // =========================================================================
    // Derived geometries
    // =========================================================================

    pub fn envelope(&self) -> SpatialResult<Geometry> {
        self.unary(SpatialFunction::Envelope, Vec::new())?.into_geometry()
    }

    pub fn centroid(&self) -> SpatialResult<Geometry> {
        self.unary(SpatialFunction::Centroid, Vec::new())?.into_geometry()
    }

    pub fn boundary(&self) -> SpatialResult<Geometry> {
        self.unary(SpatialFunction::Boundary, Vec::new())?.into_geometry()
    }

    /// A point guaranteed to lie on the surface.
    pub fn point_on_surface(&self) -> SpatialResult<Geometry> {
        self.unary(SpatialFunction::PointOnSurface, Vec::new())?
            .into_geometry()
    }

    pub fn convex_hull(&self) -> SpatialResult<Geometry> {
        self.unary(SpatialFunction::ConvexHull, Vec::new())?.into_geometry()
    }

    pub fn build_area(&self) -> SpatialResult<Option<Geometry>> {
        self.unary(SpatialFunction::BuildArea, Vec::new())?
            .into_opt_geometry()
    }

    pub fn polygonize(&self) -> SpatialResult<Geometry> {
        self.unary(SpatialFunction::Polygonize, Vec::new())?.into_geometry()
    }

    pub fn intersection<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<Geometry> {
        self.binary(SpatialFunction::Intersection, other, Vec::new())?
            .into_geometry()
    }

    /// Douglas-Peucker simplification. `None` uses the configured
    /// tolerance.
    pub fn simplify(&self, tolerance: impl Into<Option<f64>>) -> SpatialResult<Geometry> {
        let tolerance = tolerance.into().unwrap_or(self.config.simplify_tolerance());
        self.unary(SpatialFunction::Simplify, vec![Parameter::from(tolerance)])?
            .into_geometry()
    }

    pub fn simplify_preserve_topology(&self, tolerance: impl Into<Option<f64>>) -> SpatialResult<Geometry> {
        let tolerance = tolerance.into().unwrap_or(self.config.simplify_tolerance());
        self.unary(
            SpatialFunction::SimplifyPreserveTopology,
            vec![Parameter::from(tolerance)],
        )?
        .into_geometry()
    }

    /// The geometry reprojected to `srid`.
    pub fn transform(&self, srid: i32) -> SpatialResult<Geometry> {
        self.unary(SpatialFunction::Transform, vec![Parameter::from(srid)])?
            .into_geometry()
    }

    // =========================================================================
    // Output
    // =========================================================================

    pub fn as_geo_json(&self) -> SpatialResult<String> {
        self.unary(SpatialFunction::AsGeoJson, Vec::new())?.into_text()
    }

    pub fn as_text(&self) -> SpatialResult<String> {
        self.unary(SpatialFunction::AsText, Vec::new())?.into_text()
    }

    // =========================================================================
    // UTM
    // =========================================================================

    /// The WGS 84 / UTM SRID covering the centroid.
    ///
    /// The centroid is computed by the database and reprojected to 4326
    /// first when it is in another system, so this may run two
    /// calculations. The zone itself is chosen client-side.
    pub fn utm_zone(&self) -> SpatialResult<i32> {
        let mut centroid = self.centroid()?;
        if centroid.has_srid() && centroid.srid() != DEFAULT_SRID {
            let reprojected = {
                let calculation = Calculation::new(SpatialFunction::Transform)
                    .with_subject(&centroid)?
                    .parameter(DEFAULT_SRID);
                self.run(&calculation)?.into_geometry()?
            };
            centroid = reprojected;
        }

        match (centroid.x(), centroid.y()) {
            (Some(longitude), Some(latitude)) => utm_srid(longitude, latitude),
            _ => {
                log::error!("Centroid {} is not a point", centroid);
                Err(SpatialError::InvalidGeometry(format!(
                    "centroid {} has no coordinates",
                    centroid
                )))
            }
        }
    }

    /// The geometry reprojected to its UTM zone.
    pub fn to_utm(&self) -> SpatialResult<Geometry> {
        let srid = self.utm_zone()?;
        self.transform(srid)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::SpatialConfig;
    use crate::errors::SpatialError;
    use crate::functions::GeomRef;
    use crate::geometry::Geometry;
    use crate::subject::Subject;
    use crate::test_support::RecordingConnection;

    const POINT_1_1: &str = "0101000020E6100000000000000000F03F000000000000F03F";

    fn city(id: i64) -> Subject<'static> {
        Subject::persisted("cities", "id", id, "geom")
    }

    #[test]
    fn test_distance_between_records() {
        let conn = RecordingConnection::new();
        conn.push_value(Some("5.65685424949238"));
        let config = SpatialConfig::default();
        let (a, b) = (city(1), city(2));

        let distance = GeomRef::new(&conn, &config, &a).distance_to(&b).unwrap();
        assert!((distance - 5.656854).abs() < 1e-4);
        assert_eq!(
            conn.last_statement().unwrap(),
            "SELECT ST_Distance(w1.geom, w2.geom) FROM cities w1, cities w2 WHERE w1.id = 1 AND w2.id = 2"
        );
    }

    #[test]
    fn test_outside_negates_covered_by() {
        let conn = RecordingConnection::new();
        conn.push_value(Some("t"));
        conn.push_value(Some("t"));
        let config = SpatialConfig::default();
        let (a, b) = (city(1), city(2));
        let geom = GeomRef::new(&conn, &config, &a);

        assert!(geom.inside(&b).unwrap());
        assert!(!geom.outside(&b).unwrap());
        assert!(conn
            .statements()
            .iter()
            .all(|sql| sql.starts_with("SELECT ST_CoveredBy(")));
    }

    #[test]
    fn test_simplify_uses_configured_tolerance() {
        let conn = RecordingConnection::new();
        conn.push_value(Some(POINT_1_1));
        conn.push_value(Some(POINT_1_1));
        let config = SpatialConfig::default();
        let a = city(4);
        let geom = GeomRef::new(&conn, &config, &a);

        geom.simplify(None).unwrap();
        geom.simplify_preserve_topology(2.5).unwrap();
        assert_eq!(
            conn.statements(),
            vec![
                "SELECT ST_Simplify(w1.geom, 0.1) FROM cities w1 WHERE w1.id = 4".to_string(),
                "SELECT ST_SimplifyPreserveTopology(w1.geom, 2.5) FROM cities w1 WHERE w1.id = 4".to_string(),
            ]
        );
    }

    #[test]
    fn test_relate_matrix_is_raw_text() {
        let conn = RecordingConnection::new();
        conn.push_value(Some("FF0FFF102"));
        conn.push_value(Some("212101212"));
        let config = SpatialConfig::default();
        let (a, b) = (city(1), city(2));
        let geom = GeomRef::new(&conn, &config, &a);

        assert_eq!(geom.relate_matrix(&b).unwrap(), "FF0FFF102");
        assert_eq!(geom.relate_matrix(&b).unwrap(), "212101212");
    }

    #[test]
    fn test_relate_pattern() {
        let conn = RecordingConnection::new();
        conn.push_value(Some("f"));
        let config = SpatialConfig::default();
        let (a, b) = (city(1), city(2));

        assert!(!GeomRef::new(&conn, &config, &a).relate(&b, "T*T***T**").unwrap());
        assert_eq!(
            conn.last_statement().unwrap(),
            "SELECT ST_Relate(w1.geom, w2.geom, 'T*T***T**') FROM cities w1, cities w2 WHERE w1.id = 1 AND w2.id = 2"
        );
    }

    #[test]
    fn test_dimension_and_srid() {
        let conn = RecordingConnection::new();
        conn.push_value(Some("2"));
        conn.push_value(Some("123"));
        conn.push_value(None);
        let config = SpatialConfig::default();
        let a = city(1);
        let geom = GeomRef::new(&conn, &config, &a);

        assert_eq!(geom.dimension().unwrap(), 2);
        assert_eq!(geom.srid_in_database().unwrap(), 123);
        assert_eq!(geom.num_geometries().unwrap(), None);
    }

    #[test]
    fn test_literal_subject_has_no_from() {
        let conn = RecordingConnection::new();
        conn.push_value(Some("POINT(1 1)"));
        let config = SpatialConfig::default();
        let point = Geometry::point(1.0, 1.0, 4326);

        let text = GeomRef::new(&conn, &config, &point).as_text().unwrap();
        assert_eq!(text, "POINT(1 1)");
        assert_eq!(
            conn.last_statement().unwrap(),
            format!("SELECT ST_AsText('{}'::geometry)", POINT_1_1)
        );
    }

    #[test]
    fn test_utm_zone_of_wgs84_centroid() {
        let conn = RecordingConnection::new();
        // POINT(13.4 52.52) in 4326
        let centroid = Geometry::point(13.4, 52.52, 4326);
        conn.push_value(Some(&centroid.as_hex_ewkb().unwrap()));
        let config = SpatialConfig::default();
        let a = city(1);

        assert_eq!(GeomRef::new(&conn, &config, &a).utm_zone().unwrap(), 32633);
        assert_eq!(conn.statements().len(), 1);
    }

    #[test]
    fn test_utm_zone_reprojects_centroid() {
        let conn = RecordingConnection::new();
        let projected = Geometry::point(-5190000.0, -2700000.0, 3857);
        let wgs84 = Geometry::point(-46.63, -23.55, 4326);
        conn.push_value(Some(&projected.as_hex_ewkb().unwrap()));
        conn.push_value(Some(&wgs84.as_hex_ewkb().unwrap()));
        conn.push_value(Some(&wgs84.as_hex_ewkb().unwrap()));
        let config = SpatialConfig::default();
        let a = city(1);
        let geom = GeomRef::new(&conn, &config, &a);

        assert_eq!(geom.utm_zone().unwrap(), 32723);
        let statements = conn.statements();
        assert_eq!(
            statements[1],
            format!("SELECT ST_Transform('{}'::geometry, 4326)", projected.as_hex_ewkb().unwrap())
        );

        conn.push_value(Some(&wgs84.as_hex_ewkb().unwrap()));
        geom.to_utm().unwrap();
        assert_eq!(
            conn.last_statement().unwrap(),
            "SELECT ST_Transform(w1.geom, 32723) FROM cities w1 WHERE w1.id = 1"
        );
    }

    #[test]
    fn test_database_errors_are_not_rescued() {
        let conn = RecordingConnection::new();
        conn.push_error(SpatialError::Database("GEOSContains: IllegalArgumentException".into()));
        let config = SpatialConfig::default();
        let (a, b) = (city(1), city(2));

        let err = GeomRef::new(&conn, &config, &a).contains(&b).unwrap_err();
        assert!(err.is_calculation());
    }
}
