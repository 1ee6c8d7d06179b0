//! Record types shared by the integration tests. All of them live in the
//! SRID 123 test projection.

use postgis_adapter::geometry::Geometry;
use postgis_adapter_derive::SpatialModel;

#[derive(Debug, Clone, PartialEq, SpatialModel)]
pub struct City {
    pub id: Option<i64>,
    pub data: Option<String>,
    #[geom(kind = "polygon", srid = 123)]
    pub geom: Option<Geometry>,
}

#[derive(Debug, Clone, PartialEq, SpatialModel)]
pub struct Position {
    pub id: Option<i64>,
    pub data: Option<String>,
    #[geom(kind = "point", srid = 123)]
    pub geom: Option<Geometry>,
}

#[derive(Debug, Clone, PartialEq, SpatialModel)]
pub struct Street {
    pub id: Option<i64>,
    pub data: Option<String>,
    #[geom(kind = "line_string", srid = 123)]
    pub geom: Option<Geometry>,
}

/// A model whose geometry column is not called `geom`.
#[derive(Debug, Clone, PartialEq, SpatialModel)]
pub struct DiffName {
    pub id: Option<i64>,
    pub data: Option<String>,
    #[geom(kind = "point", srid = 123, column = "the_geom")]
    pub location: Option<Geometry>,
}
