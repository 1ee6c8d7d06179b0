use postgis_adapter::prelude::*;
use postgis_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
#[ignore = "needs a PostGIS database at POSTGIS_TEST_URL"]
fn test_zm_column_introspection() {
    run_test(
        || create_test_context(),
        |ctx| {
            let adapter = ctx.adapter();
            adapter.schema().create_table("zm_points", TableOptions::new().force(), |t| {
                t.string("data")
                    .point("geom", ColumnOptions::new().srid(4326).with_z().with_m());
            })?;

            let columns = adapter.schema().columns("zm_points")?;
            let geom = columns
                .iter()
                .find(|c| c.name == "geom")
                .and_then(|c| c.spatial.clone())
                .expect("geom is a spatial column");
            assert_eq!(geom.geometry_type, GeometryType::Point);
            assert_eq!(geom.srid, 4326);
            assert!(geom.with_z);
            assert!(geom.with_m);

            let data = columns.iter().find(|c| c.name == "data").expect("data column");
            assert!(!data.is_spatial());

            assert_eq!(adapter.geometry_type("zm_points", "geom"), GeometryType::Point);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
#[ignore = "needs a PostGIS database at POSTGIS_TEST_URL"]
fn test_measured_column_keeps_m() {
    run_test(
        || create_test_context(),
        |ctx| {
            let adapter = ctx.adapter();
            adapter.schema().create_table("zm_points", TableOptions::new().force(), |t| {
                t.line_string("geom", ColumnOptions::new().srid(4326).with_m());
            })?;

            let geom = adapter
                .schema()
                .columns("zm_points")?
                .into_iter()
                .find_map(|c| c.spatial)
                .expect("one spatial column");
            assert_eq!(geom.geometry_type, GeometryType::LineString);
            assert!(!geom.with_z);
            assert!(geom.with_m);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
#[ignore = "needs a PostGIS database at POSTGIS_TEST_URL"]
fn test_spatial_index_round_trip() {
    run_test(
        || create_test_context(),
        |ctx| {
            let adapter = ctx.adapter();
            let schema = adapter.schema();
            schema.add_index("cities", &["geom"], IndexOptions::new().spatial())?;

            let indexes = schema.indexes("cities")?;
            assert_eq!(indexes.len(), 1);
            assert_eq!(indexes[0].name, "index_cities_on_geom");
            assert!(indexes[0].spatial);
            assert_eq!(indexes[0].columns, vec!["geom".to_string()]);

            schema.remove_index("cities", "index_cities_on_geom")?;
            assert!(schema.indexes("cities")?.is_empty());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
#[ignore = "needs a PostGIS database at POSTGIS_TEST_URL"]
fn test_tables_and_unknown_columns() {
    run_test(
        || create_test_context(),
        |ctx| {
            let adapter = ctx.adapter();
            let schema = adapter.schema();
            assert!(schema.table_exists("cities")?);
            assert!(!schema.tables()?.contains(&"spatial_ref_sys".to_string()));

            assert_eq!(adapter.geometry_type("no_such_table", "geom"), GeometryType::Unknown);

            schema.add_geometry_column("cities", "center", GeometryType::Point, ColumnOptions::new().srid(123))?;
            assert_eq!(adapter.geometry_type("cities", "center"), GeometryType::Point);
            schema.remove_column("cities", "center")?;
            assert!(schema.columns("cities")?.iter().all(|c| c.name != "center"));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
