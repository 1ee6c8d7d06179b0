use postgis_adapter::prelude::*;
use postgis_int_test::models::{DiffName, Position};
use postgis_int_test::test_util::{
    assert_close, bent_street, cleanup, create_test_context, holed_triangle, insert, insert_city,
    insert_position, insert_street, point, run_test, square,
};

#[test]
#[ignore = "needs a PostGIS database at POSTGIS_TEST_URL"]
fn test_distance_between_positions() {
    run_test(
        || create_test_context(),
        |ctx| {
            let adapter = ctx.adapter();
            let a = insert_position(&ctx, "a", point(1.0, 1.0))?;
            let b = insert_position(&ctx, "b", point(5.0, 5.0))?;

            assert_close(adapter.geom(&a).distance_to(&b)?, 5.65685424949238, 0.0001);
            assert_close(adapter.geom(&b).distance_to(&a)?, 5.65685424949238, 0.0001);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
#[ignore = "needs a PostGIS database at POSTGIS_TEST_URL"]
fn test_azimuth_and_relate_matrix() {
    run_test(
        || create_test_context(),
        |ctx| {
            let adapter = ctx.adapter();
            let a = insert_position(&ctx, "a", point(1.0, 1.0))?;
            let b = insert_position(&ctx, "b", point(5.0, 5.0))?;

            assert_close(adapter.geom(&a).azimuth(&b)?, 0.785398163397448, 0.000001);
            assert_eq!(adapter.geom(&a).relate_matrix(&b)?, "FF0FFF0F2");
            assert!(adapter.geom(&a).relate(&b, "FF*FFF***")?);
            assert!(adapter.geom(&a).disjoint(&b)?);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
#[ignore = "needs a PostGIS database at POSTGIS_TEST_URL"]
fn test_polygon_measurements() {
    run_test(
        || create_test_context(),
        |ctx| {
            let adapter = ctx.adapter();
            let city = insert_city(&ctx, "holed", holed_triangle()?)?;

            let area = adapter.geom(&city).area()?;
            assert_close(area, 724.0, 0.1);
            assert_eq!(adapter.geom(&city).area()?, area);
            assert_close(adapter.geom(&city).perimeter()?, 161.892, 0.001);

            let centroid = adapter.geom(&city).centroid()?;
            assert_eq!(centroid.srid(), 123);
            assert_eq!(adapter.geom(&city).srid_in_database()?, 123);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
#[ignore = "needs a PostGIS database at POSTGIS_TEST_URL"]
fn test_containment_duals() {
    run_test(
        || create_test_context(),
        |ctx| {
            let adapter = ctx.adapter();
            let city = insert_city(&ctx, "big", square(0.0, 0.0, 10.0)?)?;
            let inner = insert_position(&ctx, "inner", point(1.0, 1.0))?;
            let outer = insert_position(&ctx, "outer", point(20.0, 20.0))?;

            assert!(adapter.geom(&inner).within(&city)?);
            assert!(adapter.geom(&city).contains(&inner)?);
            assert!(adapter.geom(&city).covers(&inner)?);
            assert!(adapter.geom(&inner).inside(&city)?);
            assert!(!adapter.geom(&inner).outside(&city)?);

            assert!(!adapter.geom(&outer).within(&city)?);
            assert!(adapter.geom(&outer).outside(&city)?);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
#[ignore = "needs a PostGIS database at POSTGIS_TEST_URL"]
fn test_line_string_measurements() {
    run_test(
        || create_test_context(),
        |ctx| {
            let adapter = ctx.adapter();
            let street = insert_street(&ctx, "bent", bent_street()?)?;

            assert_close(adapter.geom(&street).length()?, 8.65685424949238, 0.0001);
            assert_eq!(adapter.geom(&street).num_points()?, 3);
            assert_eq!(adapter.geom(&street).start_point()?.x(), Some(1.0));
            assert_eq!(adapter.geom(&street).end_point()?.y(), Some(2.0));

            let position = insert_position(&ctx, "corner", point(5.0, 5.0))?;
            let fraction = adapter.geom(&position).where_on_line(&street)?;
            assert_close(fraction, 5.65685424949238 / 8.65685424949238, 0.0001);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
#[ignore = "needs a PostGIS database at POSTGIS_TEST_URL"]
fn test_invalid_pairing_is_calculation_error() {
    run_test(
        || create_test_context(),
        |ctx| {
            let adapter = ctx.adapter();
            let city = insert_city(&ctx, "big", square(0.0, 0.0, 10.0)?)?;
            let position = insert_position(&ctx, "a", point(1.0, 1.0))?;

            let result = adapter.geom(&position).where_on_line(&city);
            match result {
                Err(err) => assert!(err.is_calculation(), "unexpected error {:?}", err),
                Ok(value) => panic!("expected an error, got {}", value),
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
#[ignore = "needs a PostGIS database at POSTGIS_TEST_URL"]
fn test_custom_geometry_column() {
    run_test(
        || create_test_context(),
        |ctx| {
            let adapter = ctx.adapter();
            let id = insert::<DiffName>(&ctx, "renamed", &point(1.0, 1.0))?;
            let model = DiffName {
                id: Some(id),
                data: Some("renamed".to_string()),
                location: Some(point(1.0, 1.0)),
            };

            assert_close(adapter.geom(&model).distance_to(&point(4.0, 5.0))?, 5.0, 0.0001);
            assert_eq!(adapter.geometry_type("diff_names", "the_geom"), GeometryType::Point);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
#[ignore = "needs a PostGIS database at POSTGIS_TEST_URL"]
fn test_unsaved_model_is_sent_as_literal() {
    run_test(
        || create_test_context(),
        |ctx| {
            let adapter = ctx.adapter();
            let saved = insert_position(&ctx, "saved", point(1.0, 1.0))?;
            let unsaved = Position {
                id: None,
                data: None,
                geom: Some(point(1.0, 4.0)),
            };

            assert_close(adapter.geom(&saved).distance_to(&unsaved)?, 3.0, 0.0001);
            assert!(adapter.geom(&unsaved).d_within(&saved, 3.5)?);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
