use postgis_adapter::prelude::*;
use postgis_int_test::test_util::{cleanup, create_test_context, insert_city, insert_position, point, run_test, square};

#[test]
#[ignore = "needs a PostGIS database at POSTGIS_TEST_URL"]
fn test_point_left_of_polygon_box() {
    run_test(
        || create_test_context(),
        |ctx| {
            let adapter = ctx.adapter();
            let position = insert_position(&ctx, "a", point(1.0, 1.0))?;
            let city = insert_city(&ctx, "east", square(4.0, 4.0, 6.0)?)?;

            let geom = adapter.geom(&position);
            assert!(geom.strictly_left_of(&city)?);
            assert!(!geom.strictly_right_of(&city)?);
            assert!(geom.overlaps_or_left_of(&city)?);
            assert!(geom.strictly_below(&city)?);
            assert!(!geom.interacts_with(&city)?);
            assert!(!geom.completely_contained_by(&city)?);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
#[ignore = "needs a PostGIS database at POSTGIS_TEST_URL"]
fn test_operator_tokens() {
    run_test(
        || create_test_context(),
        |ctx| {
            let adapter = ctx.adapter();
            let position = insert_position(&ctx, "inside", point(5.0, 5.0))?;
            let city = insert_city(&ctx, "east", square(4.0, 4.0, 6.0)?)?;

            let geom = adapter.geom(&position);
            assert!(geom.bbox_token("@", &city)?);
            assert!(geom.bbox(BboxOperator::Interacts, &city)?);
            assert!(adapter.geom(&city).completely_contains(&position)?);
            assert!(geom.bbox_token("<=>", &city).is_err());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
