use postgis_adapter::prelude::*;
use postgis_int_test::models::{City, Position, Street};
use postgis_int_test::test_util::{
    bent_street, cleanup, create_test_context, insert_city, insert_position, insert_street, point, run_test,
    square, TestContext,
};

fn insert_positions(ctx: &TestContext) -> SpatialResult<()> {
    insert_position(ctx, "near", point(1.0, 1.0))?;
    insert_position(ctx, "middle", point(5.0, 5.0))?;
    insert_position(ctx, "far", point(10.0, 10.0))?;
    Ok(())
}

fn names<M, F: Fn(&M) -> Option<String>>(models: &[M], name: F) -> Vec<String> {
    models.iter().filter_map(name).collect()
}

#[test]
#[ignore = "needs a PostGIS database at POSTGIS_TEST_URL"]
fn test_closest_and_farthest() {
    run_test(
        || create_test_context(),
        |ctx| {
            insert_positions(&ctx)?;
            let adapter = ctx.adapter();
            let finder = adapter.finder::<Position>();

            let closest = finder.closest_to(&point(4.0, 4.0))?;
            assert_eq!(closest.and_then(|p| p.data), Some("middle".to_string()));

            let farthest = finder.farthest_from(&point(0.0, 0.0))?;
            assert_eq!(farthest.and_then(|p| p.data), Some("far".to_string()));

            let close = finder.close_to(&point(0.0, 0.0), 2u64)?;
            assert_eq!(names(&close, |p| p.data.clone()), vec!["near", "middle"]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
#[ignore = "needs a PostGIS database at POSTGIS_TEST_URL"]
fn test_within_margin_and_envelope() {
    run_test(
        || create_test_context(),
        |ctx| {
            insert_positions(&ctx)?;
            let adapter = ctx.adapter();
            let finder = adapter.finder::<Position>();

            let nearby = finder.all_dwithin(&point(1.0, 1.0), 6.0)?;
            assert_eq!(nearby.len(), 2);

            let boxed = finder.in_envelope(&BoundingBox::new(0.0, 0.0, 6.0, 6.0), 123)?;
            let mut found = names(&boxed, |p| p.data.clone());
            found.sort();
            assert_eq!(found, vec!["middle", "near"]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
#[ignore = "needs a PostGIS database at POSTGIS_TEST_URL"]
fn test_containing_city() {
    run_test(
        || create_test_context(),
        |ctx| {
            insert_city(&ctx, "big", square(0.0, 0.0, 10.0)?)?;
            insert_city(&ctx, "small", square(20.0, 20.0, 5.0)?)?;
            let adapter = ctx.adapter();
            let finder = adapter.finder::<City>();

            let city = finder.contain(&point(1.0, 1.0))?;
            assert_eq!(city.and_then(|c| c.data), Some("big".to_string()));
            assert!(finder.contain(&point(15.0, 15.0))?.is_none());

            let by_area = finder.by_area(SortOrder::Ascending)?;
            assert_eq!(names(&by_area, |c| c.data.clone()), vec!["small", "big"]);

            let by_perimeter = finder.by_perimeter(SortOrder::Descending)?;
            assert_eq!(names(&by_perimeter, |c| c.data.clone()), vec!["big", "small"]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
#[ignore = "needs a PostGIS database at POSTGIS_TEST_URL"]
fn test_persisted_subject_in_finder() {
    run_test(
        || create_test_context(),
        |ctx| {
            let big = insert_city(&ctx, "big", square(0.0, 0.0, 10.0)?)?;
            insert_positions(&ctx)?;
            let adapter = ctx.adapter();

            let inside = adapter.finder::<Position>().all_within(&big)?;
            let mut found = names(&inside, |p| p.data.clone());
            found.sort();
            assert_eq!(found, vec!["middle", "near"]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
#[ignore = "needs a PostGIS database at POSTGIS_TEST_URL"]
fn test_longest_street() {
    run_test(
        || create_test_context(),
        |ctx| {
            insert_street(&ctx, "bent", bent_street()?)?;
            insert_street(
                &ctx,
                "short",
                Geometry::line_string(vec![[0.0, 0.0], [1.0, 0.0]], 123)?,
            )?;
            let adapter = ctx.adapter();

            let longest = adapter.finder::<Street>().longest()?;
            let longest = longest.expect("a street");
            assert_eq!(longest.data.as_deref(), Some("bent"));
            assert_eq!(longest.geom.map(|g| g.num_points()), Some(3));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
