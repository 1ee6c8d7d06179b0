use postgis_adapter::prelude::*;
use postgis_adapter::finder::FindQuery;
use postgis_int_test::models::Street;
use postgis_int_test::test_util::{cleanup, create_test_context, insert_street, run_test};

#[test]
#[ignore = "needs a PostGIS database at POSTGIS_TEST_URL"]
fn test_simplify_in_place_persists() {
    run_test(
        || create_test_context(),
        |ctx| {
            let adapter = ctx.adapter();
            let wobbly = Geometry::line_string(vec![[0.0, 0.0], [1.0, 0.01], [2.0, 0.0]], 123)?;
            let mut street = insert_street(&ctx, "wobbly", wobbly)?;

            let simplified = adapter.record(&mut street).simplify_in_place(0.1)?.clone();
            assert_eq!(simplified.num_points(), 2);
            assert_eq!(street.geom.as_ref().map(Geometry::num_points), Some(2));

            let stored = adapter
                .finder::<Street>()
                .first(FindQuery::new("streets").condition(format!("id = {}", street.id.unwrap_or_default())))?;
            assert_eq!(stored.and_then(|s| s.geom), Some(simplified));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
