//! Spatial calculations, finders and in-place updates against a live
//! PostGIS database.

mod bbox_test;
mod calculation_test;
mod finder_test;
mod record_test;
