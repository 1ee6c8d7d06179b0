#![recursion_limit = "128"]
//! # PostGIS Adapter Derive Macros
//!
//! This crate provides `#[derive(SpatialModel)]`, which declares a struct's
//! table and geometry columns for the `postgis_adapter` crate.
//!
//! ## Attributes
//!
//! - `#[spatial(table = "...", primary_key = "...")]` on the struct. The table
//!   defaults to the pluralized snake case type name, the key to `id`.
//! - `#[spatial(id)]` marks the primary key field. Without it a field named
//!   `id` is used.
//! - `#[spatial(column = "...")]` reads a field from a differently named
//!   column.
//! - `#[spatial(skip)]` leaves a field out of row decoding and fills it with
//!   `Default::default()`.
//! - `#[geom(kind = "point", srid = 4326, column = "...")]` marks a geometry
//!   field. `kind` is optional; without it the subtype is looked up in the
//!   `geometry_columns` catalog at runtime.
//!
//! The first geometry field is the primary one. Its declared kind decides
//! which function family the model gets: `point`, `line_string` /
//! `multi_line_string` or `polygon` / `multi_polygon`.
//!
//! # Examples
//!
//! ```rust,ignore
//! use postgis_adapter::geometry::Geometry;
//! use postgis_adapter_derive::SpatialModel;
//!
//! #[derive(SpatialModel)]
//! #[spatial(table = "streets")]
//! pub struct Street {
//!     pub id: Option<i64>,
//!     pub data: String,
//!     #[geom(kind = "line_string", srid = 4326)]
//!     pub geom: Option<Geometry>,
//! }
//! ```
//!
//! The model also gets `AsSubject` and `FromSpatialRow`, so it can be passed
//! to every spatial function and read back by finders.

extern crate proc_macro;
mod spatial_model;

use crate::spatial_model::generate_spatial_model_for_struct;
use proc_macro::TokenStream;
use syn::{Data, DeriveInput};

/// Derives `SpatialModel`, `AsSubject`, `FromSpatialRow` and the capability
/// marker trait of the primary geometry column.
///
/// # Errors
///
/// Returns a compile error if:
/// - Applied to an enum, a union or a tuple struct
/// - No geometry field is marked with `#[geom]`
/// - No primary key field can be found
/// - A `kind` is not a known geometry subtype
#[proc_macro_derive(SpatialModel, attributes(spatial, geom))]
pub fn derive_spatial_model(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    match ast.data {
        Data::Struct(ref data) => match generate_spatial_model_for_struct(&ast, data) {
            Ok(token_stream) => token_stream,
            Err(e) => e.to_compile_error().into(),
        },
        Data::Enum(_) => {
            let error = syn::Error::new_spanned(
                &ast,
                "Cannot derive SpatialModel for enums. Only structs with named fields are supported.",
            );
            error.to_compile_error().into()
        }
        Data::Union(_) => {
            let error = syn::Error::new_spanned(
                &ast,
                "Cannot derive SpatialModel for unions. Only structs with named fields are supported.",
            );
            error.to_compile_error().into()
        }
    }
}
