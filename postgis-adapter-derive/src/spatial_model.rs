use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{format_ident, quote};
use syn::{
    DataStruct, DeriveInput, Fields, GenericArgument, Ident, LitInt, LitStr, Meta, PathArguments, Result, Type,
};

struct GeomAttr {
    kind: Option<Ident>,
    srid: Option<i32>,
}

struct FieldInfo<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    column: String,
    is_id: bool,
    skip: bool,
    optional: bool,
    geom: Option<GeomAttr>,
}

pub(crate) fn generate_spatial_model_for_struct(ast: &DeriveInput, data: &DataStruct) -> Result<TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let named = match &data.fields {
        Fields::Named(named) => named,
        _ => {
            return Err(syn::Error::new_spanned(
                ast,
                format!(
                    "Cannot derive SpatialModel for '{}': only structs with named fields are supported",
                    name
                ),
            ))
        }
    };

    let mut table_name = table_name_for(&name.to_string());
    let mut primary_key: Option<String> = None;
    for attr in &ast.attrs {
        if attr.path().is_ident("spatial") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("table") {
                    let s: LitStr = meta.value()?.parse()?;
                    table_name = s.value();
                    Ok(())
                } else if meta.path.is_ident("primary_key") {
                    let s: LitStr = meta.value()?.parse()?;
                    primary_key = Some(s.value());
                    Ok(())
                } else {
                    Err(meta.error("Unknown spatial attribute, expected `table` or `primary_key`"))
                }
            })?;
        }
    }

    let mut fields = Vec::with_capacity(named.named.len());
    for field in &named.named {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let mut info = FieldInfo {
            ident,
            ty: &field.ty,
            column: ident.to_string(),
            is_id: false,
            skip: false,
            optional: option_inner(&field.ty).is_some(),
            geom: None,
        };

        for attr in &field.attrs {
            if attr.path().is_ident("spatial") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("id") {
                        info.is_id = true;
                        Ok(())
                    } else if meta.path.is_ident("skip") {
                        info.skip = true;
                        Ok(())
                    } else if meta.path.is_ident("column") {
                        let s: LitStr = meta.value()?.parse()?;
                        info.column = s.value();
                        Ok(())
                    } else {
                        Err(meta.error("Unknown spatial field attribute, expected `id`, `skip` or `column`"))
                    }
                })?;
            } else if attr.path().is_ident("geom") {
                let mut geom = GeomAttr { kind: None, srid: None };
                // A bare `#[geom]` leaves the subtype to the catalog.
                if matches!(attr.meta, Meta::Path(_)) {
                    info.geom = Some(geom);
                    continue;
                }
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("kind") {
                        let s: LitStr = meta.value()?.parse()?;
                        let variant = geometry_type_variant(&s.value())
                            .ok_or_else(|| syn::Error::new(s.span(), format!("Unknown geometry kind '{}'", s.value())))?;
                        geom.kind = Some(Ident::new(variant, Span::call_site()));
                        Ok(())
                    } else if meta.path.is_ident("srid") {
                        let lit: LitInt = meta.value()?.parse()?;
                        geom.srid = Some(lit.base10_parse()?);
                        Ok(())
                    } else if meta.path.is_ident("column") {
                        let s: LitStr = meta.value()?.parse()?;
                        info.column = s.value();
                        Ok(())
                    } else {
                        Err(meta.error("Unknown geom attribute, expected `kind`, `srid` or `column`"))
                    }
                })?;
                info.geom = Some(geom);
            }
        }

        if info.skip && (info.is_id || info.geom.is_some()) {
            return Err(syn::Error::new_spanned(
                field,
                "A skipped field cannot be the id or a geometry column",
            ));
        }
        fields.push(info);
    }

    let ids: Vec<&FieldInfo> = fields.iter().filter(|f| f.is_id).collect();
    let id_field = match ids.as_slice() {
        [id] => *id,
        [] => fields
            .iter()
            .find(|f| f.ident == "id")
            .ok_or_else(|| syn::Error::new_spanned(ast, "No primary key field: add a field `id` or mark one with #[spatial(id)]"))?,
        _ => return Err(syn::Error::new_spanned(ast, "Multiple #[spatial(id)] fields are not allowed")),
    };
    let primary_key = primary_key.unwrap_or_else(|| id_field.column.clone());

    let geometries: Vec<&FieldInfo> = fields.iter().filter(|f| f.geom.is_some()).collect();
    if geometries.is_empty() {
        return Err(syn::Error::new_spanned(
            ast,
            format!("SpatialModel '{}' needs at least one #[geom] field", name),
        ));
    }

    let declarations = geometries.iter().map(|f| {
        let column = &f.column;
        let (kind, srid) = match &f.geom {
            Some(geom) => (geom.kind.as_ref(), geom.srid),
            None => (None, None),
        };
        let kind = match kind {
            Some(variant) => quote!(Some(::postgis_adapter::schema::GeometryType::#variant)),
            None => quote!(None),
        };
        let srid = match srid {
            Some(srid) => quote!(Some(#srid)),
            None => quote!(None),
        };
        quote! {
            ::postgis_adapter::registry::GeomColumnDecl::new(#column, #kind, #srid)
        }
    });

    let getters = geometries.iter().map(|f| {
        let column = &f.column;
        let ident = f.ident;
        if f.optional {
            quote!(#column => self.#ident.as_ref(),)
        } else {
            quote!(#column => Some(&self.#ident),)
        }
    });

    let setters = geometries.iter().map(|f| {
        let column = &f.column;
        let ident = f.ident;
        if f.optional {
            quote!(#column => self.#ident = Some(geometry),)
        } else {
            quote!(#column => self.#ident = geometry,)
        }
    });

    let decoders = fields.iter().map(|f| {
        let ident = f.ident;
        let ty = f.ty;
        let column = &f.column;
        if f.skip {
            quote!(#ident: ::core::default::Default::default(),)
        } else {
            quote!(#ident: row.decode::<#ty>(#column)?,)
        }
    });

    let id_ident = id_field.ident;
    let marker = geometries
        .first()
        .and_then(|f| f.geom.as_ref())
        .and_then(|geom| geom.kind.as_ref())
        .and_then(|variant| marker_for(&variant.to_string()))
        .map(|marker| {
            let marker = format_ident!("{}", marker);
            quote! {
                impl #impl_generics ::postgis_adapter::registry::#marker for #name #ty_generics #where_clause {}
            }
        });

    let expanded = quote! {
        impl #impl_generics ::postgis_adapter::registry::SpatialModel for #name #ty_generics #where_clause {
            fn table_name() -> &'static str {
                #table_name
            }

            fn primary_key() -> &'static str {
                #primary_key
            }

            fn geometry_columns() -> &'static [::postgis_adapter::registry::GeomColumnDecl] {
                const COLUMNS: &[::postgis_adapter::registry::GeomColumnDecl] = &[#(#declarations),*];
                COLUMNS
            }

            fn record_id(&self) -> Option<i64> {
                ::postgis_adapter::registry::ToRecordId::to_record_id(&self.#id_ident)
            }

            fn geometry(&self, column: &str) -> Option<&::postgis_adapter::geometry::Geometry> {
                match column {
                    #(#getters)*
                    _ => None,
                }
            }

            fn set_geometry(
                &mut self,
                column: &str,
                geometry: ::postgis_adapter::geometry::Geometry,
            ) -> ::postgis_adapter::errors::SpatialResult<()> {
                match column {
                    #(#setters)*
                    _ => {
                        return Err(::postgis_adapter::errors::SpatialError::InvalidOperation(format!(
                            "{} has no geometry column '{}'",
                            #table_name, column
                        )))
                    }
                }
                Ok(())
            }
        }

        impl #impl_generics ::postgis_adapter::subject::AsSubject for #name #ty_generics #where_clause {
            fn as_subject(&self) -> ::postgis_adapter::errors::SpatialResult<::postgis_adapter::subject::Subject<'_>> {
                ::postgis_adapter::subject::model_subject(self)
            }

            fn loaded_geometry(&self) -> Option<&::postgis_adapter::geometry::Geometry> {
                ::postgis_adapter::registry::SpatialModel::primary_geometry(self)
            }
        }

        impl #impl_generics ::postgis_adapter::row::FromSpatialRow for #name #ty_generics #where_clause {
            fn from_spatial_row(row: &::postgis_adapter::connection::Row) -> ::postgis_adapter::errors::SpatialResult<Self> {
                Ok(Self {
                    #(#decoders)*
                })
            }
        }

        #marker
    };

    Ok(expanded.into())
}

/// `City` becomes `cities`, `DiffName` becomes `diff_names`.
fn table_name_for(type_name: &str) -> String {
    let mut snake = String::with_capacity(type_name.len() + 4);
    for (i, ch) in type_name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                snake.push('_');
            }
            snake.extend(ch.to_lowercase());
        } else {
            snake.push(ch);
        }
    }
    pluralize(&snake)
}

fn pluralize(word: &str) -> String {
    let consonant_y = word.ends_with('y')
        && !word.ends_with("ay")
        && !word.ends_with("ey")
        && !word.ends_with("oy")
        && !word.ends_with("uy");
    if consonant_y {
        format!("{}ies", &word[..word.len() - 1])
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|end| word.ends_with(end)) {
        format!("{}es", word)
    } else {
        format!("{}s", word)
    }
}

fn geometry_type_variant(kind: &str) -> Option<&'static str> {
    match kind.to_ascii_lowercase().replace('_', "").as_str() {
        "point" => Some("Point"),
        "linestring" => Some("LineString"),
        "polygon" => Some("Polygon"),
        "multipoint" => Some("MultiPoint"),
        "multilinestring" => Some("MultiLineString"),
        "multipolygon" => Some("MultiPolygon"),
        "geometrycollection" => Some("GeometryCollection"),
        "geometry" => Some("Geometry"),
        _ => None,
    }
}

fn marker_for(variant: &str) -> Option<&'static str> {
    match variant {
        "Point" => Some("PointGeometry"),
        "LineString" | "MultiLineString" => Some("LineStringGeometry"),
        "Polygon" | "MultiPolygon" => Some("PolygonGeometry"),
        _ => None,
    }
}

fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        }),
        _ => None,
    }
}
