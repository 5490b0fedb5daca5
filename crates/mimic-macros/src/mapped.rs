//! `#[derive(MappedEvent)]` implementation.
//!
//! # Overview
//!
//! The derive generates an `impl Mapped` for a struct with named fields:
//!
//! 1. `mapping_spec()`: a `MappingSpec` built once and cached in a `OnceLock`
//! 2. `from_fields()`: a typed constructor taking the mapper's resolved values
//!
//! # Struct-level attribute `#[mapped(...)]`
//!
//! | Key | Example | Required | Description |
//! |-----|---------|----------|-------------|
//! | `natives` | `["host.ChatEvent"]` | No | Host-native type names this event is built from |
//! | `crate` | `"mimic_core"` | No | Path the core types are reached through (default `::mimic::__private`) |
//!
//! # Field-level attributes `#[mapped(...)]`
//!
//! | Key | Description |
//! |-----|-------------|
//! | `names` | Ordered candidate names; a trailing `()` marks an accessor (**required**) |
//! | `platform_specific` | Absent on some hosts; a missing value is not an error |
//! | `transform` | Target type key the raw value is transformed into |
//! | `data` | Free-form string parameters handed to the transformer |
//!
//! Fields without `#[mapped]` are initialized with `Default::default()`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Expr, ExprArray, Fields, Lit, LitStr, Path, parse_quote,
    spanned::Spanned,
};

// ============================================================================
// Attribute structures
// ============================================================================

/// Struct-level `#[mapped(…)]` settings.
struct StructAttrs {
    natives: Vec<LitStr>,
    krate: Path,
}

/// Per-field `#[mapped(…)]` settings.
struct FieldAttrs {
    names: Vec<LitStr>,
    platform_specific: bool,
    transform: Option<LitStr>,
    data: Vec<LitStr>,
}

// ============================================================================
// Entry point
// ============================================================================

pub fn derive_mapped_event(input: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "MappedEvent does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new(
                    input.span(),
                    "MappedEvent requires a struct with named fields",
                ));
            }
        },
        Data::Enum(_) | Data::Union(_) => {
            return Err(syn::Error::new(
                input.span(),
                "MappedEvent can only be derived for structs",
            ));
        }
    };

    let StructAttrs { natives, krate } = parse_struct_attrs(&input.attrs)?;

    let mut specs = Vec::new();
    let mut inits = Vec::new();
    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        match parse_field_attrs(&field.attrs)? {
            Some(attrs) => {
                if attrs.names.is_empty() {
                    return Err(syn::Error::new(
                        field.span(),
                        "#[mapped] fields require `names = [\"…\"]`",
                    ));
                }
                let field_name = LitStr::new(&ident.to_string(), ident.span());
                specs.push(generate_field_spec(&krate, &field_name, &attrs));
                inits.push(quote! { #ident: fields.take(#field_name)? });
            }
            None => {
                inits.push(quote! { #ident: ::std::default::Default::default() });
            }
        }
    }

    let name_lit = LitStr::new(&name.to_string(), name.span());

    Ok(quote! {
        impl #krate::Mapped for #name {
            fn mapping_spec() -> &'static #krate::MappingSpec {
                static SPEC: ::std::sync::OnceLock<#krate::MappingSpec> =
                    ::std::sync::OnceLock::new();
                SPEC.get_or_init(|| {
                    #krate::MappingSpec::new(#name_lit)
                        .natives(&[#(#natives),*])
                        #(.field(#specs))*
                })
            }

            #[allow(unused_mut, unused_variables)]
            fn from_fields(
                mut fields: #krate::MappedFields,
            ) -> #krate::MappingResult<Self> {
                ::std::result::Result::Ok(Self {
                    #(#inits),*
                })
            }
        }
    })
}

// ============================================================================
// Attribute parsing
// ============================================================================

fn parse_struct_attrs(attrs: &[Attribute]) -> syn::Result<StructAttrs> {
    let mut result = StructAttrs {
        natives: Vec::new(),
        krate: parse_quote!(::mimic::__private),
    };
    for attr in attrs {
        if !attr.path().is_ident("mapped") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("natives") {
                result.natives = parse_str_array(&meta.value()?.parse()?)?;
                Ok(())
            } else if meta.path.is_ident("crate") {
                result.krate = meta.value()?.parse::<LitStr>()?.parse()?;
                Ok(())
            } else {
                Err(meta.error("unknown struct attribute, expected `natives` or `crate`"))
            }
        })?;
    }
    Ok(result)
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<Option<FieldAttrs>> {
    let mut result: Option<FieldAttrs> = None;

    for attr in attrs {
        if !attr.path().is_ident("mapped") {
            continue;
        }
        let field = result.get_or_insert_with(|| FieldAttrs {
            names: Vec::new(),
            platform_specific: false,
            transform: None,
            data: Vec::new(),
        });
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("names") {
                field.names = parse_str_array(&meta.value()?.parse()?)?;
            } else if meta.path.is_ident("platform_specific") {
                field.platform_specific = true;
            } else if meta.path.is_ident("transform") {
                field.transform = Some(meta.value()?.parse::<LitStr>()?);
            } else if meta.path.is_ident("data") {
                field.data = parse_str_array(&meta.value()?.parse()?)?;
            } else {
                return Err(meta.error(
                    "unknown field attribute, expected `names`, `platform_specific`, \
                     `transform` or `data`",
                ));
            }
            Ok(())
        })?;
    }

    Ok(result)
}

fn parse_str_array(array: &ExprArray) -> syn::Result<Vec<LitStr>> {
    array
        .elems
        .iter()
        .map(|elem| match elem {
            Expr::Lit(expr) => match &expr.lit {
                Lit::Str(s) => Ok(s.clone()),
                other => Err(syn::Error::new(other.span(), "expected a string literal")),
            },
            other => Err(syn::Error::new(other.span(), "expected a string literal")),
        })
        .collect()
}

// ============================================================================
// Code generation
// ============================================================================

fn generate_field_spec(krate: &Path, field_name: &LitStr, attrs: &FieldAttrs) -> TokenStream {
    let names = &attrs.names;
    let mut spec = quote! {
        #krate::FieldSpec::new(#field_name, &[#(#names),*])
    };

    if attrs.platform_specific {
        spec = quote! { #spec.platform_specific() };
    }

    if let Some(to) = &attrs.transform {
        let data = &attrs.data;
        spec = quote! {
            #spec.transform(#krate::TransformSpec::new(#to).data(&[#(#data),*]))
        };
    }

    spec
}
