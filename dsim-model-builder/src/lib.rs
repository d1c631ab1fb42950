// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Model builder

extern crate proc_macro;

use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};
use syn::{self, Data, DeriveInput, Fields, Lit, Meta, NestedMeta, parse_macro_input};

/// Create a std::fmt::Display implementation for a struct with an Entity.
#[proc_macro_derive(EntityDisplay)]
pub fn entity_display(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let DeriveInput {
        ident, generics, ..
    } = parse_macro_input!(input);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let output = quote! {
        impl #impl_generics std::fmt::Display for #ident #ty_generics #where_clause {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.entity, f)
            }
        }
    };

    output.into()
}

/// One `#[property(...)]` annotated field.
struct PropertyField {
    ident: syn::Ident,
    default: f64,
    min: Option<f64>,
    max: Option<f64>,
    units: String,
    on_change: Option<syn::Ident>,
    integer: bool,
}

/// Whether `ty` is a primitive integer, returning whether it is unsigned.
fn integer_kind(ty: &syn::Type) -> Option<bool> {
    let syn::Type::Path(path) = ty else {
        return None;
    };
    let ident = path.path.get_ident()?.to_string();
    match ident.as_str() {
        "u8" | "u16" | "u32" | "u64" | "u128" | "usize" => Some(true),
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" => Some(false),
        _ => None,
    }
}

fn lit_to_f64(lit: &Lit) -> syn::Result<f64> {
    match lit {
        Lit::Float(f) => f.base10_parse::<f64>(),
        Lit::Int(i) => i.base10_parse::<f64>(),
        _ => Err(syn::Error::new_spanned(lit, "expected a numeric literal")),
    }
}

fn parse_property(field: &syn::Field, meta: Meta) -> syn::Result<PropertyField> {
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new_spanned(field, "properties must be named fields"))?;
    let mut property = PropertyField {
        ident,
        default: 0.0,
        min: None,
        max: None,
        units: String::new(),
        on_change: None,
        integer: false,
    };
    let unsigned = integer_kind(&field.ty);
    property.integer = unsigned.is_some();
    if unsigned == Some(true) {
        property.min = Some(0.0);
    }

    let list = match meta {
        Meta::Path(_) => return Ok(property),
        Meta::List(list) => list,
        Meta::NameValue(nv) => {
            return Err(syn::Error::new_spanned(nv, "expected #[property(...)]"));
        }
    };

    for nested in list.nested {
        let nv = match nested {
            NestedMeta::Meta(Meta::NameValue(nv)) => nv,
            other => return Err(syn::Error::new_spanned(other, "expected `key = value`")),
        };
        let key = nv
            .path
            .get_ident()
            .map(ToString::to_string)
            .unwrap_or_default();
        match key.as_str() {
            "default" => property.default = lit_to_f64(&nv.lit)?,
            "min" => property.min = Some(lit_to_f64(&nv.lit)?),
            "max" => property.max = Some(lit_to_f64(&nv.lit)?),
            "units" | "on_change" => {
                let Lit::Str(s) = &nv.lit else {
                    return Err(syn::Error::new_spanned(&nv.lit, "expected a string"));
                };
                if key == "units" {
                    property.units = s.value();
                } else {
                    property.on_change = Some(format_ident!("{}", s.value()));
                }
            }
            _ => return Err(syn::Error::new_spanned(&nv.path, "unknown property key")),
        }
    }
    Ok(property)
}

fn option_tokens(value: Option<f64>) -> TokenStream {
    match value {
        Some(v) => {
            let v = Literal::f64_unsuffixed(v);
            quote! { Some(#v) }
        }
        None => quote! { None },
    }
}

fn expand_properties(input: DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Properties can only be derived for structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Properties requires named fields",
        ));
    };

    let mut properties = Vec::new();
    let mut default_inits = Vec::new();
    for field in &fields.named {
        let mut found = None;
        for attr in &field.attrs {
            if attr.path.is_ident("property") {
                found = Some(parse_property(field, attr.parse_meta()?)?);
            }
        }
        let field_ident = &field.ident;
        match found {
            Some(property) => {
                let default = Literal::f64_unsuffixed(property.default);
                default_inits.push(quote! { #field_ident: (#default) as _ });
                properties.push(property);
            }
            None => default_inits.push(quote! { #field_ident: Default::default() }),
        }
    }

    let specs = properties.iter().map(|p| {
        let name = p.ident.to_string();
        let default = Literal::f64_unsuffixed(p.default);
        let min = option_tokens(p.min);
        let max = option_tokens(p.max);
        let units = &p.units;
        let integer = p.integer;
        quote! {
            ::dsim_engine::property::PropertySpec {
                name: #name,
                default: #default,
                min: #min,
                max: #max,
                units: #units,
                integer: #integer,
            }
        }
    });

    let getters = properties.iter().map(|p| {
        let name = p.ident.to_string();
        let field = &p.ident;
        quote! { #name => Some(self.#field as f64), }
    });

    let setters = properties.iter().enumerate().map(|(i, p)| {
        let name = p.ident.to_string();
        let field = &p.ident;
        let on_change = p.on_change.as_ref().map(|f| quote! { self.#f(); });
        quote! {
            #name => {
                Self::PROPERTY_SPECS[#i].check(value)?;
                self.#field = value as _;
                #on_change
                Ok(())
            }
        }
    });

    Ok(quote! {
        impl #impl_generics #ident #ty_generics #where_clause {
            /// Schema of the properties of this component.
            pub const PROPERTY_SPECS: &'static [::dsim_engine::property::PropertySpec] = &[
                #(#specs),*
            ];
        }

        impl #impl_generics ::dsim_engine::property::Properties for #ident #ty_generics #where_clause {
            fn property_specs(&self) -> &'static [::dsim_engine::property::PropertySpec] {
                Self::PROPERTY_SPECS
            }

            fn property(&self, name: &str) -> Option<f64> {
                match name {
                    #(#getters)*
                    _ => None,
                }
            }

            fn set_property(&mut self, name: &str, value: f64) -> ::dsim_engine::types::SimResult {
                match name {
                    #(#setters)*
                    _ => Err(::dsim_engine::types::SimError(format!("Unknown property: {name}"))),
                }
            }
        }

        impl #impl_generics Default for #ident #ty_generics #where_clause {
            fn default() -> Self {
                Self {
                    #(#default_inits),*
                }
            }
        }
    })
}

/// Create the property schema, accessors and `Default` implementation for a
/// component.
///
/// Each field marked `#[property(default = .., min = .., max = .., units = ..,
/// on_change = "method")]` becomes a named numeric property. Properties of
/// integer type only accept whole numbers, and unsigned ones are at least 0.
/// All other fields are initialised with `Default::default()`.
#[proc_macro_derive(Properties, attributes(property))]
pub fn properties(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_properties(input) {
        Ok(output) => output.into(),
        Err(e) => e.to_compile_error().into(),
    }
}
