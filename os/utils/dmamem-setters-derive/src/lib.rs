//! # Setters Derive
//!
//! Builder-style setters for configuration structs:
//!
//! - `set_<field>(&mut self, value) -> &mut Self` for in-place chains,
//! - `with_<field>(self, value) -> Self`, `const` unless told otherwise,
//!   so defaults can be assembled in `const` items.
//!
//! Field options, given as `#[setters(...)]`:
//!
//! | option      | effect                                                  |
//! |-------------|---------------------------------------------------------|
//! | `skip`      | no setters for this field                               |
//! | `non_const` | `with_<field>` is not `const` (for types with `Drop`)   |
//!
//! Unknown options are a compile error.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Field, Fields, parse_macro_input, spanned::Spanned};

/// Generate `set_<field>` and `with_<field>` for every named field.
///
/// # Example
///
/// ```
/// use dmamem_setters_derive::Setters;
///
/// #[derive(Setters, Default)]
/// struct Limits {
///     pages: u64,
///     #[setters(non_const)]
///     label: String,
///     #[setters(skip)]
///     generation: u32,
/// }
///
/// const SMALL: Limits = Limits { pages: 0, label: String::new(), generation: 0 }.with_pages(4);
///
/// let mut l = Limits::default();
/// l.set_pages(8).set_label("pool".into());
/// assert_eq!(l.pages, 8);
/// assert_eq!(SMALL.pages, 4);
/// assert_eq!(Limits::default().with_label("x".into()).label, "x");
/// ```
#[proc_macro_derive(Setters, attributes(setters))]
pub fn derive_setters(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let ident = &input.ident;
    let fields = match &input.data {
        Data::Struct(s) => match &s.fields {
            Fields::Named(n) => &n.named,
            Fields::Unnamed(u) => {
                return Err(syn::Error::new(u.span(), "Setters requires named fields"));
            }
            Fields::Unit => {
                return Err(syn::Error::new(ident.span(), "Setters does not apply to unit structs"));
            }
        },
        _ => return Err(syn::Error::new(ident.span(), "Setters can only be derived for structs")),
    };

    let mut methods = Vec::new();
    for field in fields {
        let options = FieldOptions::parse(&field.attrs)?;
        if !options.skip {
            methods.push(setters_for(field, &options));
        }
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics #ident #ty_generics #where_clause {
            #(#methods)*
        }
    })
}

fn setters_for(field: &Field, options: &FieldOptions) -> proc_macro2::TokenStream {
    let Some(name) = &field.ident else {
        return proc_macro2::TokenStream::new();
    };
    let ty = &field.ty;
    let set_name = format_ident!("set_{}", name);
    let with_name = format_ident!("with_{}", name);
    let set_doc = format!("Set `{name}` in place.");
    let with_doc = format!("Return `self` with `{name}` replaced.");
    let constness = if options.non_const {
        quote!()
    } else {
        quote!(const)
    };

    quote! {
        #[doc = #set_doc]
        #[inline]
        pub fn #set_name(&mut self, value: #ty) -> &mut Self {
            self.#name = value;
            self
        }

        #[doc = #with_doc]
        #[inline]
        #[must_use]
        pub #constness fn #with_name(mut self, value: #ty) -> Self {
            self.#name = value;
            self
        }
    }
}

#[derive(Default)]
struct FieldOptions {
    skip: bool,
    non_const: bool,
}

impl FieldOptions {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut options = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("setters")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    options.skip = true;
                    Ok(())
                } else if meta.path.is_ident("non_const") {
                    options.non_const = true;
                    Ok(())
                } else {
                    Err(meta.error("expected `skip` or `non_const`"))
                }
            })?;
        }
        Ok(options)
    }
}
