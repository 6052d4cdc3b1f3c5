//! Derive and attribute macros backing the `#[next]` / `#[overrides]` interceptor
//! pattern used throughout `rtc-interceptor`.
//!
//! `#[derive(Interceptor)]` locates the field tagged `#[next]` on a struct and
//! implements `NextInterceptor` for it, giving the struct a typed handle onto
//! whatever it wraps. `#[interceptor]` is then applied to an inherent `impl`
//! block full of methods tagged `#[overrides]`; it turns that block into the
//! real `impl Interceptor for ...`, filling in every trait method the block
//! didn't override with a body that forwards to the wrapped interceptor.
//!
//! Splitting the two macros this way avoids ever emitting two `impl Interceptor`
//! blocks for the same type: the derive only ever touches `NextInterceptor`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Data, DeriveInput, Fields, ImplItem, ItemImpl, parse_macro_input, spanned::Spanned,
};

const TRAIT_METHODS: &[&str] = &[
    "handle_read",
    "poll_read",
    "handle_write",
    "poll_write",
    "handle_timeout",
    "poll_timeout",
    "bind_local_stream",
    "unbind_local_stream",
    "bind_remote_stream",
    "unbind_remote_stream",
    "close",
];

#[proc_macro_derive(Interceptor, attributes(next))]
pub fn derive_interceptor(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return syn::Error::new(
                    input.span(),
                    "#[derive(Interceptor)] requires named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new(input.span(), "#[derive(Interceptor)] only supports structs")
                .to_compile_error()
                .into();
        }
    };

    let next_field = fields
        .iter()
        .find(|f| f.attrs.iter().any(|a| a.path().is_ident("next")))
        .unwrap_or_else(|| {
            fields
                .iter()
                .find(|f| f.ident.as_ref().map(|i| i == "inner").unwrap_or(false))
                .expect("struct must have a field tagged #[next] (or named `inner`)")
        });
    let next_ident = next_field
        .ident
        .clone()
        .expect("#[next] field must be named");
    let next_ty = &next_field.ty;

    let expanded = quote! {
        impl #impl_generics crate::NextInterceptor for #name #ty_generics #where_clause {
            type Next = #next_ty;

            fn next_mut(&mut self) -> &mut Self::Next {
                &mut self.#next_ident
            }

            fn next_ref(&self) -> &Self::Next {
                &self.#next_ident
            }
        }
    };

    expanded.into()
}

/// Strips `#[overrides]` from an inherent impl block and turns it into the
/// type's `impl Interceptor`, synthesizing a forwarding body for every trait
/// method that wasn't overridden.
#[proc_macro_attribute]
pub fn interceptor(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut input = parse_macro_input!(item as ItemImpl);
    let self_ty = input.self_ty.clone();
    let (impl_generics, _ty_generics, where_clause) = input.generics.split_for_impl();

    let mut overridden = Vec::new();
    let mut leftover_items = Vec::new();

    for item in input.items.drain(..) {
        match item {
            ImplItem::Fn(mut method) => {
                let was_override = method
                    .attrs
                    .iter()
                    .any(|a| a.path().is_ident("overrides"));
                method.attrs.retain(|a| !a.path().is_ident("overrides"));
                if was_override || TRAIT_METHODS.contains(&method.sig.ident.to_string().as_str()) {
                    overridden.push(method);
                } else {
                    leftover_items.push(ImplItem::Fn(method));
                }
            }
            other => leftover_items.push(other),
        }
    }

    let overridden_names: Vec<String> =
        overridden.iter().map(|m| m.sig.ident.to_string()).collect();

    let mut default_methods = Vec::new();
    for name in TRAIT_METHODS {
        if overridden_names.iter().any(|o| o == name) {
            continue;
        }
        let ident = syn::Ident::new(name, proc_macro2::Span::call_site());
        let body = match *name {
            "handle_read" | "handle_write" => quote! {
                fn #ident(&mut self, msg: crate::TaggedPacket) -> Result<(), Self::Error> {
                    crate::NextInterceptor::next_mut(self).#ident(msg)
                }
            },
            "poll_read" | "poll_write" => quote! {
                fn #ident(&mut self) -> Option<crate::TaggedPacket> {
                    crate::NextInterceptor::next_mut(self).#ident()
                }
            },
            "handle_timeout" => quote! {
                fn #ident(&mut self, now: std::time::Instant) -> Result<(), Self::Error> {
                    crate::NextInterceptor::next_mut(self).#ident(now)
                }
            },
            "poll_timeout" => quote! {
                fn #ident(&mut self) -> Option<std::time::Instant> {
                    crate::NextInterceptor::next_mut(self).#ident()
                }
            },
            "bind_local_stream" | "unbind_local_stream" | "bind_remote_stream"
            | "unbind_remote_stream" => quote! {
                fn #ident(&mut self, info: &crate::stream_info::StreamInfo) {
                    crate::NextInterceptor::next_mut(self).#ident(info)
                }
            },
            "close" => quote! {
                fn #ident(&mut self) -> Result<(), Self::Error> {
                    crate::NextInterceptor::next_mut(self).#ident()
                }
            },
            _ => unreachable!("exhaustive over TRAIT_METHODS"),
        };
        default_methods.push(body);
    }

    let expanded = quote! {
        impl #impl_generics #self_ty #where_clause {
            #(#leftover_items)*
        }

        impl #impl_generics crate::Interceptor for #self_ty #where_clause {
            type Error = <<#self_ty as crate::NextInterceptor>::Next as crate::Interceptor>::Error;

            #(#overridden)*
            #(#default_methods)*
        }
    };

    expanded.into()
}
