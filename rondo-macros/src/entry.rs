use proc_macro2::TokenStream;
use quote::{ToTokens, quote, quote_spanned};
use syn::spanned::Spanned;

/// Expand `#[rondo::main]` / `#[rondo::test]` over an `async fn`.
///
/// The function keeps its signature minus `async`; its body becomes an async
/// block handed to `rondo::block_on`. On any parse error we still emit the
/// original item next to the error so IDE features keep working on the
/// unexpanded function.
pub(crate) fn expand(args: TokenStream, item: TokenStream, is_test: bool) -> TokenStream {
    let mut input: syn::ItemFn = match syn::parse2(item.clone()) {
        Ok(input) => input,
        Err(e) => return token_stream_with_error(item, e),
    };

    if let Err(e) = validate(&args, &input, is_test) {
        return token_stream_with_error(item, e);
    }

    input.sig.asyncness = None;

    let test_attr = if is_test {
        quote! { #[::core::prelude::v1::test] }
    } else {
        quote! {}
    };

    // Point type mismatches at the body rather than the generated plumbing.
    let body_span = input.block.span();
    let body = input.block;
    let driver = quote_spanned! {body_span=>
        {
            let body = async #body;
            rondo::block_on(body)
        }
    };

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    quote! {
        #(#attrs)*
        #test_attr
        #vis #sig #driver
    }
}

fn validate(args: &TokenStream, input: &syn::ItemFn, is_test: bool) -> syn::Result<()> {
    if !args.is_empty() {
        let which = if is_test { "rondo::test" } else { "rondo::main" };
        return Err(syn::Error::new_spanned(
            args.clone(),
            format!("#[{which}] takes no arguments; the runtime has a single flavor"),
        ));
    }

    if input.sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            input.sig.fn_token,
            "the `async` keyword is missing from the function declaration",
        ));
    }

    if !is_test && input.sig.ident == "main" && !input.sig.inputs.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.sig.ident,
            "the main function cannot accept arguments",
        ));
    }

    if is_test
        && let Some(attr) = input.attrs.iter().find(|attr| is_test_attribute(attr))
    {
        return Err(syn::Error::new_spanned(
            attr,
            "a second test attribute is supplied; remove it or reorder your attributes",
        ));
    }

    Ok(())
}

fn is_test_attribute(attr: &syn::Attribute) -> bool {
    let syn::Meta::Path(path) = &attr.meta else {
        return false;
    };
    path.segments
        .last()
        .is_some_and(|segment| segment.ident == "test")
        && path
            .segments
            .iter()
            .all(|segment| segment.arguments.is_none())
}

fn token_stream_with_error(mut tokens: TokenStream, error: syn::Error) -> TokenStream {
    error.into_compile_error().to_tokens(&mut tokens);
    tokens
}
