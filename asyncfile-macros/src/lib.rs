use proc_macro::TokenStream;
use quote::quote;
use std::mem::replace;

use syn::parse::{Parse, ParseStream};
use syn::spanned::Spanned;
use syn::{parse_macro_input, parse_quote, Block, Error, ItemFn, Result};

/// Runs the annotated `async fn` on a fresh `asyncfile` runtime.
#[proc_macro_attribute]
pub fn main(args: TokenStream, input: TokenStream) -> TokenStream {
    if let Some(error) = reject_args(args) {
        return error;
    }
    let AsyncFn { item } = parse_macro_input!(input);
    let item = transform(item);
    quote!(#item).into()
}

/// Like [`main`], but also marks the function as a `#[test]`.
#[proc_macro_attribute]
pub fn test(args: TokenStream, input: TokenStream) -> TokenStream {
    if let Some(error) = reject_args(args) {
        return error;
    }
    let AsyncFn { item } = parse_macro_input!(input);
    let item = transform(item);
    quote!(#[test] #item).into()
}

fn reject_args(args: TokenStream) -> Option<TokenStream> {
    if args.is_empty() {
        return None;
    }
    let args = proc_macro2::TokenStream::from(args);
    let error = Error::new(args.span(), "this attribute does not take any arguments");
    Some(error.to_compile_error().into())
}

fn transform(mut item: ItemFn) -> ItemFn {
    let block = item.block.clone();
    let new_block: Block = parse_quote!({ ::asyncfile::block_on(async move #block) });
    let _ = replace(&mut item.block, Box::new(new_block));
    item.sig.asyncness = None;
    item
}

struct AsyncFn {
    item: ItemFn,
}

impl Parse for AsyncFn {
    fn parse(input: ParseStream) -> Result<Self> {
        let item: ItemFn = input.parse()?;
        if item.sig.asyncness.is_none() {
            return Err(Error::new(
                item.sig.span(),
                "expected an `async fn`. help: make this function `async`.",
            ));
        }
        Ok(AsyncFn { item })
    }
}
