//! Procedural macros for preorder-label.
//!
//! `label!` checks a label literal at compile time, so constants written by
//! hand can never carry a malformed key into storage:
//!
//! ```ignore
//! use preorder_label::label;
//!
//! let intro = label!(b"\x80\x40");   // byte string
//! let guide = label!("80 7f 80");    // hex, whitespace ignored
//! let root = label!();               // the root label
//!
//! // label!(b"\x81")  -> error: label ends in continuation byte 0x81
//! ```

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{Ident, Lit, LitByteStr, Result};

use proc_macro_crate::{crate_name, FoundCrate};

/// Bit that marks a continuation byte.
const CONTINUATION_BIT: u8 = 0x01;

/// Parsed macro input: the label bytes and the span to report errors at.
struct LabelInput {
    bytes: Vec<u8>,
    span: Span,
}

impl Parse for LabelInput {
    fn parse(input: ParseStream) -> Result<Self> {
        if input.is_empty() {
            return Ok(Self {
                bytes: Vec::new(),
                span: Span::call_site(),
            });
        }

        let lit: Lit = input.parse()?;
        let span = lit.span();
        let bytes = match lit {
            Lit::ByteStr(lit) => lit.value(),
            Lit::Str(lit) => {
                let digits: String = lit.value().split_whitespace().collect();
                hex::decode(&digits)
                    .map_err(|e| syn::Error::new(span, format!("invalid hex label: {}", e)))?
            }
            _ => {
                return Err(syn::Error::new(
                    span,
                    "expected a byte string (b\"\\x80\") or a hex string (\"80\")",
                ));
            }
        };

        if !input.is_empty() {
            return Err(input.error("unexpected tokens after label literal"));
        }

        check_canonical(&bytes).map_err(|msg| syn::Error::new(span, msg))?;
        Ok(Self { bytes, span })
    }
}

/// Reject anything the runtime validator would reject.
///
/// Trailing NUL padding is an error too: a literal should be written in
/// canonical form.
fn check_canonical(bytes: &[u8]) -> std::result::Result<(), String> {
    if let Some(pos) = bytes.iter().position(|&b| b == 0) {
        return Err(format!("label contains a NUL byte at offset {}", pos));
    }
    match bytes.last() {
        Some(&last) if last & CONTINUATION_BIT != 0 => Err(format!(
            "label ends in continuation byte {:#04x}; the last byte must be even",
            last
        )),
        _ => Ok(()),
    }
}

// =============================================================================
// Crate path resolution
// =============================================================================

fn label_crate_path() -> TokenStream2 {
    match crate_name("preorder-label") {
        Ok(FoundCrate::Itself) => quote!(::preorder_label),
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Err(_) => quote!(::preorder_label),
    }
}

// =============================================================================
// Code generation
// =============================================================================

fn expand(input: &LabelInput, krate: &TokenStream2) -> TokenStream2 {
    if input.bytes.is_empty() {
        return quote! { #krate::PreorderLabel::root() };
    }
    let lit = LitByteStr::new(&input.bytes, input.span);
    quote! { #krate::PreorderLabel::from_static_unchecked(#lit) }
}

// =============================================================================
// Entry point
// =============================================================================

/// A `PreorderLabel` from a byte string or hex literal, validated at compile
/// time.
#[proc_macro]
pub fn label(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as LabelInput);
    expand(&input, &label_crate_path()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(tokens: TokenStream2) -> Result<LabelInput> {
        syn::parse2(tokens)
    }

    #[test]
    fn parses_byte_string() {
        let input = parse(quote!(b"\x7F\x80\x40")).unwrap();
        assert_eq!(input.bytes, vec![0x7F, 0x80, 0x40]);
    }

    #[test]
    fn parses_hex_with_whitespace() {
        let input = parse(quote!("7f 80 40")).unwrap();
        assert_eq!(input.bytes, vec![0x7F, 0x80, 0x40]);
    }

    #[test]
    fn empty_input_is_root() {
        let input = parse(quote!()).unwrap();
        assert!(input.bytes.is_empty());

        let code = expand(&input, &quote!(::preorder_label)).to_string();
        assert!(code.contains("root"));
    }

    #[test]
    fn rejects_non_canonical_literals() {
        let cases = [
            quote!(b"\x81"),
            quote!(b"\x80\x00"),
            quote!(b"\x00\x80"),
            quote!("8"),
            quote!("zz"),
            quote!(42),
            quote!(b"\x80" b"\x80"),
        ];
        for case in cases {
            let shown = case.to_string();
            assert!(parse(case).is_err(), "should reject: {}", shown);
        }
    }

    #[test]
    fn error_mentions_offending_byte() {
        let err = check_canonical(&[0x80, 0x7F]).unwrap_err();
        assert!(err.contains("0x7f"));
        let err = check_canonical(&[0x80, 0x00, 0x80]).unwrap_err();
        assert!(err.contains("offset 1"));
    }

    #[test]
    fn expansion_goes_through_unchecked_constructor() {
        let input = parse(quote!("8080")).unwrap();
        let code = expand(&input, &quote!(::preorder_label)).to_string();
        assert!(code.contains("from_static_unchecked"));
        assert!(code.contains("preorder_label"));
    }
}
