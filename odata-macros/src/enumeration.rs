use crate::derive_utils::apply_derives;
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Fields, Item, LitStr, parse_macro_input};

/// #[enumeration] 宏实现
/// - 仅支持单元变体，变体名即线上名称
/// - 生成 `VARIANTS`/`as_str`/`Display` 与 `FieldCodec`
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return syn::Error::new(
            proc_macro2::Span::call_site(),
            "#[enumeration] takes no arguments",
        )
        .to_compile_error()
        .into();
    }

    let input = parse_macro_input!(item as Item);
    let mut en = match input {
        Item::Enum(e) => e,
        other => {
            return syn::Error::new(other.span(), "#[enumeration] only on enum")
                .to_compile_error()
                .into();
        }
    };

    if en.variants.is_empty() {
        return syn::Error::new(en.span(), "#[enumeration] requires at least one variant")
            .to_compile_error()
            .into();
    }

    for v in &en.variants {
        if !matches!(v.fields, Fields::Unit) {
            return syn::Error::new(
                v.span(),
                "#[enumeration] supports only unit variants, e.g., Home",
            )
            .to_compile_error()
            .into();
        }
    }

    apply_derives(
        &mut en.attrs,
        vec![
            syn::parse_quote!(Debug),
            syn::parse_quote!(Clone),
            syn::parse_quote!(Copy),
            syn::parse_quote!(PartialEq),
            syn::parse_quote!(Eq),
            syn::parse_quote!(serde::Serialize),
            syn::parse_quote!(serde::Deserialize),
        ],
    );

    let ident = &en.ident;
    let names: Vec<LitStr> = en
        .variants
        .iter()
        .map(|v| LitStr::new(&v.ident.to_string(), v.ident.span()))
        .collect();
    let variants: Vec<&syn::Ident> = en.variants.iter().map(|v| &v.ident).collect();

    let out = quote! {
        #en

        impl #ident {
            /// 规范的变体名称
            pub const VARIANTS: &'static [&'static str] = &[ #( #names ),* ];

            pub fn as_str(&self) -> &'static str {
                match self {
                    #( Self::#variants => #names, )*
                }
            }
        }

        impl ::std::fmt::Display for #ident {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::odata_domain::coercion::FieldCodec for #ident {
            const FIELD_TYPE: ::odata_domain::schema::FieldType =
                ::odata_domain::schema::FieldType::Enum(Self::VARIANTS);

            fn encode(&self) -> ::odata_domain::coercion::FieldValue {
                ::odata_domain::coercion::FieldValue::Enum(self.as_str())
            }

            fn decode(
                field: &str,
                value: ::odata_domain::coercion::FieldValue,
            ) -> ::std::result::Result<Self, ::odata_domain::error::CoercionError> {
                ::odata_domain::coercion::decode_variant(
                    field,
                    value,
                    <Self as ::odata_domain::coercion::FieldCodec>::FIELD_TYPE,
                    &[ #( (#names, Self::#variants) ),* ],
                )
            }
        }
    };

    TokenStream::from(out)
}
