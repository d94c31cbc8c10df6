use crate::derive_utils::{apply_derives, has_serde_rename_all};
use crate::field_utils::{prepend_fields, take_field_options};
use crate::utils::{camel_case, default_kind};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Item, ItemStruct, LitStr, Result, Token, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[entity] 宏实现
/// - 在字段最前注入 `id` 与 `audit`
/// - 合并派生并统一 camelCase 序列化
/// - 生成 `::odata_domain::entity::Entity` 实现
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as EntityAttrConfig);
    let input = parse_macro_input!(item as Item);

    let st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[entity] only on struct")
                .to_compile_error()
                .into();
        }
    };

    match expand_struct(cfg, st) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

// 单个可变字段的生成信息
struct MutableField {
    ident: syn::Ident,
    ty: syn::Type,
    wire_name: String,
    requires_role: Option<LitStr>,
}

fn expand_struct(cfg: EntityAttrConfig, mut st: ItemStruct) -> Result<TokenStream2> {
    let vis = st.vis.clone();
    let fields_named = match &mut st.fields {
        syn::Fields::Named(f) => f,
        _ => {
            return Err(syn::Error::new(
                st.span(),
                "only supports named-field struct",
            ));
        }
    };

    // 收集可变字段并剥离 #[field(...)]
    let mut mutable = Vec::new();
    for field in fields_named.named.iter_mut() {
        let options = take_field_options(&mut field.attrs)?;
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        if let Some(rename) = &options.rename {
            field.attrs.push(syn::parse_quote!(#[serde(rename = #rename)]));
        }
        if options.skip {
            continue;
        }
        let wire_name = options
            .rename
            .as_ref()
            .map(LitStr::value)
            .unwrap_or_else(|| camel_case(&ident));
        mutable.push(MutableField {
            ident,
            ty: field.ty.clone(),
            wire_name,
            requires_role: options.requires_role,
        });
    }

    prepend_fields(
        fields_named,
        vec![
            syn::parse_quote! {
                #[serde(default)]
                #vis id: ::odata_domain::entity::EntityId
            },
            syn::parse_quote! {
                #[serde(flatten)]
                #vis audit: ::odata_domain::entity::AuditStamp
            },
        ],
    )?;

    apply_derives(
        &mut st.attrs,
        vec![
            syn::parse_quote!(Debug),
            syn::parse_quote!(Clone),
            syn::parse_quote!(serde::Serialize),
            syn::parse_quote!(serde::Deserialize),
        ],
    );
    if !has_serde_rename_all(&st.attrs) {
        st.attrs.push(syn::parse_quote!(#[serde(rename_all = "camelCase")]));
    }

    let kind = cfg
        .kind
        .unwrap_or_else(|| LitStr::new(&default_kind(&st.ident), st.ident.span()));

    let descriptors = mutable.iter().map(|f| {
        let ty = &f.ty;
        let name = LitStr::new(&f.wire_name, f.ident.span());
        let auth = match &f.requires_role {
            Some(role) => quote! { ::odata_domain::schema::AuthTag::RequiresRole(#role) },
            None => quote! { ::odata_domain::schema::AuthTag::None },
        };
        quote! {
            ::odata_domain::schema::FieldDescriptor::new(
                #name,
                <#ty as ::odata_domain::coercion::FieldCodec>::FIELD_TYPE,
                <#ty as ::odata_domain::coercion::FieldCodec>::NULLABLE,
                #auth,
            )
        }
    });

    let read_arms = mutable.iter().map(|f| {
        let ident = &f.ident;
        let ty = &f.ty;
        let name = &f.wire_name;
        quote! {
            #name => ::std::option::Option::Some(
                <#ty as ::odata_domain::coercion::FieldCodec>::encode(&self.#ident)
            )
        }
    });

    let write_arms = mutable.iter().map(|f| {
        let ident = &f.ident;
        let ty = &f.ty;
        let name = &f.wire_name;
        quote! {
            #name => {
                self.#ident = <#ty as ::odata_domain::coercion::FieldCodec>::decode(name, value)?;
                ::std::result::Result::Ok(())
            }
        }
    });

    let ident = &st.ident;
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    Ok(quote! {
        #st

        impl #impl_generics ::odata_domain::entity::Entity for #ident #ty_generics #where_clause {
            const KIND: &'static str = #kind;

            const DESCRIPTORS: &'static [::odata_domain::schema::FieldDescriptor] = &[
                #( #descriptors ),*
            ];

            fn id(&self) -> ::odata_domain::entity::EntityId { self.id }

            fn set_id(&mut self, id: ::odata_domain::entity::EntityId) { self.id = id; }

            fn audit(&self) -> &::odata_domain::entity::AuditStamp { &self.audit }

            fn audit_mut(&mut self) -> &mut ::odata_domain::entity::AuditStamp { &mut self.audit }

            fn read_field(
                &self,
                name: &str,
            ) -> ::std::option::Option<::odata_domain::coercion::FieldValue> {
                match name {
                    #( #read_arms, )*
                    _ => ::std::option::Option::None,
                }
            }

            #[allow(unreachable_code, unused_variables)]
            fn write_field(
                &mut self,
                name: &str,
                value: ::odata_domain::coercion::FieldValue,
            ) -> ::std::result::Result<(), ::odata_domain::error::CoercionError> {
                match name {
                    #( #write_arms )*
                    _ => ::std::result::Result::Err(
                        ::odata_domain::error::CoercionError::UnknownField {
                            field: name.to_string(),
                        },
                    ),
                }
            }
        }
    })
}

// -------- parsing --------

// #[entity(kind = "user")]
struct EntityAttrConfig {
    kind: Option<LitStr>,
}

impl Parse for EntityAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut kind: Option<LitStr> = None;

        let pairs: Punctuated<EntityAttrKv, Token![,]> =
            Punctuated::<EntityAttrKv, Token![,]>::parse_terminated(input)?;

        for kv in pairs {
            if kv.key != "kind" {
                return Err(syn::Error::new(
                    kv.key.span(),
                    "unknown key in attribute; expected 'kind'",
                ));
            }
            if kind.is_some() {
                return Err(syn::Error::new(
                    kv.key.span(),
                    "duplicate key 'kind' in attribute",
                ));
            }
            if kv.value.value().is_empty() {
                return Err(syn::Error::new(kv.value.span(), "'kind' must not be empty"));
            }
            kind = Some(kv.value);
        }

        Ok(Self { kind })
    }
}

struct EntityAttrKv {
    key: syn::Ident,
    value: LitStr,
}

impl Parse for EntityAttrKv {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: syn::Ident = input.parse()?;
        let _eq: Token![=] = input.parse()?;
        let value: LitStr = input.parse()?;
        Ok(Self { key, value })
    }
}
