use syn::spanned::Spanned;
use syn::{Attribute, Field, FieldsNamed, LitStr, Result, Token, punctuated::Punctuated};

/// 把注入字段放到最前，其余字段保持原有相对顺序
///
/// 用户若已声明同名字段则报错，注入字段由宏独占。
pub(crate) fn prepend_fields(fields_named: &mut FieldsNamed, injected: Vec<Field>) -> Result<()> {
    for field in &fields_named.named {
        let clash = injected
            .iter()
            .any(|inj| inj.ident.is_some() && inj.ident == field.ident);
        if clash {
            return Err(syn::Error::new(
                field.span(),
                "field is generated by #[entity] and must not be declared",
            ));
        }
    }

    let mut new_named: Punctuated<Field, Token![,]> = injected.into_iter().collect();
    new_named.extend(fields_named.named.clone());
    fields_named.named = new_named;
    Ok(())
}

/// `#[field(...)]` 参数
#[derive(Default)]
pub(crate) struct FieldOptions {
    pub requires_role: Option<LitStr>,
    pub rename: Option<LitStr>,
    pub skip: bool,
}

/// 解析并移除字段上的 `#[field(...)]` 属性
pub(crate) fn take_field_options(attrs: &mut Vec<Attribute>) -> Result<FieldOptions> {
    let mut options = FieldOptions::default();
    let mut retained = Vec::with_capacity(attrs.len());

    for attr in attrs.drain(..) {
        if !attr.path().is_ident("field") {
            retained.push(attr);
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("requires_role") {
                if options.requires_role.is_some() {
                    return Err(meta.error("duplicate key 'requires_role' in attribute"));
                }
                options.requires_role = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("rename") {
                if options.rename.is_some() {
                    return Err(meta.error("duplicate key 'rename' in attribute"));
                }
                options.rename = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("skip") {
                options.skip = true;
            } else {
                return Err(meta.error("unknown key; expected 'requires_role' | 'rename' | 'skip'"));
            }
            Ok(())
        })?;
    }

    *attrs = retained;
    Ok(options)
}
