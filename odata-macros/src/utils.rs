use syn::Ident;
use syn::ext::IdentExt;

/// snake_case 标识符转换为 camelCase 线上名称（去除 `r#` 前缀与首尾下划线）
pub(crate) fn camel_case(ident: &Ident) -> String {
    let raw = ident.unraw().to_string();
    let mut out = String::with_capacity(raw.len());
    let mut upper_next = false;
    for ch in raw.trim_matches('_').chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// 结构体名转换为默认实体种类：首字母小写
pub(crate) fn default_kind(ident: &Ident) -> String {
    let raw = ident.unraw().to_string();
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proc_macro2::Span;

    fn ident(s: &str) -> Ident {
        syn::parse_str(s).unwrap_or_else(|_| Ident::new(s, Span::call_site()))
    }

    #[test]
    fn snake_to_camel() {
        assert_eq!(camel_case(&ident("first_name")), "firstName");
        assert_eq!(camel_case(&ident("zip_code")), "zipCode");
        assert_eq!(camel_case(&ident("email")), "email");
        assert_eq!(camel_case(&ident("_private_field")), "privateField");
        assert_eq!(camel_case(&ident("r#type")), "type");
        assert_eq!(camel_case(&ident("address_type_2")), "addressType2");
    }

    #[test]
    fn kind_from_struct_name() {
        assert_eq!(default_kind(&ident("User")), "user");
        assert_eq!(default_kind(&ident("OrderLine")), "orderLine");
    }
}
