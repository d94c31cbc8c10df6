//! odata-macros
//!
//! 为 `odata-domain` 提供编译期生成字段描述符表的过程宏：
//! - `#[entity]`：为具名字段结构体注入 `id`/`audit` 字段，生成字段描述符表与字段读写；
//! - `#[enumeration]`：为单元枚举生成变体表与字段编解码。
//!
mod derive_utils;
mod entity;
mod enumeration;
mod field_utils;
mod utils;

use proc_macro::TokenStream;

/// 实体宏
///
/// - 在字段最前注入 `id: EntityId` 与 `#[serde(flatten)] audit: AuditStamp`；
/// - 合并派生 `Debug, Clone, serde::Serialize, serde::Deserialize`，字段以 camelCase 序列化；
/// - 实现 `::odata_domain::entity::Entity`（种类、字段描述符表、字段读写）；
/// - 参数：`#[entity(kind = "user")]`，缺省时取结构体名首字母小写；
/// - 字段参数：`#[field(requires_role = "Admin")]`、`#[field(rename = "zip")]`、`#[field(skip)]`。
///
/// ```ignore
/// #[entity(kind = "user")]
/// pub struct User {
///     pub first_name: String,
///     #[field(requires_role = "Admin")]
///     pub email: String,
///     pub phone: Option<String>,
/// }
/// ```
#[proc_macro_attribute]
pub fn entity(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity::expand(attr, item)
}

/// 枚举宏
///
/// 仅支持单元变体。派生 `Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize`，
/// 生成 `VARIANTS`、`as_str` 以及 `::odata_domain::coercion::FieldCodec` 实现，
/// 使枚举可直接作为实体字段类型。
#[proc_macro_attribute]
pub fn enumeration(attr: TokenStream, item: TokenStream) -> TokenStream {
    enumeration::expand(attr, item)
}
