//! 实体模式（schema）
//!
//! 字段描述符在编译期由 `#[entity]` 宏生成，运行期只读；
//! `SchemaRegistry` 在进程启动时汇总各实体种类的描述符与多对多关系。
//!
mod registry;

pub use registry::{RelationDescriptor, SchemaRegistry, SchemaRegistryBuilder};

use std::fmt;

/// 字段的语义类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Integer,
    Boolean,
    Timestamp,
    /// 枚举：规范的变体名称列表
    Enum(&'static [&'static str]),
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Integer => f.write_str("integer"),
            Self::Boolean => f.write_str("boolean"),
            Self::Timestamp => f.write_str("timestamp"),
            Self::Enum(variants) => write!(f, "enum({})", variants.join("|")),
        }
    }
}

/// 列级授权标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthTag {
    None,
    RequiresRole(&'static str),
}

impl AuthTag {
    pub const fn required_role(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::RequiresRole(role) => Some(*role),
        }
    }
}

/// 字段描述符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    /// 线上（wire）字段名，camelCase
    pub name: &'static str,
    pub field_type: FieldType,
    /// 是否允许显式 `null` 清空
    pub nullable: bool,
    pub auth: AuthTag,
}

impl FieldDescriptor {
    pub const fn new(
        name: &'static str,
        field_type: FieldType,
        nullable: bool,
        auth: AuthTag,
    ) -> Self {
        Self {
            name,
            field_type,
            nullable,
            auth,
        }
    }

    /// 字段名匹配（ASCII 大小写不敏感）
    pub fn matches(&self, key: &str) -> bool {
        self.name.eq_ignore_ascii_case(key)
    }
}

/// 在描述符列表中按名称（大小写不敏感）查找字段
pub fn find_field<'a>(
    descriptors: &'a [FieldDescriptor],
    key: &str,
) -> Option<&'a FieldDescriptor> {
    descriptors.iter().find(|d| d.matches(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[FieldDescriptor] = &[
        FieldDescriptor::new("firstName", FieldType::String, false, AuthTag::None),
        FieldDescriptor::new(
            "email",
            FieldType::String,
            false,
            AuthTag::RequiresRole("Admin"),
        ),
    ];

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(find_field(FIELDS, "EMAIL").map(|d| d.name), Some("email"));
        assert_eq!(
            find_field(FIELDS, "FirstName").map(|d| d.name),
            Some("firstName")
        );
        assert!(find_field(FIELDS, "first_name").is_none());
    }

    #[test]
    fn field_type_display() {
        assert_eq!(FieldType::Timestamp.to_string(), "timestamp");
        assert_eq!(
            FieldType::Enum(&["Home", "Work"]).to_string(),
            "enum(Home|Work)"
        );
    }

    #[test]
    fn auth_tag_exposes_required_role() {
        assert_eq!(FIELDS[1].auth.required_role(), Some("Admin"));
        assert_eq!(FIELDS[0].auth.required_role(), None);
    }
}
