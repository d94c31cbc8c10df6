//! 实体模式注册表
//!
//! 进程启动时通过构建器一次性注册，构建完成后只读，可放入 `Arc` 在请求间共享。
//!
use super::{FieldDescriptor, find_field};
use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use std::collections::BTreeMap;

/// 多对多关系定义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationDescriptor {
    pub name: &'static str,
    pub left: &'static str,
    pub right: &'static str,
}

impl RelationDescriptor {
    /// 两个种类是否构成该关系（顺序无关）
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.left == a && self.right == b) || (self.left == b && self.right == a)
    }
}

/// 实体模式注册表
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    kinds: BTreeMap<&'static str, &'static [FieldDescriptor]>,
    // 集合名（entity set）到种类的映射
    collections: BTreeMap<&'static str, &'static str>,
    relations: Vec<RelationDescriptor>,
}

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    /// 返回种类的有序字段描述符
    pub fn describe(&self, kind: &str) -> DomainResult<&'static [FieldDescriptor]> {
        let kind = self.canonical_kind(kind)?;
        Ok(self.kinds[kind])
    }

    /// 将（大小写不敏感的）种类名解析为注册时的规范名称
    pub fn canonical_kind(&self, kind: &str) -> DomainResult<&'static str> {
        self.kinds
            .keys()
            .copied()
            .find(|k| k.eq_ignore_ascii_case(kind))
            .ok_or_else(|| DomainError::UnknownKind {
                kind: kind.to_string(),
            })
    }

    /// 将集合名（如 `Addresses`）解析为种类；未登记集合名时按种类名解析
    pub fn kind_for_collection(&self, collection: &str) -> DomainResult<&'static str> {
        self.collections
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(collection))
            .map(|(_, kind)| *kind)
            .map_or_else(|| self.canonical_kind(collection), Ok)
    }

    /// 查找字段描述符
    pub fn field(&self, kind: &str, name: &str) -> DomainResult<Option<&'static FieldDescriptor>> {
        Ok(find_field(self.describe(kind)?, name))
    }

    /// 查找连接两个种类的关系
    pub fn relation_between(&self, a: &str, b: &str) -> Option<&RelationDescriptor> {
        self.relations.iter().find(|r| r.connects(a, b))
    }

    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.kinds.keys().copied()
    }

    pub fn relations(&self) -> &[RelationDescriptor] {
        &self.relations
    }
}

/// 注册表构建器
#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    kinds: BTreeMap<&'static str, &'static [FieldDescriptor]>,
    collections: BTreeMap<&'static str, &'static str>,
    relations: Vec<RelationDescriptor>,
}

impl SchemaRegistryBuilder {
    /// 注册实体种类
    pub fn entity<E: Entity>(mut self) -> Self {
        self.kinds.insert(E::KIND, E::DESCRIPTORS);
        self
    }

    /// 注册实体种类及其集合名
    pub fn collection<E: Entity>(mut self, name: &'static str) -> Self {
        self.collections.insert(name, E::KIND);
        self.entity::<E>()
    }

    /// 注册多对多关系
    pub fn relation(mut self, name: &'static str, left: &'static str, right: &'static str) -> Self {
        self.relations.push(RelationDescriptor { name, left, right });
        self
    }

    /// 校验关系两端均已注册后构建
    pub fn build(self) -> DomainResult<SchemaRegistry> {
        for relation in &self.relations {
            for kind in [relation.left, relation.right] {
                if !self.kinds.contains_key(kind) {
                    return Err(DomainError::UnknownKind {
                        kind: kind.to_string(),
                    });
                }
            }
        }

        Ok(SchemaRegistry {
            kinds: self.kinds,
            collections: self.collections,
            relations: self.relations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AuthTag, FieldType};
    use odata_macros::entity;

    #[entity(kind = "user")]
    struct User {
        first_name: String,
        #[field(requires_role = "Admin")]
        email: String,
    }

    #[entity(kind = "address")]
    struct Address {
        city: String,
    }

    fn registry() -> SchemaRegistry {
        SchemaRegistry::builder()
            .collection::<User>("Users")
            .entity::<Address>()
            .relation("addresses", "user", "address")
            .build()
            .unwrap()
    }

    #[test]
    fn describe_returns_ordered_descriptors() {
        let registry = registry();
        let fields = registry.describe("user").unwrap();
        let names: Vec<_> = fields.iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["firstName", "email"]);
        assert_eq!(fields[1].auth, AuthTag::RequiresRole("Admin"));
        assert_eq!(fields[0].field_type, FieldType::String);
    }

    #[test]
    fn describe_unknown_kind_fails() {
        let err = registry().describe("order").unwrap_err();
        match err {
            DomainError::UnknownKind { kind } => assert_eq!(kind, "order"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn kind_lookup_is_case_insensitive() {
        let registry = registry();
        assert_eq!(registry.canonical_kind("Users").ok(), None);
        assert_eq!(registry.canonical_kind("USER").unwrap(), "user");
        assert_eq!(
            registry.field("Address", "CITY").unwrap().map(|d| d.name),
            Some("city")
        );
    }

    #[test]
    fn collections_resolve_to_kinds() {
        let registry = registry();
        assert_eq!(registry.kind_for_collection("users").unwrap(), "user");
        assert_eq!(registry.kind_for_collection("Address").unwrap(), "address");
        assert!(registry.kind_for_collection("addresses").is_err());
    }

    #[test]
    fn relation_lookup_ignores_order() {
        let registry = registry();
        assert!(registry.relation_between("address", "user").is_some());
        assert!(registry.relation_between("user", "address").is_some());
        assert!(registry.relation_between("user", "user").is_none());
    }

    #[test]
    fn relation_to_unregistered_kind_is_rejected() {
        let err = SchemaRegistry::builder()
            .entity::<User>()
            .relation("addresses", "user", "address")
            .build()
            .unwrap_err();
        assert!(matches!(err, DomainError::UnknownKind { .. }));
    }
}
