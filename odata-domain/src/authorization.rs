//! 字段级授权闸门
//!
//! 授权规则只依赖调用方的角色集合与字段描述符的授权标记，无状态。
//! 调用方身份由上层显式传入，不读取任何环境上下文。
//!
use crate::schema::{AuthTag, FieldDescriptor};
use crate::specification::Specification;
use bon::Builder;
use std::collections::BTreeSet;

/// 调用方持有的角色集合（精确匹配，区分大小写）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析逗号分隔的角色声明，例如 `"Admin, User"`
    pub fn from_claim(claim: &str) -> Self {
        claim
            .split(',')
            .map(str::trim)
            .filter(|role| !role.is_empty())
            .collect()
    }

    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    pub fn insert(&mut self, role: impl Into<String>) -> bool {
        self.0.insert(role.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for RoleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// 调用方身份
#[derive(Debug, Clone, Default, Builder)]
pub struct Caller {
    #[builder(into)]
    pub name: Option<String>,
    #[builder(default)]
    pub roles: RoleSet,
}

impl Caller {
    /// 匿名调用方，不持有任何角色
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// 审计戳使用的主体名称
    pub fn actor<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(fallback)
    }
}

/// 持有指定角色
#[derive(Debug, Clone, Copy)]
pub struct HasRole<'a>(pub &'a str);

impl Specification<RoleSet> for HasRole<'_> {
    fn is_satisfied_by(&self, roles: &RoleSet) -> bool {
        roles.contains(self.0)
    }
}

impl Specification<RoleSet> for AuthTag {
    fn is_satisfied_by(&self, roles: &RoleSet) -> bool {
        match self.required_role() {
            None => true,
            Some(role) => HasRole(role).is_satisfied_by(roles),
        }
    }
}

/// 调用方是否可以修改该字段
pub fn is_allowed(roles: &RoleSet, descriptor: &FieldDescriptor) -> bool {
    descriptor.auth.is_satisfied_by(roles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;

    const EMAIL: FieldDescriptor = FieldDescriptor::new(
        "email",
        FieldType::String,
        false,
        AuthTag::RequiresRole("Admin"),
    );
    const FIRST_NAME: FieldDescriptor =
        FieldDescriptor::new("firstName", FieldType::String, false, AuthTag::None);

    #[test]
    fn untagged_fields_are_always_allowed() {
        assert!(is_allowed(&RoleSet::new(), &FIRST_NAME));
    }

    #[test]
    fn tagged_fields_require_exact_role() {
        assert!(is_allowed(&RoleSet::from_claim("Admin"), &EMAIL));
        assert!(!is_allowed(&RoleSet::from_claim("User"), &EMAIL));
        assert!(!is_allowed(&RoleSet::from_claim("admin"), &EMAIL));
    }

    #[test]
    fn claim_parsing_trims_and_drops_empties() {
        let roles = RoleSet::from_claim(" Admin, ,User ,");
        assert_eq!(roles.iter().collect::<Vec<_>>(), vec!["Admin", "User"]);
        assert!(RoleSet::from_claim("").is_empty());
    }

    #[test]
    fn role_specs_compose() {
        let roles = RoleSet::from_claim("Auditor");
        let spec = HasRole("Admin").or(HasRole("Auditor"));
        assert!(spec.is_satisfied_by(&roles));
        assert!(!HasRole("Admin").and(HasRole("Auditor")).is_satisfied_by(&roles));
    }

    #[test]
    fn caller_actor_falls_back_when_anonymous() {
        let caller = Caller::builder()
            .name("alice")
            .roles(RoleSet::from_claim("Admin"))
            .build();
        assert_eq!(caller.actor("anonymous"), "alice");
        assert_eq!(Caller::anonymous().actor("anonymous"), "anonymous");
    }
}
