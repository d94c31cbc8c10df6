//! 选择性合并引擎
//!
//! 只把部分更新文档中出现的字段应用到实体的分离副本上：
//! 1. 文档键按字段描述符大小写不敏感匹配，未知键忽略；
//! 2. 授权检查覆盖全部匹配字段，任一拒绝则整个文档不生效；
//! 3. 强制转换全部匹配字段，任一失败则整个文档不生效；
//! 4. 全部通过后写入副本并返回。
//!
//! 引擎不查找实体也不持久化，实体解析与提交由调用方负责。
//!
use crate::authorization::{RoleSet, is_allowed};
use crate::coercion::{FieldValue, coerce};
use crate::entity::Entity;
use crate::error::MergeError;
use crate::patch::PatchDocument;
use crate::schema::{FieldDescriptor, SchemaRegistry};
use serde_json::Value;
use std::sync::Arc;

/// 字段变更，包含旧值与新值
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChanged<T> {
    pub old: T,
    pub new: T,
}

impl<T> FieldChanged<T> {
    pub fn new(old: T, new: T) -> Self {
        Self { old, new }
    }
}

/// 合并结果：新实体与实际发生变化的字段
#[derive(Debug, Clone)]
pub struct MergeOutcome<E> {
    pub entity: E,
    pub changed: Vec<(&'static str, FieldChanged<FieldValue>)>,
}

impl<E> MergeOutcome<E> {
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn changed_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.changed.iter().map(|(name, _)| *name)
    }
}

/// 选择性合并引擎
#[derive(Debug, Clone)]
pub struct MergeEngine {
    registry: Arc<SchemaRegistry>,
}

impl MergeEngine {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn merge<E: Entity>(
        &self,
        existing: &E,
        patch: &PatchDocument,
        roles: &RoleSet,
    ) -> Result<MergeOutcome<E>, MergeError> {
        if patch.id != existing.id() {
            return Err(MergeError::Validation {
                field: "id".to_string(),
                raw: Value::from(patch.id),
                reason: format!("document targets {} but entity is {}", patch.id, existing.id()),
            });
        }

        let descriptors = self
            .registry
            .describe(E::KIND)
            .map_err(|_| MergeError::UnknownKind {
                kind: E::KIND.to_string(),
            })?;

        let matched = match_fields(descriptors, patch)?;

        for (descriptor, _) in &matched {
            if !is_allowed(roles, descriptor) {
                return Err(MergeError::Forbidden {
                    field: descriptor.name.to_string(),
                    required_role: descriptor.auth.required_role().unwrap_or_default().to_string(),
                });
            }
        }

        let mut coerced = Vec::with_capacity(matched.len());
        for (descriptor, raw) in matched {
            let value = coerce(raw, descriptor).map_err(|err| MergeError::Validation {
                field: descriptor.name.to_string(),
                raw: raw.clone(),
                reason: err.to_string(),
            })?;
            coerced.push((descriptor, value));
        }

        let mut entity = existing.clone();
        let mut changed = Vec::new();
        for (descriptor, value) in coerced {
            let old = entity.read_field(descriptor.name).unwrap_or(FieldValue::Null);
            entity
                .write_field(descriptor.name, value.clone())
                .map_err(|err| MergeError::Validation {
                    field: descriptor.name.to_string(),
                    raw: value.to_json(),
                    reason: err.to_string(),
                })?;
            if old != value {
                changed.push((descriptor.name, FieldChanged::new(old, value)));
            }
        }

        Ok(MergeOutcome { entity, changed })
    }
}

// 按描述符顺序收集文档中出现的字段；同一字段出现多次视为无效文档
fn match_fields<'a>(
    descriptors: &'static [FieldDescriptor],
    patch: &'a PatchDocument,
) -> Result<Vec<(&'static FieldDescriptor, &'a Value)>, MergeError> {
    let mut matched = Vec::new();
    for descriptor in descriptors {
        let mut hits = patch
            .fields
            .iter()
            .filter(|(key, _)| descriptor.matches(key));
        let Some((_, raw)) = hits.next() else {
            continue;
        };
        if let Some((_, duplicate)) = hits.next() {
            return Err(MergeError::Validation {
                field: descriptor.name.to_string(),
                raw: duplicate.clone(),
                reason: "field supplied more than once".to_string(),
            });
        }
        matched.push((descriptor, raw));
    }
    Ok(matched)
}
