use odata_domain::bulk::BatchResult;
use odata_domain::entity::Entity;
use odata_domain::error::{DomainError, ErrorClass, LinkError, MergeError, StoreError};

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("domain: {0}")]
    Domain(#[from] DomainError),

    #[error("validation: {0}")]
    Validation(String),

    #[error("no {0} entities found")]
    EmptyCollection(&'static str),

    #[error("batch too large: len={len}, max={max}")]
    BatchTooLarge { len: usize, max: usize },

    #[error("handler not found: {0}")]
    HandlerNotFound(&'static str),

    #[error("handler already registered: command={command}")]
    AlreadyRegisteredCommand { command: &'static str },

    #[error("handler already registered: query={query}")]
    AlreadyRegisteredQuery { query: &'static str },

    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl From<MergeError> for AppError {
    fn from(err: MergeError) -> Self {
        Self::Domain(err.into())
    }
}

impl From<LinkError> for AppError {
    fn from(err: LinkError) -> Self {
        Self::Domain(err.into())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::Domain(err.into())
    }
}

impl AppError {
    /// 错误分类；总线装配类错误归为内部错误
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Domain(err) => err.class(),
            Self::EmptyCollection(_) => ErrorClass::NotFound,
            Self::Validation(_) | Self::BatchTooLarge { .. } => ErrorClass::BadRequest,
            Self::HandlerNotFound(_)
            | Self::AlreadyRegisteredCommand { .. }
            | Self::AlreadyRegisteredQuery { .. }
            | Self::TypeMismatch { .. } => ErrorClass::Internal,
        }
    }

    /// 传输层状态码
    pub fn status_code(&self) -> u16 {
        status_of(self.class())
    }
}

/// 批量结果的状态码：已提交为 200，否则取首个失败项（或存储失败）的分类
pub fn batch_status<E: Entity>(result: &BatchResult<E>) -> u16 {
    result.failure_class().map_or(200, status_of)
}

pub fn status_of(class: ErrorClass) -> u16 {
    match class {
        ErrorClass::NotFound => 404,
        ErrorClass::Forbidden => 403,
        ErrorClass::BadRequest => 400,
        ErrorClass::Conflict => 409,
        ErrorClass::Internal => 500,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odata_domain::entity::EntityRef;

    #[test]
    fn status_codes_follow_classification() {
        let user = EntityRef::new("user", 1);
        let address = EntityRef::new("address", 1);

        assert_eq!(AppError::from(DomainError::not_found(user)).status_code(), 404);
        assert_eq!(
            AppError::from(MergeError::Forbidden {
                field: "email".into(),
                required_role: "Admin".into(),
            })
            .status_code(),
            403
        );
        assert_eq!(
            AppError::from(LinkError::AlreadyLinked {
                left: address,
                right: user,
            })
            .status_code(),
            409
        );
        assert_eq!(AppError::from(StoreError::ForeignKey(user)).status_code(), 409);
        assert_eq!(AppError::BatchTooLarge { len: 3, max: 2 }.status_code(), 400);
        assert_eq!(AppError::HandlerNotFound("GetEntity").status_code(), 500);
        assert_eq!(AppError::EmptyCollection("user").status_code(), 404);
    }
}
