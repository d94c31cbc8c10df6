//! 查询侧抽象：查询、查询处理器与查询总线
//!
use crate::{context::AppContext, dto::Dto, error::AppError};
use async_trait::async_trait;

/// 只读请求，不改变实体或关联；结果类型为 [`Dto`](crate::dto::Dto)
pub trait Query: Send + Sync + 'static {
    /// 稳定名称
    const NAME: &'static str;

    type Dto: Dto;
}

#[async_trait]
pub trait QueryHandler<Q>: Send + Sync
where
    Q: Query,
{
    async fn handle(&self, ctx: &AppContext, q: Q) -> Result<Q::Dto, AppError>;
}

#[async_trait]
pub trait QueryBus: Send + Sync {
    /// 分发查询，返回该查询声明的 DTO
    async fn dispatch<Q>(&self, ctx: &AppContext, q: Q) -> Result<Q::Dto, AppError>
    where
        Q: Query;
}
