//! 命令侧抽象：命令、命令处理器与命令总线
//!
use crate::{context::AppContext, error::AppError};
use async_trait::async_trait;

/// 写操作请求，会修改实体或关联
///
/// `NAME` 是稳定名称，用于日志与 `HandlerNotFound` 报错，不依赖 `type_name::<T>()`。
/// `Output` 是执行结果：批量命令需要把逐项结果交还给传输层，因此不限定为 `()`。
pub trait Command: Send + Sync + 'static {
    const NAME: &'static str;

    type Output: Send + 'static;
}

#[async_trait]
pub trait CommandHandler<C>: Send + Sync
where
    C: Command,
{
    async fn handle(&self, ctx: &AppContext, cmd: C) -> Result<C::Output, AppError>;
}

/// 按命令的具体类型路由到处理器
///
/// 带泛型方法，不能做成 trait object，以具体实现类型注入使用。
#[async_trait]
pub trait CommandBus: Send + Sync {
    async fn dispatch<C>(&self, ctx: &AppContext, cmd: C) -> Result<C::Output, AppError>
    where
        C: Command;
}
