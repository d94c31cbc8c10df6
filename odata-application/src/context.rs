use bon::Builder;
use odata_domain::authorization::Caller;

/// 应用层上下文（Application Context）
///
/// 承载一次应用层调用（命令/查询）所需的横切信息：
/// - 调用方（`Caller`）：名称与角色集合，显式传入，不依赖线程环境；
/// - 关联标识（`correlation_id`）：用于日志串联同一请求的多条事件。
///
/// 典型用法：
/// ```rust
/// use odata_application::context::AppContext;
/// use odata_domain::authorization::{Caller, RoleSet};
///
/// let ctx = AppContext::builder()
///     .caller(
///         Caller::builder()
///             .name("alice")
///             .roles(RoleSet::from_claim("Admin,User"))
///             .build(),
///     )
///     .correlation_id("cor-123")
///     .build();
/// assert!(ctx.caller.roles.contains("Admin"));
/// ```
#[derive(Clone, Debug, Default, Builder)]
pub struct AppContext {
    /// 调用方身份；缺省为匿名、无角色
    #[builder(default)]
    pub caller: Caller,
    #[builder(into)]
    pub correlation_id: Option<String>,
}

impl AppContext {
    pub fn for_caller(caller: Caller) -> Self {
        Self {
            caller,
            correlation_id: None,
        }
    }

    /// 日志中使用的关联标识
    pub fn correlation(&self) -> &str {
        self.correlation_id.as_deref().unwrap_or("-")
    }
}
