use bon::Builder;

/// 应用服务选项
#[derive(Debug, Clone, Builder)]
pub struct ServiceOptions {
    /// 单个批量请求允许的最大文档数
    #[builder(default = 100)]
    pub max_batch_size: usize,
    /// 匿名调用方写入审计戳时使用的主体名
    #[builder(into, default = String::from("anonymous"))]
    pub fallback_actor: String,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ServiceOptions {
    /// 0 表示不限制
    pub fn check_batch(&self, len: usize) -> Result<(), crate::error::AppError> {
        if self.max_batch_size > 0 && len > self.max_batch_size {
            return Err(crate::error::AppError::BatchTooLarge {
                len,
                max: self.max_batch_size,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn defaults_and_limits() {
        let options = ServiceOptions::default();
        assert_eq!(options.max_batch_size, 100);
        assert_eq!(options.fallback_actor, "anonymous");

        let options = ServiceOptions::builder()
            .max_batch_size(2)
            .fallback_actor("system")
            .build();
        assert!(options.check_batch(2).is_ok());
        assert!(matches!(
            options.check_batch(3),
            Err(AppError::BatchTooLarge { len: 3, max: 2 })
        ));

        let unlimited = ServiceOptions::builder().max_batch_size(0).build();
        assert!(unlimited.check_batch(10_000).is_ok());
    }
}
