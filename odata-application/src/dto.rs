use serde::Serialize;

/// 数据传输对象（DTO）
///
/// - 作为应用层的输出载体，面向传输层序列化友好；
/// - 实体本身已按线上字段名序列化，可直接作为 DTO 返回。
pub trait Dto: Serialize + Send + Sync + 'static {}

impl<T> Dto for T where T: Serialize + Send + Sync + 'static {}
