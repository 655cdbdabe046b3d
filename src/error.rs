//! 错误类型定义

use thiserror::Error;

/// 行政区划参考数据加载错误
///
/// 参考数据在进程启动时构建一次，构建失败不可恢复。
/// 解析路径本身从不报错：抽取不到的字段一律退化为 `None`。
#[derive(Debug, Error)]
pub enum DataError {
    /// 数据不是合法 JSON
    #[error("failed to parse division data: {0}")]
    Parse(#[from] serde_json::Error),

    /// 数据为空或顶层不是省级映射
    #[error("division data is empty or not a province mapping")]
    Empty,
}
