//! 组卷引擎错误类型
//!
//! 错误分类原则：
//! - `Validation` / `NotFound` / `Ownership` 是调用方可预期的业务错误
//! - `PoolExhausted` 是组卷唯一的致命错误（科目题库完全为空）
//! - `Synthesis` 永远不会传播给调用方，替换搜索会静默降级为纯题库候选
//!
//! 槽位欠额（题库不足导致槽位少填）不是错误，只能通过检查生成结果的
//! 槽位长度观察到；需要提前感知缺口的调用方应使用资格校验器。

use thiserror::Error;

/// 组卷引擎错误
#[derive(Error, Debug)]
pub enum EngineError {
    /// 格式结构不合法（分值或数量为零、无章节等），入库前拒绝
    #[error("格式校验失败: {0}")]
    Validation(String),

    /// 未知的格式 ID / 槽位地址，或对调用者不可见的格式
    #[error("记录未找到: {entity} (id: {id})")]
    NotFound { entity: String, id: String },

    /// 非所有者修改或删除格式
    #[error("无权操作格式 {format_id} (请求者: {requester})")]
    Ownership { format_id: String, requester: String },

    /// 组卷开始时科目题库完全为空
    #[error("科目 {subject} 的题库为空，无法组卷")]
    PoolExhausted { subject: String },

    /// 出题协作方失败（超时、输出不合法等），非致命
    #[error("出题服务不可用: {0}")]
    Synthesis(String),
}

impl EngineError {
    /// 创建 NotFound 错误的便捷构造函数
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// 引擎结果类型别名
pub type Result<T> = std::result::Result<T, EngineError>;
