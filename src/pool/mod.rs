//! 题库索引 - 外部存储边界
//!
//! 组卷核心只读取题库，从不写入。题库由外部并发写入，引擎不对其加锁，
//! 接受无隔离保证的读快照——组卷进行中提交的新题可见与否均属正常。

pub mod memory;

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

use crate::models::{PoolFilter, Question};

/// 题库只读索引
///
/// 契约：
/// - `query` 返回一次调用内枚举顺序稳定的快照，空结果是合法答案而非错误
/// - `count_by_marks` 是对当前题库状态的即时计算读（供资格校验使用），
///   永远不要用持久化的"是否全部提交"标志代替它
/// - 两个方法都不改变题库状态
#[async_trait]
pub trait QuestionPool: Send + Sync {
    /// 按条件查询题目，排除 `exclude` 中的 ID
    async fn query(&self, filter: &PoolFilter, exclude: &HashSet<String>) -> Vec<Question>;

    /// 统计科目下每个分值的题目数量
    async fn count_by_marks(&self, subject: &str) -> HashMap<u32, usize>;
}

pub use memory::InMemoryPool;
