//! 替换解析器 - 业务能力层
//!
//! 让操作者把已分配的某一道题换成备选题，而不惊动试卷的其余部分。
//!
//! 搜索规则：分值匹配是唯一硬约束；模块 / 课程目标 / 认知层级只是
//! 排序提示，命中提示多的候选排在前面，但任何分值匹配的候选都不会
//! 被排除。候选列表可由出题协作方扩充，协作方失败静默降级为纯题库
//! 候选，绝不致命。
//!
//! 提交规则：只按生成时分配的稳定槽位地址寻址，其余分配保持原样。
//! 提交不会复查全卷的不重复不变量——人工替换允许有意引入重复，这是
//! 对软不变量的显式放宽，不是疏漏。

use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::models::{GeneratedPaper, PoolFilter, Question, SlotAddress};
use crate::pool::QuestionPool;
use crate::services::synthesis::SynthesisService;

/// 替换解析器
pub struct ReplacementResolver {
    pool: Arc<dyn QuestionPool>,
    synthesis: Option<Arc<dyn SynthesisService>>,
    synthesis_count: usize,
}

impl ReplacementResolver {
    /// 创建纯题库的替换解析器
    pub fn new(pool: Arc<dyn QuestionPool>) -> Self {
        Self {
            pool,
            synthesis: None,
            synthesis_count: 0,
        }
    }

    /// 附加出题协作方，候选列表会被扩充 `synthesis_count` 道合成题
    pub fn with_synthesis(
        mut self,
        synthesis: Arc<dyn SynthesisService>,
        synthesis_count: usize,
    ) -> Self {
        self.synthesis = Some(synthesis);
        self.synthesis_count = synthesis_count;
        self
    }

    /// 搜索替换候选
    ///
    /// 返回有序列表：题库候选按提示命中数降序（稳定排序），合成候选
    /// 追加在末尾。`exclude_id` 是被替换的题目，不出现在结果中。
    pub async fn search(&self, criteria: &PoolFilter, exclude_id: &str) -> Vec<Question> {
        let mut exclude = HashSet::new();
        exclude.insert(exclude_id.to_string());

        // 硬约束只有科目 + 分值，提示标签不参与过滤
        let mut candidates = self.pool.query(&criteria.hard_only(), &exclude).await;
        candidates.sort_by_key(|q| Reverse(criteria.hint_score(q)));

        debug!(
            "替换搜索 - 科目: {}, 分值: {}, 题库候选: {}",
            criteria.subject,
            criteria.marks,
            candidates.len()
        );

        if let Some(synthesis) = &self.synthesis {
            match synthesis.synthesize(criteria, self.synthesis_count).await {
                Ok(extra) => {
                    info!("出题协作方扩充了 {} 道合成候选", extra.len());
                    candidates.extend(extra);
                }
                Err(e) => {
                    // 非致命：降级为纯题库候选
                    let degraded = EngineError::Synthesis(e.to_string());
                    warn!("{}，候选列表降级为纯题库", degraded);
                }
            }
        }

        candidates
    }

    /// 提交替换
    ///
    /// 把 `address` 处的那一个题目引用换成 `chosen`，其余分配逐字节
    /// 保持不变。地址必须是生成时分配的稳定地址——从当前展示顺序重新
    /// 推算会让内容相同的兄弟题产生歧义。
    pub fn commit(
        &self,
        mut paper: GeneratedPaper,
        address: &SlotAddress,
        chosen: Question,
    ) -> Result<GeneratedPaper> {
        match paper.leaf_mut(address) {
            Some(leaf) => {
                info!(
                    "替换提交 - 地址 {}: {} -> {}",
                    address, leaf.question.id, chosen.id
                );
                leaf.question = chosen;
                Ok(paper)
            }
            None => Err(EngineError::not_found("槽位地址", address.to_string())),
        }
    }
}
