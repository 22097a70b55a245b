//! 组卷服务 - 编排入口
//!
//! 对外的生成入口：解析布局（内置固定布局或对调用者可见的自定义
//! 格式）→ 资格预检（仅作提示）→ 调用选题引擎。

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{EngineError, Result};
use crate::models::{GeneratedPaper, PaperFormat};
use crate::pool::QuestionPool;
use crate::services::eligibility::{Demand, Eligibility, EligibilityValidator};
use crate::services::selection::SelectionEngine;
use crate::store::FormatStore;

/// 组卷所依据的布局选择
#[derive(Debug, Clone)]
pub enum LayoutChoice {
    /// 内置固定布局
    Fixed,
    /// 指定格式 ID
    Format(String),
}

/// 组卷服务
pub struct PaperService {
    pool: Arc<dyn QuestionPool>,
    formats: Arc<dyn FormatStore>,
    engine: SelectionEngine,
}

impl PaperService {
    pub fn new(pool: Arc<dyn QuestionPool>, formats: Arc<dyn FormatStore>) -> Self {
        Self {
            pool,
            formats,
            engine: SelectionEngine::new(),
        }
    }

    /// 生成试卷
    ///
    /// - `LayoutChoice::Format(id)`：格式必须存在且对请求者可见
    ///   （自己创建的或共享的），否则返回 NotFound
    /// - 生成前先做资格预检；缺口只记录警告，组卷照常进行——欠额
    ///   以槽位少填的形式静默体现
    pub async fn generate(
        &self,
        subject: &str,
        layout: LayoutChoice,
        requester: &str,
    ) -> Result<GeneratedPaper> {
        match layout {
            LayoutChoice::Fixed => {
                self.advise(subject, &Demand::fixed()).await;
                self.engine.generate_fixed(subject, self.pool.as_ref()).await
            }
            LayoutChoice::Format(format_id) => {
                let format = self.resolve_format(&format_id, requester).await?;
                self.advise(subject, &Demand::of_format(&format)).await;
                self.engine
                    .generate_with_format(&format, subject, self.pool.as_ref())
                    .await
            }
        }
    }

    /// 资格查询（只读，可反复轮询）
    pub async fn can_generate(
        &self,
        subject: &str,
        layout: &LayoutChoice,
        requester: &str,
    ) -> Result<Eligibility> {
        let demand = match layout {
            LayoutChoice::Fixed => Demand::fixed(),
            LayoutChoice::Format(format_id) => {
                let format = self.resolve_format(format_id, requester).await?;
                Demand::of_format(&format)
            }
        };
        Ok(EligibilityValidator::can_generate(self.pool.as_ref(), subject, &demand).await)
    }

    /// 解析对请求者可见的格式：自己创建的或共享的
    async fn resolve_format(&self, format_id: &str, requester: &str) -> Result<PaperFormat> {
        let format = self.formats.get(format_id).await?;
        if format.created_by != requester && !format.is_shared {
            // 不可见等同于不存在，避免泄露他人私有格式
            return Err(EngineError::not_found("格式", format_id));
        }
        Ok(format)
    }

    /// 资格预检，仅作提示
    async fn advise(&self, subject: &str, demand: &Demand) {
        let eligibility =
            EligibilityValidator::can_generate(self.pool.as_ref(), subject, demand).await;
        match eligibility.reason {
            Some(reason) if !eligibility.can_generate => {
                warn!("[组卷 {}] 供给不足 ({})，欠额槽位将少填", subject, reason);
            }
            _ => info!("[组卷 {}] 资格预检通过", subject),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Question, QuestionSlot, Section};
    use crate::pool::InMemoryPool;
    use crate::store::{FormatDraft, InMemoryFormatStore};

    fn question(id: &str, marks: u32) -> Question {
        Question {
            id: id.to_string(),
            text: format!("题目 {}", id),
            marks,
            subject: "X".to_string(),
            contributor: "t01".to_string(),
            module: "M1".to_string(),
            course_outcome: "CO1".to_string(),
            cognitive_level: "K1".to_string(),
            synthetic: false,
        }
    }

    async fn service_with(pool: Arc<InMemoryPool>) -> (PaperService, Arc<InMemoryFormatStore>) {
        let formats = Arc::new(InMemoryFormatStore::new());
        (
            PaperService::new(pool, formats.clone()),
            formats,
        )
    }

    fn simple_draft(is_shared: bool) -> FormatDraft {
        FormatDraft {
            name: "单元测试格式".to_string(),
            subject: "X".to_string(),
            total_marks: 10,
            duration: None,
            sections: vec![Section {
                name: "S1".to_string(),
                description: None,
                total_marks: 10,
                slots: vec![QuestionSlot::simple(5, 2)],
            }],
            is_shared,
        }
    }

    #[tokio::test]
    async fn test_generate_with_unknown_format_fails() {
        let pool = Arc::new(InMemoryPool::new());
        pool.submit(question("a", 5));
        let (service, _) = service_with(pool).await;

        let result = service
            .generate("X", LayoutChoice::Format("missing".to_string()), "t01")
            .await;
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_generate_with_private_format_of_other_owner_fails() {
        let pool = Arc::new(InMemoryPool::new());
        pool.submit(question("a", 5));
        let (service, formats) = service_with(pool).await;
        let format = formats.create(simple_draft(false), "t01").await.unwrap();

        let result = service
            .generate("X", LayoutChoice::Format(format.id.clone()), "t02")
            .await;
        assert!(matches!(result, Err(EngineError::NotFound { .. })));

        // 共享后对其他教师可见
        let shared = formats.create(simple_draft(true), "t01").await.unwrap();
        assert!(service
            .generate("X", LayoutChoice::Format(shared.id), "t02")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_generate_proceeds_despite_shortfall_warning() {
        let pool = Arc::new(InMemoryPool::new());
        pool.submit(question("a", 5));
        let (service, formats) = service_with(pool).await;
        let format = formats.create(simple_draft(false), "t01").await.unwrap();

        // 需求 2 道 5 分，只有 1 道：预检不通过但组卷成功（复用补齐）
        let eligibility = service
            .can_generate("X", &LayoutChoice::Format(format.id.clone()), "t01")
            .await
            .unwrap();
        assert!(!eligibility.can_generate);

        let paper = service
            .generate("X", LayoutChoice::Format(format.id), "t01")
            .await
            .unwrap();
        assert_eq!(paper.question_count(), 2);
    }
}
