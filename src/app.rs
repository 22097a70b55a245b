//! 应用编排层
//!
//! 职责：
//! 1. 初始化各服务（题库、格式存储、组卷服务、替换解析器）
//! 2. 演示一次完整的组卷流程：资格查询 → 固定布局生成 → 定点替换
//!
//! 题目与格式由外部存储维护，这里用内存实现做种子数据演示。

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::models::{PoolFilter, Question};
use crate::pool::{InMemoryPool, QuestionPool};
use crate::services::{LayoutChoice, LlmSynthesis, PaperService, ReplacementResolver};
use crate::store::InMemoryFormatStore;
use crate::utils::logging;

/// 应用程序
pub struct App {
    config: Config,
    pool: Arc<InMemoryPool>,
    paper_service: PaperService,
    replacement: ReplacementResolver,
}

impl App {
    /// 初始化应用程序
    ///
    /// # 参数
    /// - `config`: 程序配置
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup();

        let pool = Arc::new(InMemoryPool::new());
        let formats = Arc::new(InMemoryFormatStore::new());

        let paper_service = PaperService::new(
            pool.clone() as Arc<dyn QuestionPool>,
            formats,
        );

        let mut replacement = ReplacementResolver::new(pool.clone() as Arc<dyn QuestionPool>);
        if config.synthesis_enabled && !config.llm_api_key.is_empty() {
            info!("✅ 出题协作方已启用 (模型: {})", config.llm_model_name);
            replacement = replacement.with_synthesis(
                Arc::new(LlmSynthesis::new(&config)),
                config.synthesis_count,
            );
        } else {
            info!("ℹ️ 出题协作方未启用，替换候选仅来自题库");
        }

        Ok(Self {
            config,
            pool,
            paper_service,
            replacement,
        })
    }

    /// 运行演示流程
    pub async fn run(&self) -> Result<()> {
        let subject = "操作系统";
        self.seed_demo_pool(subject);

        // 1. 资格查询
        let eligibility = self
            .paper_service
            .can_generate(subject, &LayoutChoice::Fixed, "demo")
            .await
            .context("资格查询失败")?;
        match &eligibility.reason {
            Some(reason) if !eligibility.can_generate => {
                warn!("[组卷 {}] 供给不足: {}", subject, reason)
            }
            _ => info!("[组卷 {}] 供给充足", subject),
        }

        // 2. 固定布局生成
        let paper = self
            .paper_service
            .generate(subject, LayoutChoice::Fixed, "demo")
            .await
            .context("组卷失败")?;
        logging::log_paper_summary(&paper);

        // 3. 对第一道题演示替换
        let target = paper
            .leaves()
            .next()
            .map(|leaf| (leaf.address, leaf.question.id.clone(), leaf.question.marks, leaf.question.module.clone()));
        if let Some((address, old_id, marks, module)) = target {
            let criteria = PoolFilter {
                subject: subject.to_string(),
                marks,
                module: Some(module),
                course_outcome: None,
                cognitive_level: None,
            };

            let candidates = self.replacement.search(&criteria, &old_id).await;
            info!(
                "替换候选 {} 道 (地址 {}, 原题 {})",
                candidates.len(),
                address,
                logging::truncate_text(&old_id, 20)
            );
            if let Some(chosen) = candidates.into_iter().next() {
                let updated = self.replacement.commit(paper, &address, chosen)?;
                logging::log_paper_summary(&updated);
            }
        }

        if self.config.verbose_logging {
            let supply = self.pool.count_by_marks(subject).await;
            info!("题库分值分布: {:?}", supply);
        }

        info!("✅ 演示流程完成");
        Ok(())
    }

    /// 填充演示题库：固定布局需要 10 道 2 分、3 道 3 分、9 道 5 分
    fn seed_demo_pool(&self, subject: &str) {
        let mut seeds = Vec::new();
        let mut push = |marks: u32, count: usize, module: &str| {
            for i in 0..count {
                seeds.push(Question {
                    id: format!("demo_{}_{}", marks, i),
                    text: format!("演示题目（{} 分，第 {} 道）", marks, i + 1),
                    marks,
                    subject: subject.to_string(),
                    contributor: "demo".to_string(),
                    module: module.to_string(),
                    course_outcome: format!("CO{}", i % 3 + 1),
                    cognitive_level: "K2".to_string(),
                    synthetic: false,
                });
            }
        };
        push(2, 12, "进程管理");
        push(3, 4, "内存管理");
        push(5, 10, "文件系统");
        self.pool.submit_all(seeds);
    }
}
