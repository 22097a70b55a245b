use anyhow::Result;
/// 日志工具模块
///
/// 提供日志初始化与输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::{GeneratedPaper, SlotAssignment};

/// 初始化日志
///
/// 默认 info 级别，可用 RUST_LOG 覆盖；重复初始化安全。
pub fn init() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup() {
    info!("{}", "=".repeat(60));
    info!("🚀 组卷引擎启动");
    info!("{}", "=".repeat(60));
}

/// 输出试卷结构摘要
///
/// # 参数
/// - `paper`: 生成的试卷
pub fn log_paper_summary(paper: &GeneratedPaper) {
    info!("{}", "─".repeat(60));
    info!("📄 科目: {} | 题目总数: {}", paper.subject, paper.question_count());
    for section in &paper.sections {
        info!("  章节 {} ({} 分)", section.name, section.total_marks);
        for slot in &section.slots {
            match slot {
                SlotAssignment::Simple {
                    marks,
                    requested,
                    picks,
                } => {
                    info!("    简单槽位 {} 分 × {}/{}", marks, picks.len(), requested);
                }
                SlotAssignment::Composite {
                    sub_marks,
                    instances,
                } => {
                    let shape = sub_marks
                        .iter()
                        .map(|m| m.to_string())
                        .collect::<Vec<_>>()
                        .join("+");
                    info!("    组合槽位 [{}] × {} 实例", shape, instances.len());
                }
            }
        }
    }
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
