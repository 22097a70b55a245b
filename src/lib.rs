//! # Paper Assembly
//!
//! 从题库组装考试试卷的引擎
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 模型层（Models）
//! - `models/` - 题目、格式、生成试卷的纯数据结构
//! - 槽位地址在生成时一次性分配，随试卷不可变携带
//!
//! ### ② 外部边界（Pool / Store）
//! - `pool/` - 题库只读索引，外部存储的查询边界
//! - `store/` - 格式存储，带所有权与共享规则的增删改查
//!
//! ### ③ 业务能力层（Services）
//! - `EligibilityValidator` - 资格校验能力（纯前置检查）
//! - `SelectionEngine` - 选题能力（组卷核心）
//! - `ReplacementResolver` - 替换能力（搜索 + 定点提交）
//! - `LlmSynthesis` - 出题能力（外部协作方，可失败）
//!
//! ### ④ 编排层（Orchestration）
//! - `PaperService` - 生成入口：布局解析 → 资格预检 → 选题
//! - `App` - 演示编排（初始化、运行）
//!
//! ## 生命周期
//!
//! 题目与格式由外部存储层创建和维护；生成的试卷由选题引擎创建、
//! 仅被替换解析器修改、渲染后即丢弃——核心不持久化任何试卷。

pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod pool;
pub mod services;
pub mod store;
pub mod utils;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{EngineError, Result};
pub use models::{
    AssignedQuestion, GeneratedPaper, LayoutRef, PaperFormat, PoolFilter, Question, QuestionSlot,
    Section, SlotAddress, SlotAssignment, SubSlot,
};
pub use pool::{InMemoryPool, QuestionPool};
pub use services::{
    Demand, Eligibility, EligibilityValidator, LayoutChoice, LlmSynthesis, PaperService,
    ReplacementResolver, SelectionEngine, SynthesisService,
};
pub use store::{FormatDraft, FormatStore, FormatUpdate, InMemoryFormatStore};
