//! 出题服务 - 业务能力层
//!
//! 替换候选列表的外部扩充来源：按给定条件请求若干道新产生的题目，
//! 每道都带 `synthetic` 标记。该协作方失败（超时、输出不合法）不是
//! 致命错误——调用方把失败当作零候选处理。
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（自定义端点与模型）

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{PoolFilter, Question};

/// 出题协作方接口
///
/// 实现方返回 Question 形态的新题记录；任何失败都以 Err 上抛，
/// 由替换解析器降级为纯题库候选。
#[async_trait]
pub trait SynthesisService: Send + Sync {
    async fn synthesize(&self, criteria: &PoolFilter, count: usize) -> Result<Vec<Question>>;
}

/// 基于 LLM 的出题实现
pub struct LlmSynthesis {
    client: Client<OpenAIConfig>,
    model_name: String,
}

/// LLM 返回的单道题目（要求严格 JSON 数组）
#[derive(Debug, Deserialize)]
struct SynthDraft {
    text: String,
    marks: u32,
    #[serde(default)]
    module: String,
    #[serde(default)]
    course_outcome: String,
    #[serde(default)]
    cognitive_level: String,
}

impl LlmSynthesis {
    /// 创建新的出题服务
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }

    /// 构建出题 prompt
    ///
    /// 返回 (user_message, system_message)
    fn build_messages(criteria: &PoolFilter, count: usize) -> (String, String) {
        let system_message = "You are an expert academic question paper generator. \
             Generate questions as imperative statements (e.g., 'Explain...', 'Describe...', \
             'Analyze...'). Return only valid JSON arrays with no additional text or markdown \
             formatting."
            .to_string();

        let module = criteria.module.as_deref().unwrap_or("General");
        let co = criteria.course_outcome.as_deref().unwrap_or("CO1");
        let k = criteria.cognitive_level.as_deref().unwrap_or("K2");

        let user_message = format!(
            r#"Generate {count} academic examination questions for the following criteria:

Subject: {subject}
Module: {module}
Course Outcome (CO): {co}
Bloom's Taxonomy Level (K): {k}
Marks: {marks}

Requirements:
1. Each question should be an imperative statement (not interrogative)
2. Questions should be academically rigorous and unambiguous
3. For {marks} marks questions, the complexity should be appropriate
4. Return ONLY a JSON array of questions in this exact format:
[
  {{
    "text": "Explain the concept...",
    "marks": {marks},
    "module": "{module}",
    "course_outcome": "{co}",
    "cognitive_level": "{k}"
  }}
]

Generate exactly {count} unique questions. Return ONLY the JSON array, no additional text."#,
            count = count,
            subject = criteria.subject,
            module = module,
            co = co,
            k = k,
            marks = criteria.marks,
        );

        (user_message, system_message)
    }

    /// 解析 LLM 响应
    ///
    /// 先剥掉可能出现的 markdown 代码块围栏，再按 JSON 数组解析；
    /// 分值与请求不符的条目直接丢弃。
    fn parse_response(response: &str, criteria: &PoolFilter) -> Result<Vec<Question>> {
        let fence = Regex::new(r"```(?:json)?\n?")?;
        let cleaned = fence.replace_all(response.trim(), "");

        let drafts: Vec<SynthDraft> = serde_json::from_str(cleaned.trim())?;
        if drafts.is_empty() {
            anyhow::bail!("出题服务返回了空数组");
        }

        let millis = Utc::now().timestamp_millis();
        let questions = drafts
            .into_iter()
            .enumerate()
            .filter(|(_, d)| d.marks == criteria.marks)
            .map(|(index, draft)| Question {
                id: format!("ai_{}_{}", millis, index),
                text: draft.text,
                marks: draft.marks,
                subject: criteria.subject.clone(),
                contributor: "ai".to_string(),
                module: draft.module,
                course_outcome: draft.course_outcome,
                cognitive_level: draft.cognitive_level,
                synthetic: true,
            })
            .collect();
        Ok(questions)
    }
}

#[async_trait]
impl SynthesisService for LlmSynthesis {
    async fn synthesize(&self, criteria: &PoolFilter, count: usize) -> Result<Vec<Question>> {
        debug!(
            "出题请求 - 科目: {}, 分值: {}, 数量: {}, 模型: {}",
            criteria.subject, criteria.marks, count, self.model_name
        );

        let (user_message, system_message) = Self::build_messages(criteria, count);

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(system_message)
            .build()?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(0.8)
            .max_tokens(2000u32)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("出题 API 调用失败: {}", e);
            anyhow::anyhow!("出题 API 调用失败: {}", e)
        })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("出题服务返回内容为空"))?;

        let questions = Self::parse_response(&content, criteria)?;
        debug!("出题成功，得到 {} 道合成题目", questions.len());
        Ok(questions)
    }
}
