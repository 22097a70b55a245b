/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 是否启用出题协作方扩充替换候选
    pub synthesis_enabled: bool,
    /// 每次向出题协作方请求的候选数量
    pub synthesis_count: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            synthesis_enabled: false,
            synthesis_count: 10,
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-3.5-turbo".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            synthesis_enabled: std::env::var("SYNTHESIS_ENABLED").ok().and_then(|v| v.parse().ok()).unwrap_or(default.synthesis_enabled),
            synthesis_count: std::env::var("SYNTHESIS_COUNT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.synthesis_count),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
        }
    }
}
