use serde::{Deserialize, Serialize};

/// 题目
///
/// 题库中的最小单元，创建后不可变。`module` / `course_outcome` /
/// `cognitive_level` 是教学分类标签，组卷时只按 `subject` + `marks`
/// 硬约束取题，标签仅在替换搜索中用于排序。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// 题目唯一 ID（存储层分配的不透明字符串）
    pub id: String,
    /// 题干内容
    pub text: String,
    /// 分值（正整数，惯例上取 2 / 3 / 5 等固定小集合）
    pub marks: u32,
    /// 所属科目
    pub subject: String,
    /// 提交该题的教师 ID
    pub contributor: String,
    /// 所属模块
    pub module: String,
    /// 课程目标（CO）
    pub course_outcome: String,
    /// 认知层级（K 级）
    pub cognitive_level: String,
    /// 是否由出题协作方自动产生
    #[serde(default)]
    pub synthetic: bool,
}

/// 题库查询 / 替换搜索条件
///
/// `subject` 与 `marks` 是硬约束；三个可选标签在题库查询中用于收窄，
/// 在替换搜索中仅作为排序提示，不会把分值匹配的候选排除在外。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolFilter {
    pub subject: String,
    pub marks: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_outcome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cognitive_level: Option<String>,
}

impl PoolFilter {
    /// 只带硬约束（科目 + 分值）的条件
    pub fn by_marks(subject: impl Into<String>, marks: u32) -> Self {
        Self {
            subject: subject.into(),
            marks,
            ..Default::default()
        }
    }

    /// 去掉三个可选标签，仅保留硬约束
    pub fn hard_only(&self) -> Self {
        Self::by_marks(self.subject.clone(), self.marks)
    }

    /// 题目命中的提示标签个数（用于替换候选排序）
    pub fn hint_score(&self, question: &Question) -> usize {
        let mut score = 0;
        if self.module.as_deref() == Some(question.module.as_str()) {
            score += 1;
        }
        if self.course_outcome.as_deref() == Some(question.course_outcome.as_str()) {
            score += 1;
        }
        if self.cognitive_level.as_deref() == Some(question.cognitive_level.as_str()) {
            score += 1;
        }
        score
    }
}
