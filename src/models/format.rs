//! 试卷格式模型
//!
//! 格式只是"目标结构"的纯描述：章节有序排列，章节内槽位有序排列。
//! 格式本身不做任何取题，结构合法性在入库前由 `validate` 把关。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// 组合槽位中的子槽位，只携带分值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubSlot {
    pub marks: u32,
}

/// 题目槽位
///
/// `sub_slots` 非空时为组合槽位：`count` 个实例中的每一个按子槽位顺序
/// 各取一题（例如 5+3+2 的大题）；为空时为简单槽位：取 `count` 道同分值
/// 的独立题目。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSlot {
    pub marks: u32,
    pub count: u32,
    #[serde(default)]
    pub sub_slots: Vec<SubSlot>,
}

impl QuestionSlot {
    /// 简单槽位：count 道 marks 分的题
    pub fn simple(marks: u32, count: u32) -> Self {
        Self {
            marks,
            count,
            sub_slots: Vec::new(),
        }
    }

    /// 组合槽位：count 个实例，每个实例按 sub_marks 顺序各取一题
    pub fn composite(count: u32, sub_marks: &[u32]) -> Self {
        Self {
            marks: sub_marks.iter().sum(),
            count,
            sub_slots: sub_marks.iter().map(|&marks| SubSlot { marks }).collect(),
        }
    }

    pub fn is_composite(&self) -> bool {
        !self.sub_slots.is_empty()
    }
}

/// 格式中的章节
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// 章节总分（仅作展示参考，不参与取题约束）
    pub total_marks: u32,
    pub slots: Vec<QuestionSlot>,
}

/// 试卷格式
///
/// 仅所有者可更新或删除；`is_shared` 控制其他教师能否用它组卷。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperFormat {
    pub id: String,
    pub name: String,
    pub subject: String,
    /// 创建者（教师 ID）
    pub created_by: String,
    pub total_marks: u32,
    /// 考试时长（自由文本，如 "3 hours"）
    pub duration: String,
    pub sections: Vec<Section>,
    pub is_shared: bool,
    pub created_at: DateTime<Utc>,
}

impl PaperFormat {
    /// 结构合法性校验
    ///
    /// 入库（创建 / 更新）前调用，不合法即拒绝：
    /// - 名称非空
    /// - 至少一个章节，章节内至少一个槽位
    /// - 所有槽位 count >= 1，所有（子）槽位分值 >= 1
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(EngineError::Validation("格式名称不能为空".to_string()));
        }
        if self.sections.is_empty() {
            return Err(EngineError::Validation("格式至少需要一个章节".to_string()));
        }
        for section in &self.sections {
            if section.slots.is_empty() {
                return Err(EngineError::Validation(format!(
                    "章节 {} 至少需要一个槽位",
                    section.name
                )));
            }
            for slot in &section.slots {
                if slot.count == 0 {
                    return Err(EngineError::Validation(format!(
                        "章节 {} 存在数量为 0 的槽位",
                        section.name
                    )));
                }
                if slot.is_composite() {
                    if slot.sub_slots.iter().any(|sub| sub.marks == 0) {
                        return Err(EngineError::Validation(format!(
                            "章节 {} 存在分值为 0 的子槽位",
                            section.name
                        )));
                    }
                } else if slot.marks == 0 {
                    return Err(EngineError::Validation(format!(
                        "章节 {} 存在分值为 0 的槽位",
                        section.name
                    )));
                }
            }
        }
        Ok(())
    }
}
