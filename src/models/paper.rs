//! 生成的试卷
//!
//! 试卷是组卷引擎产出的瞬态内存产物：选题引擎创建，替换解析器定点修改，
//! 渲染后即丢弃，核心不做任何持久化。

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::question::Question;

/// 试卷所依据的布局
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LayoutRef {
    /// 内置固定布局（A/B/C 三章节）
    Fixed,
    /// 操作者自定义格式
    Format { id: String },
}

/// 槽位地址
///
/// 在生成时一次性分配并随试卷不可变携带，替换提交只按它寻址。
/// 永远不要用当前展示顺序重新推算地址——同内容的兄弟题会导致歧义。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotAddress {
    /// 章节序号
    pub section: usize,
    /// 章节内槽位序号
    pub slot: usize,
    /// 组合槽位的实例序号（简单槽位恒为 0）
    pub instance: usize,
    /// 实例内子槽位序号 / 简单槽位内的位置
    pub position: usize,
}

impl SlotAddress {
    pub fn new(section: usize, slot: usize, instance: usize, position: usize) -> Self {
        Self {
            section,
            slot,
            instance,
            position,
        }
    }
}

impl fmt::Display for SlotAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "s{}-q{}-g{}-p{}",
            self.section, self.slot, self.instance, self.position
        )
    }
}

/// 已分配到槽位上的题目引用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedQuestion {
    pub address: SlotAddress,
    pub question: Question,
}

/// 组合槽位的一个实例
///
/// `positions` 与子槽位顺序对齐；穷尽放宽后题库仍无该分值题目时，
/// 对应位置保持 `None`（实例无论满填与否都会被追加）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeInstance {
    pub positions: Vec<Option<AssignedQuestion>>,
}

/// 槽位分配结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SlotAssignment {
    /// 简单槽位：题目列表（题库耗尽时可能短于 requested）
    Simple {
        marks: u32,
        requested: u32,
        picks: Vec<AssignedQuestion>,
    },
    /// 组合槽位：实例列表，每个实例按子槽位顺序对齐
    Composite {
        sub_marks: Vec<u32>,
        instances: Vec<CompositeInstance>,
    },
}

impl SlotAssignment {
    /// 该槽位实际分配到的题目数量（不含空位）
    pub fn assigned_count(&self) -> usize {
        match self {
            SlotAssignment::Simple { picks, .. } => picks.len(),
            SlotAssignment::Composite { instances, .. } => instances
                .iter()
                .map(|inst| inst.positions.iter().filter(|p| p.is_some()).count())
                .sum(),
        }
    }
}

/// 章节分配结果：章节元信息 + 有序槽位分配
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionAssignment {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub total_marks: u32,
    pub slots: Vec<SlotAssignment>,
}

/// 生成的试卷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPaper {
    pub subject: String,
    pub layout: LayoutRef,
    pub sections: Vec<SectionAssignment>,
}

impl GeneratedPaper {
    /// 遍历试卷中所有已分配的叶子
    pub fn leaves(&self) -> impl Iterator<Item = &AssignedQuestion> {
        self.sections.iter().flat_map(|section| {
            section.slots.iter().flat_map(|slot| {
                let leaves: Vec<&AssignedQuestion> = match slot {
                    SlotAssignment::Simple { picks, .. } => picks.iter().collect(),
                    SlotAssignment::Composite { instances, .. } => instances
                        .iter()
                        .flat_map(|inst| inst.positions.iter().flatten())
                        .collect(),
                };
                leaves
            })
        })
    }

    /// 按生成时分配的地址定位叶子（可变引用），供替换提交使用
    pub fn leaf_mut(&mut self, address: &SlotAddress) -> Option<&mut AssignedQuestion> {
        for section in &mut self.sections {
            for slot in &mut section.slots {
                match slot {
                    SlotAssignment::Simple { picks, .. } => {
                        for leaf in picks.iter_mut() {
                            if leaf.address == *address {
                                return Some(leaf);
                            }
                        }
                    }
                    SlotAssignment::Composite { instances, .. } => {
                        for inst in instances.iter_mut() {
                            for leaf in inst.positions.iter_mut().flatten() {
                                if leaf.address == *address {
                                    return Some(leaf);
                                }
                            }
                        }
                    }
                }
            }
        }
        None
    }

    /// 试卷中题目总数（不含空位）
    pub fn question_count(&self) -> usize {
        self.leaves().count()
    }
}
