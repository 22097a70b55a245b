//! 选题引擎 - 组卷核心
//!
//! 把格式（或内置固定布局）+ 题库变成一张生成的试卷。
//!
//! 分配规则：
//! - 章节按声明顺序处理，章节内槽位按声明顺序处理；每个章节的选取在
//!   进入下一章节前已定稿并并入 `used_ids`，策略在槽位到达时即时应用，
//!   前后章节互不挤占
//! - 整个生成过程只维护一个 `used_ids` 工作集，作为显式累加器随分配
//!   过程传递，不允许被外层作用域的隐藏引用捕获
//! - 穷尽放宽：某分值已无未用题目时，仅允许本次选取从全库复用已用
//!   题目；全库也没有该分值时，组合位置留空、简单槽位少填
//! - 槽位欠额从不报错；唯一的错误是调用时科目题库完全为空
//! - 随机性：候选集做无偏均匀洗牌（Fisher–Yates），任何排列等概率；
//!   不保证同一题库下的重复调用可复现

use rand::seq::SliceRandom;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::models::{
    AssignedQuestion, CompositeInstance, GeneratedPaper, LayoutRef, PoolFilter, QuestionSlot,
    SectionAssignment, SlotAddress, SlotAssignment,
};
use crate::pool::QuestionPool;

/// 内置固定布局的 C 章节名义实例数
const FIXED_SECTION_C_NOMINAL: usize = 3;

/// 选题引擎
///
/// 每次 generate 调用独占自己的工作状态，跨并发调用没有共享可变状态。
#[derive(Debug, Default)]
pub struct SelectionEngine;

impl SelectionEngine {
    pub fn new() -> Self {
        Self
    }

    /// 按自定义格式组卷
    pub async fn generate_with_format(
        &self,
        format: &crate::models::PaperFormat,
        subject: &str,
        pool: &dyn QuestionPool,
    ) -> Result<GeneratedPaper> {
        self.ensure_pool_not_empty(subject, pool).await?;
        info!("[组卷 {}] 开始，使用格式 {}", subject, format.name);

        let mut used_ids: HashSet<String> = HashSet::new();
        let mut sections = Vec::with_capacity(format.sections.len());

        for (section_index, section) in format.sections.iter().enumerate() {
            let assignment = self
                .fill_section(
                    section_index,
                    &section.name,
                    section.description.clone(),
                    section.total_marks,
                    &section.slots,
                    subject,
                    pool,
                    &mut used_ids,
                )
                .await;
            sections.push(assignment);
        }

        let paper = GeneratedPaper {
            subject: subject.to_string(),
            layout: LayoutRef::Format {
                id: format.id.clone(),
            },
            sections,
        };
        info!(
            "[组卷 {}] 完成，共分配 {} 道题目",
            subject,
            paper.question_count()
        );
        Ok(paper)
    }

    /// 按内置固定布局组卷
    ///
    /// A 章节：10 道 2 分简单题；B 章节：3 组 [5,3,2] 组合题；
    /// C 章节：[5,5] 组合题，实例数 = min(3, 剩余 5 分供给 ÷ 2)，
    /// 余量配不出对时退回全库配对（复用由穷尽放宽兜底）。
    pub async fn generate_fixed(
        &self,
        subject: &str,
        pool: &dyn QuestionPool,
    ) -> Result<GeneratedPaper> {
        self.ensure_pool_not_empty(subject, pool).await?;
        info!("[组卷 {}] 开始，使用内置固定布局", subject);

        let mut used_ids: HashSet<String> = HashSet::new();
        let mut sections = Vec::with_capacity(3);

        let slots_a = [QuestionSlot::simple(2, 10)];
        sections.push(
            self.fill_section(
                0,
                "Group A",
                Some("Answer all questions".to_string()),
                20,
                &slots_a,
                subject,
                pool,
                &mut used_ids,
            )
            .await,
        );

        let slots_b = [QuestionSlot::composite(3, &[5, 3, 2])];
        sections.push(
            self.fill_section(
                1,
                "Group B",
                Some("Answer all questions".to_string()),
                30,
                &slots_b,
                subject,
                pool,
                &mut used_ids,
            )
            .await,
        );

        let instances = self.fixed_section_c_instances(subject, pool, &used_ids).await;
        if instances > 0 {
            let slots_c = [QuestionSlot::composite(instances as u32, &[5, 5])];
            sections.push(
                self.fill_section(
                    2,
                    "Group C",
                    Some("Answer all questions".to_string()),
                    30,
                    &slots_c,
                    subject,
                    pool,
                    &mut used_ids,
                )
                .await,
            );
        } else {
            // 全库没有任何 5 分题可配对：C 章节保留空的组合槽位
            warn!("[组卷 {}] 5 分题供给为零，C 章节为空", subject);
            sections.push(SectionAssignment {
                name: "Group C".to_string(),
                description: Some("Answer all questions".to_string()),
                total_marks: 30,
                slots: vec![SlotAssignment::Composite {
                    sub_marks: vec![5, 5],
                    instances: Vec::new(),
                }],
            });
        }

        let paper = GeneratedPaper {
            subject: subject.to_string(),
            layout: LayoutRef::Fixed,
            sections,
        };
        info!(
            "[组卷 {}] 完成，共分配 {} 道题目",
            subject,
            paper.question_count()
        );
        Ok(paper)
    }

    /// C 章节实例数：优先用未消耗的 5 分余量配对，配不出对时退回
    /// 全库配对（向上取整，缺的一半由穷尽放宽复用补齐）
    async fn fixed_section_c_instances(
        &self,
        subject: &str,
        pool: &dyn QuestionPool,
        used_ids: &HashSet<String>,
    ) -> usize {
        let filter = PoolFilter::by_marks(subject, 5);
        let remaining = pool.query(&filter, used_ids).await.len();
        let mut instances = (remaining / 2).min(FIXED_SECTION_C_NOMINAL);
        if instances == 0 {
            let full_supply = pool.query(&filter, &HashSet::new()).await.len();
            instances = ((full_supply + 1) / 2).min(FIXED_SECTION_C_NOMINAL);
            if instances > 0 {
                debug!(
                    "[组卷 {}] C 章节余量不足，退回全库配对 ({} 道 5 分题)",
                    subject, full_supply
                );
            }
        }
        instances
    }

    /// 组卷唯一的致命前置检查：科目题库完全为空
    async fn ensure_pool_not_empty(&self, subject: &str, pool: &dyn QuestionPool) -> Result<()> {
        let counts = pool.count_by_marks(subject).await;
        if counts.values().sum::<usize>() == 0 {
            return Err(EngineError::PoolExhausted {
                subject: subject.to_string(),
            });
        }
        Ok(())
    }

    /// 填充一个章节：槽位按声明顺序处理，选取即时并入 used_ids
    #[allow(clippy::too_many_arguments)]
    async fn fill_section(
        &self,
        section_index: usize,
        name: &str,
        description: Option<String>,
        total_marks: u32,
        slots: &[QuestionSlot],
        subject: &str,
        pool: &dyn QuestionPool,
        used_ids: &mut HashSet<String>,
    ) -> SectionAssignment {
        let mut assignments = Vec::with_capacity(slots.len());
        for (slot_index, slot) in slots.iter().enumerate() {
            let assignment = if slot.is_composite() {
                self.fill_composite(section_index, slot_index, slot, subject, pool, used_ids)
                    .await
            } else {
                self.fill_simple(section_index, slot_index, slot, subject, pool, used_ids)
                    .await
            };
            assignments.push(assignment);
        }
        debug!("[组卷 {}] 章节 {} 定稿", subject, name);
        SectionAssignment {
            name: name.to_string(),
            description,
            total_marks,
            slots: assignments,
        }
    }

    /// 填充简单槽位
    ///
    /// 未用候选洗牌后取前 count 道；不足部分从全库随机复用补齐；
    /// 全库该分值为零时槽位少填。
    async fn fill_simple(
        &self,
        section_index: usize,
        slot_index: usize,
        slot: &QuestionSlot,
        subject: &str,
        pool: &dyn QuestionPool,
        used_ids: &mut HashSet<String>,
    ) -> SlotAssignment {
        let filter = PoolFilter::by_marks(subject, slot.marks);
        let want = slot.count as usize;

        let mut fresh = pool.query(&filter, used_ids).await;
        {
            let mut rng = rand::thread_rng();
            fresh.shuffle(&mut rng);
        }

        let mut chosen = Vec::with_capacity(want);
        for question in fresh.into_iter().take(want) {
            used_ids.insert(question.id.clone());
            chosen.push(question);
        }

        if chosen.len() < want {
            let full = pool.query(&filter, &HashSet::new()).await;
            if full.is_empty() {
                warn!(
                    "[组卷 {}] {} 分题全库为空，槽位 s{}-q{} 少填 ({}/{})",
                    subject,
                    slot.marks,
                    section_index,
                    slot_index,
                    chosen.len(),
                    want
                );
            } else {
                warn!(
                    "[组卷 {}] {} 分题未用候选耗尽，槽位 s{}-q{} 复用已出题目",
                    subject, slot.marks, section_index, slot_index
                );
                while chosen.len() < want {
                    match Self::choose_random(&full) {
                        Some(question) => chosen.push(question),
                        None => break,
                    }
                }
            }
        }

        let picks = chosen
            .into_iter()
            .enumerate()
            .map(|(position, question)| AssignedQuestion {
                address: SlotAddress::new(section_index, slot_index, 0, position),
                question,
            })
            .collect();

        SlotAssignment::Simple {
            marks: slot.marks,
            requested: slot.count,
            picks,
        }
    }

    /// 填充组合槽位：每个实例按子槽位顺序各取一题，实例满填与否都追加
    async fn fill_composite(
        &self,
        section_index: usize,
        slot_index: usize,
        slot: &QuestionSlot,
        subject: &str,
        pool: &dyn QuestionPool,
        used_ids: &mut HashSet<String>,
    ) -> SlotAssignment {
        let sub_marks: Vec<u32> = slot.sub_slots.iter().map(|s| s.marks).collect();
        let mut instances = Vec::with_capacity(slot.count as usize);

        for instance_index in 0..slot.count as usize {
            let mut positions = Vec::with_capacity(sub_marks.len());
            for (position, &marks) in sub_marks.iter().enumerate() {
                let picked = self.pick_one(subject, marks, pool, used_ids).await;
                if picked.is_none() {
                    warn!(
                        "[组卷 {}] {} 分题全库为空，位置 s{}-q{}-g{}-p{} 留空",
                        subject, marks, section_index, slot_index, instance_index, position
                    );
                }
                positions.push(picked.map(|question| AssignedQuestion {
                    address: SlotAddress::new(section_index, slot_index, instance_index, position),
                    question,
                }));
            }
            instances.push(CompositeInstance { positions });
        }

        SlotAssignment::Composite {
            sub_marks,
            instances,
        }
    }

    /// 取一道指定分值的题目
    ///
    /// 先在排除 used_ids 的候选中均匀随机取一道并记入 used_ids；
    /// 未用候选为空时触发穷尽放宽，仅本次选取从全库复用（此时全库的
    /// 每道该分值题目必然都已在 used_ids 中）；全库也为空则返回 None。
    async fn pick_one(
        &self,
        subject: &str,
        marks: u32,
        pool: &dyn QuestionPool,
        used_ids: &mut HashSet<String>,
    ) -> Option<crate::models::Question> {
        let filter = PoolFilter::by_marks(subject, marks);

        let fresh = pool.query(&filter, used_ids).await;
        if let Some(question) = Self::choose_random(&fresh) {
            used_ids.insert(question.id.clone());
            return Some(question);
        }

        let full = pool.query(&filter, &HashSet::new()).await;
        Self::choose_random(&full)
    }

    /// 均匀随机取一道（rng 不跨越 await 点）
    fn choose_random(candidates: &[crate::models::Question]) -> Option<crate::models::Question> {
        let mut rng = rand::thread_rng();
        candidates.choose(&mut rng).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaperFormat, Question, Section};
    use crate::pool::InMemoryPool;
    use chrono::Utc;

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

    fn seed(pool: &InMemoryPool, marks: u32, count: usize) {
        for i in 0..count {
            pool.submit(question(&format!("m{}_{}", marks, i), marks));
        }
    }

    fn format_with(slots: Vec<QuestionSlot>) -> PaperFormat {
        PaperFormat {
            id: "f1".to_string(),
            name: "测试格式".to_string(),
            subject: "X".to_string(),
            created_by: "t01".to_string(),
            total_marks: 100,
            duration: "3 hours".to_string(),
            sections: vec![Section {
                name: "S1".to_string(),
                description: None,
                total_marks: 100,
                slots,
            }],
            is_shared: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_simple_slot_filled_without_duplicates_when_supply_suffices() {
        let pool = InMemoryPool::new();
        seed(&pool, 2, 12);

        let engine = SelectionEngine::new();
        let format = format_with(vec![QuestionSlot::simple(2, 10)]);
        let paper = engine
            .generate_with_format(&format, "X", &pool)
            .await
            .unwrap();

        assert_eq!(paper.question_count(), 10);
        let mut ids: Vec<String> = paper.leaves().map(|l| l.question.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10);
        assert!(paper.leaves().all(|l| l.question.marks == 2));
    }

    #[tokio::test]
    async fn test_simple_slot_reuses_when_supply_short() {
        let pool = InMemoryPool::new();
        seed(&pool, 2, 4);

        let engine = SelectionEngine::new();
        let format = format_with(vec![QuestionSlot::simple(2, 6)]);
        let paper = engine
            .generate_with_format(&format, "X", &pool)
            .await
            .unwrap();

        // 4 道不同 + 2 道复用，槽位仍然满额
        assert_eq!(paper.question_count(), 6);
    }

    #[tokio::test]
    async fn test_composite_position_left_empty_when_value_absent() {
        let pool = InMemoryPool::new();
        seed(&pool, 5, 2);
        // 全库没有 3 分题

        let engine = SelectionEngine::new();
        let format = format_with(vec![QuestionSlot::composite(2, &[5, 3])]);
        let paper = engine
            .generate_with_format(&format, "X", &pool)
            .await
            .unwrap();

        match &paper.sections[0].slots[0] {
            SlotAssignment::Composite { instances, .. } => {
                assert_eq!(instances.len(), 2);
                for inst in instances {
                    assert!(inst.positions[0].is_some());
                    assert!(inst.positions[1].is_none());
                }
            }
            _ => panic!("应为组合槽位"),
        }
    }

    #[tokio::test]
    async fn test_generate_fails_only_on_entirely_empty_pool() {
        let pool = InMemoryPool::new();
        let engine = SelectionEngine::new();
        let result = engine.generate_fixed("X", &pool).await;
        assert!(matches!(result, Err(EngineError::PoolExhausted { .. })));

        // 只要题库非空就不会报错，哪怕所有槽位都欠额
        seed(&pool, 7, 1);
        assert!(engine.generate_fixed("X", &pool).await.is_ok());
    }

    #[tokio::test]
    async fn test_addresses_are_unique_and_positional() {
        let pool = InMemoryPool::new();
        seed(&pool, 2, 10);
        seed(&pool, 5, 4);

        let engine = SelectionEngine::new();
        let format = format_with(vec![
            QuestionSlot::simple(2, 4),
            QuestionSlot::composite(2, &[5, 5]),
        ]);
        let paper = engine
            .generate_with_format(&format, "X", &pool)
            .await
            .unwrap();

        let mut addresses: Vec<String> =
            paper.leaves().map(|l| l.address.to_string()).collect();
        let total = addresses.len();
        addresses.sort();
        addresses.dedup();
        assert_eq!(addresses.len(), total);
    }
}
