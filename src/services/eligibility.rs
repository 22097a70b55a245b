//! 资格校验器 - 业务能力层
//!
//! 纯前置条件检查：题库的供给是否满足布局的最低需求。
//! 只读、无副作用、不取题，可以安全地反复轮询。
//!
//! 组卷本身从不因槽位欠额报错，需要提前感知缺口的调用方应在组卷前
//! 调用这里，而不是指望 generate 失败。

use std::collections::BTreeMap;

use crate::models::PaperFormat;
use crate::pool::QuestionPool;

/// 每个分值的最低需求
///
/// 内部用 BTreeMap 保证按分值升序枚举，"第一个未满足的分值档"因此
/// 是确定的。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demand {
    buckets: BTreeMap<u32, usize>,
}

impl Demand {
    /// 内置固定布局的需求：10 道 2 分、3 道 3 分、9 道 5 分
    ///
    /// 9 道 5 分 = B 章节 3 道 + C 章节 3 组 × 2 道。
    pub fn fixed() -> Self {
        let mut buckets = BTreeMap::new();
        buckets.insert(2, 10);
        buckets.insert(3, 3);
        buckets.insert(5, 9);
        Self { buckets }
    }

    /// 自定义格式隐含的需求
    ///
    /// 每个槽位对分值 v 的贡献 = count × 消耗 v 的子槽位个数（简单槽位
    /// 视作 1 个）。
    pub fn of_format(format: &PaperFormat) -> Self {
        let mut buckets: BTreeMap<u32, usize> = BTreeMap::new();
        for section in &format.sections {
            for slot in &section.slots {
                if slot.is_composite() {
                    for sub in &slot.sub_slots {
                        *buckets.entry(sub.marks).or_insert(0) += slot.count as usize;
                    }
                } else {
                    *buckets.entry(slot.marks).or_insert(0) += slot.count as usize;
                }
            }
        }
        Self { buckets }
    }

    /// 按分值升序枚举 (分值, 需求量)
    pub fn iter(&self) -> impl Iterator<Item = (u32, usize)> + '_ {
        self.buckets.iter().map(|(&marks, &need)| (marks, need))
    }
}

/// 资格校验结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eligibility {
    pub can_generate: bool,
    /// 不满足时给出第一个缺口，如 "need 9 of marks 5, have 6"
    pub reason: Option<String>,
}

impl Eligibility {
    fn ok() -> Self {
        Self {
            can_generate: true,
            reason: None,
        }
    }

    fn blocked(reason: String) -> Self {
        Self {
            can_generate: false,
            reason: Some(reason),
        }
    }
}

/// 资格校验器
pub struct EligibilityValidator;

impl EligibilityValidator {
    /// 判断题库供给是否满足需求
    ///
    /// 逐个分值档比较实际供给与需求，返回第一个未满足的档；全部满足
    /// 才返回 can_generate = true。
    pub async fn can_generate(
        pool: &dyn QuestionPool,
        subject: &str,
        demand: &Demand,
    ) -> Eligibility {
        if subject.trim().is_empty() {
            return Eligibility::blocked("subject is required".to_string());
        }

        let counts = pool.count_by_marks(subject).await;
        for (marks, need) in demand.iter() {
            let have = counts.get(&marks).copied().unwrap_or(0);
            if have < need {
                return Eligibility::blocked(format!(
                    "need {} of marks {}, have {}",
                    need, marks, have
                ));
            }
        }
        Eligibility::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Question, QuestionSlot, Section};
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

    #[test]
    fn test_fixed_demand_thresholds() {
        let demand = Demand::fixed();
        let buckets: Vec<(u32, usize)> = demand.iter().collect();
        assert_eq!(buckets, vec![(2, 10), (3, 3), (5, 9)]);
    }

    #[test]
    fn test_format_demand_counts_sub_slot_multiplicity() {
        let format = PaperFormat {
            id: "f1".to_string(),
            name: "f".to_string(),
            subject: "X".to_string(),
            created_by: "t01".to_string(),
            total_marks: 60,
            duration: "3 hours".to_string(),
            sections: vec![Section {
                name: "A".to_string(),
                description: None,
                total_marks: 60,
                slots: vec![
                    QuestionSlot::simple(2, 4),
                    // 每个实例消耗 2 道 5 分 + 1 道 3 分
                    QuestionSlot::composite(3, &[5, 5, 3]),
                ],
            }],
            is_shared: false,
            created_at: Utc::now(),
        };

        let demand = Demand::of_format(&format);
        let buckets: Vec<(u32, usize)> = demand.iter().collect();
        assert_eq!(buckets, vec![(2, 4), (3, 3), (5, 6)]);
    }

    #[tokio::test]
    async fn test_can_generate_true_when_every_bucket_met() {
        let pool = InMemoryPool::new();
        seed(&pool, 2, 10);
        seed(&pool, 3, 3);
        seed(&pool, 5, 9);

        let result = EligibilityValidator::can_generate(&pool, "X", &Demand::fixed()).await;
        assert!(result.can_generate);
        assert!(result.reason.is_none());
    }

    #[tokio::test]
    async fn test_can_generate_names_first_unmet_bucket() {
        let pool = InMemoryPool::new();
        seed(&pool, 2, 10);
        seed(&pool, 3, 3);
        seed(&pool, 5, 6);

        let result = EligibilityValidator::can_generate(&pool, "X", &Demand::fixed()).await;
        assert!(!result.can_generate);
        assert_eq!(
            result.reason.as_deref(),
            Some("need 9 of marks 5, have 6")
        );
    }

    #[tokio::test]
    async fn test_empty_pool_reports_reason_without_error() {
        let pool = InMemoryPool::new();
        let result = EligibilityValidator::can_generate(&pool, "Y", &Demand::fixed()).await;
        assert!(!result.can_generate);
        assert_eq!(
            result.reason.as_deref(),
            Some("need 10 of marks 2, have 0")
        );
    }

    #[tokio::test]
    async fn test_blank_subject_is_blocked() {
        let pool = InMemoryPool::new();
        let result = EligibilityValidator::can_generate(&pool, " ", &Demand::fixed()).await;
        assert!(!result.can_generate);
    }
}
