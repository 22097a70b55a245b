//! 内存题库实现
//!
//! 供测试与演示使用。保持插入顺序，保证一次查询内的稳定枚举。

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::models::{PoolFilter, Question};
use crate::pool::QuestionPool;

/// 内存题库
#[derive(Debug, Default)]
pub struct InMemoryPool {
    questions: RwLock<Vec<Question>>,
}

impl InMemoryPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// 提交一道题目（模拟外部存储层的写入）
    pub fn submit(&self, question: Question) {
        self.questions
            .write()
            .expect("题库锁中毒")
            .push(question);
    }

    /// 批量提交
    pub fn submit_all(&self, questions: impl IntoIterator<Item = Question>) {
        let mut guard = self.questions.write().expect("题库锁中毒");
        guard.extend(questions);
    }

    fn matches(filter: &PoolFilter, question: &Question) -> bool {
        if question.subject != filter.subject || question.marks != filter.marks {
            return false;
        }
        if let Some(module) = &filter.module {
            if &question.module != module {
                return false;
            }
        }
        if let Some(co) = &filter.course_outcome {
            if &question.course_outcome != co {
                return false;
            }
        }
        if let Some(k) = &filter.cognitive_level {
            if &question.cognitive_level != k {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl QuestionPool for InMemoryPool {
    async fn query(&self, filter: &PoolFilter, exclude: &HashSet<String>) -> Vec<Question> {
        let guard = self.questions.read().expect("题库锁中毒");
        guard
            .iter()
            .filter(|q| Self::matches(filter, q) && !exclude.contains(&q.id))
            .cloned()
            .collect()
    }

    async fn count_by_marks(&self, subject: &str) -> HashMap<u32, usize> {
        let guard = self.questions.read().expect("题库锁中毒");
        let mut counts = HashMap::new();
        for q in guard.iter().filter(|q| q.subject == subject) {
            *counts.entry(q.marks).or_insert(0) += 1;
        }
        counts
    }
}
