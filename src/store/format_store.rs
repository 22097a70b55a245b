//! 格式存储 - 外部存储边界
//!
//! 格式模型只做纯描述的增删改查与结构校验，不做任何取题。
//! 所有权规则：仅创建者可更新 / 删除；`is_shared` 决定其他教师
//! 能否在组卷时复用该格式。

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::models::{PaperFormat, Section};

/// 创建格式时的输入
#[derive(Debug, Clone)]
pub struct FormatDraft {
    pub name: String,
    pub subject: String,
    pub total_marks: u32,
    /// 缺省为 "3 hours"
    pub duration: Option<String>,
    pub sections: Vec<Section>,
    pub is_shared: bool,
}

/// 更新格式时的输入，None 表示保持原值
#[derive(Debug, Clone, Default)]
pub struct FormatUpdate {
    pub name: Option<String>,
    pub total_marks: Option<u32>,
    pub duration: Option<String>,
    pub sections: Option<Vec<Section>>,
    pub is_shared: Option<bool>,
}

/// 格式存储接口
#[async_trait]
pub trait FormatStore: Send + Sync {
    /// 创建格式，入库前做结构校验
    async fn create(&self, draft: FormatDraft, requester: &str) -> Result<PaperFormat>;

    /// 按 ID 读取格式
    async fn get(&self, id: &str) -> Result<PaperFormat>;

    /// 更新格式；非所有者返回 Ownership 错误
    async fn update(&self, id: &str, update: FormatUpdate, requester: &str) -> Result<PaperFormat>;

    /// 删除格式；非所有者返回 Ownership 错误
    async fn delete(&self, id: &str, requester: &str) -> Result<()>;

    /// 列出请求者在某科目下可见的格式（自己的 ∪ 共享的），新建在前
    async fn list_by_subject(&self, subject: &str, requester: &str) -> Vec<PaperFormat>;
}

/// 内存格式存储（测试与演示）
#[derive(Debug, Default)]
pub struct InMemoryFormatStore {
    formats: RwLock<HashMap<String, PaperFormat>>,
}

impl InMemoryFormatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FormatStore for InMemoryFormatStore {
    async fn create(&self, draft: FormatDraft, requester: &str) -> Result<PaperFormat> {
        let format = PaperFormat {
            id: Uuid::new_v4().to_string(),
            name: draft.name,
            subject: draft.subject,
            created_by: requester.to_string(),
            total_marks: draft.total_marks,
            duration: draft.duration.unwrap_or_else(|| "3 hours".to_string()),
            sections: draft.sections,
            is_shared: draft.is_shared,
            created_at: Utc::now(),
        };
        format.validate()?;

        self.formats
            .write()
            .expect("格式存储锁中毒")
            .insert(format.id.clone(), format.clone());
        Ok(format)
    }

    async fn get(&self, id: &str) -> Result<PaperFormat> {
        self.formats
            .read()
            .expect("格式存储锁中毒")
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("格式", id))
    }

    async fn update(&self, id: &str, update: FormatUpdate, requester: &str) -> Result<PaperFormat> {
        let mut guard = self.formats.write().expect("格式存储锁中毒");
        let existing = guard
            .get(id)
            .ok_or_else(|| EngineError::not_found("格式", id))?;

        if existing.created_by != requester {
            return Err(EngineError::Ownership {
                format_id: id.to_string(),
                requester: requester.to_string(),
            });
        }

        let mut updated = existing.clone();
        if let Some(name) = update.name {
            updated.name = name;
        }
        if let Some(total_marks) = update.total_marks {
            updated.total_marks = total_marks;
        }
        if let Some(duration) = update.duration {
            updated.duration = duration;
        }
        if let Some(sections) = update.sections {
            updated.sections = sections;
        }
        if let Some(is_shared) = update.is_shared {
            updated.is_shared = is_shared;
        }
        updated.validate()?;

        guard.insert(id.to_string(), updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: &str, requester: &str) -> Result<()> {
        let mut guard = self.formats.write().expect("格式存储锁中毒");
        let existing = guard
            .get(id)
            .ok_or_else(|| EngineError::not_found("格式", id))?;

        if existing.created_by != requester {
            return Err(EngineError::Ownership {
                format_id: id.to_string(),
                requester: requester.to_string(),
            });
        }

        guard.remove(id);
        Ok(())
    }

    async fn list_by_subject(&self, subject: &str, requester: &str) -> Vec<PaperFormat> {
        let guard = self.formats.read().expect("格式存储锁中毒");
        let mut visible: Vec<PaperFormat> = guard
            .values()
            .filter(|f| f.subject == subject && (f.created_by == requester || f.is_shared))
            .cloned()
            .collect();
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionSlot;

    fn draft(name: &str, is_shared: bool) -> FormatDraft {
        FormatDraft {
            name: name.to_string(),
            subject: "操作系统".to_string(),
            total_marks: 20,
            duration: None,
            sections: vec![Section {
                name: "Group A".to_string(),
                description: None,
                total_marks: 20,
                slots: vec![QuestionSlot::simple(2, 10)],
            }],
            is_shared,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_defaults() {
        let store = InMemoryFormatStore::new();
        let format = store.create(draft("A 卷", false), "t01").await.unwrap();
        assert!(!format.id.is_empty());
        assert_eq!(format.duration, "3 hours");
        assert_eq!(format.created_by, "t01");
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_structure() {
        let store = InMemoryFormatStore::new();
        let mut bad = draft("坏格式", false);
        bad.sections[0].slots[0].count = 0;
        assert!(matches!(
            store.create(bad, "t01").await,
            Err(EngineError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_by_non_owner_fails() {
        let store = InMemoryFormatStore::new();
        let format = store.create(draft("A 卷", true), "t01").await.unwrap();

        let result = store
            .update(
                &format.id,
                FormatUpdate {
                    name: Some("改名".to_string()),
                    ..Default::default()
                },
                "t02",
            )
            .await;
        assert!(matches!(result, Err(EngineError::Ownership { .. })));
    }

    #[tokio::test]
    async fn test_delete_by_non_owner_fails() {
        let store = InMemoryFormatStore::new();
        let format = store.create(draft("A 卷", true), "t01").await.unwrap();

        assert!(matches!(
            store.delete(&format.id, "t02").await,
            Err(EngineError::Ownership { .. })
        ));
        assert!(store.delete(&format.id, "t01").await.is_ok());
        assert!(matches!(
            store.get(&format.id).await,
            Err(EngineError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_by_subject_returns_own_and_shared() {
        let store = InMemoryFormatStore::new();
        store.create(draft("自己的私有", false), "t01").await.unwrap();
        store.create(draft("别人的共享", true), "t02").await.unwrap();
        store.create(draft("别人的私有", false), "t02").await.unwrap();

        let visible = store.list_by_subject("操作系统", "t01").await;
        let names: Vec<&str> = visible.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(visible.len(), 2);
        assert!(names.contains(&"自己的私有"));
        assert!(names.contains(&"别人的共享"));
    }
}
