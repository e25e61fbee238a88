//! 要求 ID の採番と新規レコードの構築
//!
//! ストアの既存レコードからプレフィックスごとの次の連番を計算し、
//! ツール入力から完全な要求レコードを組み立てて永続化する。

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};

use super::{type_prefix, Priority, Requirement, RequirementStore, Status, ASSISTANT_AUTHOR};

/// `add_requirement` ツールの入力。
/// スキーマ上 `type` は必須だが、欠落時も FUNC として採番する
/// （未知タイプと同じ扱い。元システムの挙動を維持）。
#[derive(Debug, Clone, Deserialize)]
pub struct NewRequirement {
    #[serde(rename = "type", default)]
    pub rtype: Option<String>,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub rationale: Option<String>,
}

/// 要求 ID を採番し、新規レコードを構築・永続化するアロケータ。
pub struct RequirementAllocator {
    store: Arc<RequirementStore>,
    /// 採番の読み取り→書き込みを直列化するガード。
    /// ガードなしでは並行呼び出しが同じ連番を計算し ID が衝突する。
    alloc_lock: Mutex<()>,
}

impl RequirementAllocator {
    pub fn new(store: Arc<RequirementStore>) -> Self {
        Self {
            store,
            alloc_lock: Mutex::new(()),
        }
    }

    /// 新しい要求を採番・構築してストアに永続化し、完成したレコードを返す。
    pub fn allocate(&self, input: NewRequirement) -> Result<Requirement> {
        // 読み取り（get_all）から書き込み（add）までをロック区間に収める
        let _guard = self
            .alloc_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let rtype = input.rtype.unwrap_or_default();
        let prefix = type_prefix(&rtype);

        let existing = self.store.get_all()?;
        let next = next_suffix(&existing, prefix);
        // 999 を超えた場合は単純に桁が増える（オーバーフローエラーにはしない）
        let id = format!("{prefix}-{next:03}");

        debug!(
            prefix = prefix,
            next = next,
            existing_count = existing.len(),
            "Allocated requirement id"
        );

        let now = Utc::now();
        let requirement = Requirement {
            id,
            rtype,
            title: input.title,
            description: input.description,
            priority: input.priority,
            status: Status::Draft,
            category: input.category.unwrap_or_default(),
            rationale: input.rationale.unwrap_or_default(),
            dependencies: vec![],
            refines: vec![],
            tags: vec![],
            author: ASSISTANT_AUTHOR.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.store.add(&requirement)?;
        info!(
            id = %requirement.id,
            rtype = %requirement.rtype,
            priority = %requirement.priority,
            "Requirement persisted"
        );

        Ok(requirement)
    }
}

/// プレフィックスに一致する既存 ID の数値サフィックスの最大値 + 1 を返す。
/// 一致するレコードがなければ 1。数値として解釈できないサフィックスは無視する。
fn next_suffix(existing: &[Requirement], prefix: &str) -> u32 {
    existing
        .iter()
        .filter_map(|r| {
            r.id.strip_prefix(prefix)?
                .strip_prefix('-')?
                .parse::<u32>()
                .ok()
        })
        .max()
        .map_or(1, |max| max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seeded_allocator(ids: &[(&str, &str)]) -> (TempDir, RequirementAllocator) {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(RequirementStore::open_at(tmp.path().to_path_buf()).unwrap());

        let now = Utc::now();
        for (id, rtype) in ids {
            store
                .add(&Requirement {
                    id: id.to_string(),
                    rtype: rtype.to_string(),
                    title: format!("title for {id}"),
                    description: String::new(),
                    priority: Priority::Medium,
                    status: Status::Draft,
                    category: String::new(),
                    rationale: String::new(),
                    dependencies: vec![],
                    refines: vec![],
                    tags: vec![],
                    author: String::new(),
                    created_at: now,
                    updated_at: now,
                })
                .unwrap();
        }

        (tmp, RequirementAllocator::new(store))
    }

    fn input(rtype: Option<&str>) -> NewRequirement {
        NewRequirement {
            rtype: rtype.map(str::to_string),
            title: "Emergency stop".to_string(),
            description: "The system shall stop within 100ms".to_string(),
            priority: Priority::High,
            category: None,
            rationale: None,
        }
    }

    #[test]
    fn allocates_next_sequential_id() {
        let (_tmp, allocator) =
            seeded_allocator(&[("STK-001", "stakeholder"), ("STK-002", "stakeholder")]);

        let req = allocator.allocate(input(Some("stakeholder"))).unwrap();
        assert_eq!(req.id, "STK-003");
    }

    #[test]
    fn starts_at_one_for_empty_prefix() {
        let (_tmp, allocator) = seeded_allocator(&[("STK-001", "stakeholder")]);

        let req = allocator.allocate(input(Some("system"))).unwrap();
        assert_eq!(req.id, "SYS-001");
    }

    #[test]
    fn ignores_non_numeric_suffixes() {
        let (_tmp, allocator) = seeded_allocator(&[
            ("FUNC-abc", "system_functional"),
            ("FUNC-002", "system_functional"),
        ]);

        let req = allocator.allocate(input(Some("system_functional"))).unwrap();
        assert_eq!(req.id, "FUNC-003");
    }

    #[test]
    fn gaps_are_not_reused() {
        // 欠番があっても最大値 + 1 を採番する（再利用しない）
        let (_tmp, allocator) =
            seeded_allocator(&[("SYS-001", "system"), ("SYS-007", "system")]);

        let req = allocator.allocate(input(Some("system"))).unwrap();
        assert_eq!(req.id, "SYS-008");
    }

    #[test]
    fn unknown_type_allocates_func() {
        let (_tmp, allocator) = seeded_allocator(&[("FUNC-001", "system_functional")]);

        let req = allocator.allocate(input(Some("quality"))).unwrap();
        assert_eq!(req.id, "FUNC-002");
        assert_eq!(req.rtype, "quality");
    }

    #[test]
    fn missing_type_allocates_func() {
        let (_tmp, allocator) = seeded_allocator(&[]);

        let req = allocator.allocate(input(None)).unwrap();
        assert_eq!(req.id, "FUNC-001");
    }

    #[test]
    fn padding_widens_beyond_999() {
        let (_tmp, allocator) = seeded_allocator(&[("STK-999", "stakeholder")]);

        let req = allocator.allocate(input(Some("stakeholder"))).unwrap();
        assert_eq!(req.id, "STK-1000");
    }

    #[test]
    fn new_requirement_has_creation_defaults() {
        let (_tmp, allocator) = seeded_allocator(&[]);

        let mut full = input(Some("stakeholder"));
        full.category = Some("safety".to_string());
        full.rationale = Some("required by regulation".to_string());
        let req = allocator.allocate(full).unwrap();

        assert_eq!(req.status, Status::Draft);
        assert!(req.dependencies.is_empty());
        assert!(req.refines.is_empty());
        assert!(req.tags.is_empty());
        assert_eq!(req.created_at, req.updated_at);
        assert_eq!(req.author, ASSISTANT_AUTHOR);
        assert_eq!(req.category, "safety");
        assert_eq!(req.rationale, "required by regulation");
    }

    #[test]
    fn allocated_requirement_is_persisted() {
        let (_tmp, allocator) = seeded_allocator(&[]);

        let req = allocator.allocate(input(Some("system"))).unwrap();
        let loaded = allocator.store.get(&req.id).unwrap().unwrap();
        assert_eq!(loaded, req);
    }

    #[test]
    fn concurrent_allocations_never_collide() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(RequirementStore::open_at(tmp.path().to_path_buf()).unwrap());
        let allocator = Arc::new(RequirementAllocator::new(store.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let allocator = allocator.clone();
                std::thread::spawn(move || allocator.allocate(input(Some("system"))).unwrap().id)
            })
            .collect();

        let mut ids: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ids.sort();
        ids.dedup();
        // 8 並行呼び出しで 8 個の異なる ID が採番される
        assert_eq!(ids.len(), 8);
        assert_eq!(store.get_all().unwrap().len(), 8);
    }
}
