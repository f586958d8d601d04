//! Variant Resolver
//!
//! 把扫到的码变成恰好一个要展示的问卷。选择是无状态的：每次扫码
//! 独立抽签，不提供会话亲和；回头客下次可能看到不同变体。

use rand::Rng;
use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::debug;

use crate::db::models::Questionnaire;
use crate::db::repository::{AssignmentRepository, QuestionnaireRepository, ScanCodeRepository};
use crate::utils::{AppError, AppResult};

/// 解析结果：要展示的问卷和产生它的分配
#[derive(Debug, Clone, serde::Serialize)]
pub struct ResolvedVariant {
    pub questionnaire: Questionnaire,
    #[serde(with = "crate::db::models::serde_helpers::record_id")]
    pub assignment_id: RecordId,
    #[serde(with = "crate::db::models::serde_helpers::record_id")]
    pub scan_code_id: RecordId,
    #[serde(with = "crate::db::models::serde_helpers::record_id")]
    pub dining_table_id: RecordId,
}

/// 加权随机选择：返回被选中元素的下标
///
/// 每个权重是未归一化的概率质量。在 [0, total) 上均匀抽一个值，
/// 选中第一个累积权重*超过*该值的元素。权重为 0 的元素不贡献质量，
/// 严格大于的判定保证它永远不会被选中 (仍可列出供审计)。
pub fn pick_weighted<R: Rng>(weights: &[i64], rng: &mut R) -> Option<usize> {
    let total: i64 = weights.iter().filter(|w| **w > 0).sum();
    if total <= 0 {
        return None;
    }

    let draw = rng.gen_range(0..total);
    let mut cumulative = 0i64;
    for (idx, weight) in weights.iter().enumerate() {
        if *weight <= 0 {
            continue;
        }
        cumulative += weight;
        if cumulative > draw {
            return Some(idx);
        }
    }
    None
}

#[derive(Clone)]
pub struct VariantResolver {
    assignments: AssignmentRepository,
    questionnaires: QuestionnaireRepository,
    scan_codes: ScanCodeRepository,
}

impl VariantResolver {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            assignments: AssignmentRepository::new(db.clone()),
            questionnaires: QuestionnaireRepository::new(db.clone()),
            scan_codes: ScanCodeRepository::new(db),
        }
    }

    /// 通过印刷的不透明值解析 (扫码端入口)
    pub async fn resolve_by_code(&self, code: &str) -> AppResult<ResolvedVariant> {
        let scan_code = self
            .scan_codes
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found("Unknown scan code"))?;
        let scan_code_id = scan_code
            .id
            .as_ref()
            .ok_or_else(|| AppError::internal("Scan code record without id"))?
            .to_string();
        self.resolve_for_scan(&scan_code_id).await
    }

    /// 解析一次扫码：激活分配 × 激活问卷，按权重随机选一
    ///
    /// 两个激活标记必须同时成立：已停用的问卷即使还挂着激活分配也
    /// 不得出现。候选集为空时返回 `NoActiveQuestionnaire` (顾客侧
    /// "暂无内容")；新传播且餐厅无既有分配的扫码会短暂处于该状态。
    pub async fn resolve_for_scan(&self, scan_code_id: &str) -> AppResult<ResolvedVariant> {
        let scan_code = self
            .scan_codes
            .find_by_id(scan_code_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Scan code {} not found", scan_code_id)))?;
        let scan_code_ref = scan_code
            .id
            .clone()
            .ok_or_else(|| AppError::internal("Scan code record without id"))?;

        let assignments = self
            .assignments
            .find_active_by_scan_code(&scan_code_ref)
            .await?;
        if assignments.is_empty() {
            return Err(AppError::NoActiveQuestionnaire(scan_code_id.to_string()));
        }

        // 过滤掉引用已停用问卷的分配
        let questionnaire_ids: Vec<RecordId> =
            assignments.iter().map(|a| a.questionnaire.clone()).collect();
        let active_questionnaires = self
            .questionnaires
            .find_active_by_ids(questionnaire_ids)
            .await?;

        let mut candidates: Vec<(&crate::db::models::Assignment, Questionnaire)> = Vec::new();
        for assignment in &assignments {
            if let Some(questionnaire) = active_questionnaires
                .iter()
                .find(|q| q.id.as_ref() == Some(&assignment.questionnaire))
            {
                candidates.push((assignment, questionnaire.clone()));
            }
        }

        if candidates.is_empty() {
            return Err(AppError::NoActiveQuestionnaire(scan_code_id.to_string()));
        }

        let weights: Vec<i64> = candidates.iter().map(|(a, _)| a.weight).collect();
        let picked = pick_weighted(&weights, &mut rand::thread_rng())
            .ok_or_else(|| AppError::NoActiveQuestionnaire(scan_code_id.to_string()))?;

        let (assignment, questionnaire) = candidates.swap_remove(picked);
        let assignment_id = assignment
            .id
            .clone()
            .ok_or_else(|| AppError::internal("Assignment record without id"))?;

        debug!(
            scan_code = %scan_code_id,
            assignment = %assignment_id,
            candidates = weights.len(),
            "Resolved variant for scan"
        );

        Ok(ResolvedVariant {
            questionnaire,
            assignment_id,
            scan_code_id: scan_code_ref,
            dining_table_id: scan_code.dining_table,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn empty_weights_pick_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(pick_weighted(&[], &mut rng), None);
    }

    #[test]
    fn all_zero_weights_pick_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(pick_weighted(&[0, 0, 0], &mut rng), None);
    }

    #[test]
    fn single_candidate_always_wins() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(pick_weighted(&[100], &mut rng), Some(0));
        }
    }

    #[test]
    fn zero_weight_entries_never_selected() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let picked = pick_weighted(&[0, 50, 0, 50], &mut rng).unwrap();
            assert!(picked == 1 || picked == 3);
        }
    }

    #[test]
    fn selection_frequency_tracks_weights() {
        // 50/50 两变体，10000 次抽签应落在 47%-53% 区间内
        let mut rng = StdRng::seed_from_u64(20240817);
        let mut counts = [0usize; 2];
        for _ in 0..10_000 {
            let picked = pick_weighted(&[50, 50], &mut rng).unwrap();
            counts[picked] += 1;
        }
        for count in counts {
            assert!(
                (4700..=5300).contains(&count),
                "selection count {count} outside tolerance"
            );
        }
    }

    #[test]
    fn skewed_weights_respected() {
        // 90/10 分布，10000 次抽签
        let mut rng = StdRng::seed_from_u64(99);
        let mut heavy = 0usize;
        for _ in 0..10_000 {
            if pick_weighted(&[90, 10], &mut rng).unwrap() == 0 {
                heavy += 1;
            }
        }
        assert!(
            (8700..=9300).contains(&heavy),
            "heavy variant picked {heavy} times"
        );
    }
}
