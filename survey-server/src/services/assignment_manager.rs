//! Assignment Manager
//!
//! 维护扫码与问卷之间的分配集合：
//!
//! - 手动单桌绑定 (`assign_single`) 执行"一桌一问卷"策略，已有激活
//!   分配时返回冲突。该策略只约束手动路径；批量和传播路径可以合法
//!   地产生多变体集合 (实验态)。
//! - 餐厅级批量分配 (`assign_to_restaurant`) 是尽力而为的幂等操作：
//!   已有分配的桌台跳过而不是失败，操作者可以在搭建新变体时安全地
//!   重复执行而不破坏既有实验状态。
//! - 扫码创建时的自动传播 (`provision_propagation`) 复制餐厅当前的
//!   (问卷, 权重) 组合到新扫码，让新印刷的码立即可扫，同时保持
//!   餐厅既有的 A/B 分布。作用域始终是显式传入的餐厅，不存在任何
//!   全局默认查找。

use std::collections::BTreeMap;

use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::info;

use crate::db::models::{Assignment, AssignmentCreate};
use crate::db::repository::{
    AssignmentRepository, DiningTableRepository, QuestionnaireRepository, RepoError,
    RestaurantRepository, ScanCodeRepository,
};
use crate::utils::validation::validate_weight;
use crate::utils::{AppError, AppResult};

/// 批量分配结果
#[derive(Debug, Clone, serde::Serialize)]
pub struct BulkAssignOutcome {
    pub assigned_count: usize,
    pub skipped_count: usize,
    /// 被跳过的桌台明细 (已有激活分配)
    pub skipped: Vec<SkippedTable>,
}

/// 批量分配中被跳过的桌台
#[derive(Debug, Clone, serde::Serialize)]
pub struct SkippedTable {
    #[serde(with = "crate::db::models::serde_helpers::record_id")]
    pub dining_table: RecordId,
    pub name: String,
}

#[derive(Clone)]
pub struct AssignmentManager {
    assignments: AssignmentRepository,
    scan_codes: ScanCodeRepository,
    tables: DiningTableRepository,
    questionnaires: QuestionnaireRepository,
    restaurants: RestaurantRepository,
}

impl AssignmentManager {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            assignments: AssignmentRepository::new(db.clone()),
            scan_codes: ScanCodeRepository::new(db.clone()),
            tables: DiningTableRepository::new(db.clone()),
            questionnaires: QuestionnaireRepository::new(db.clone()),
            restaurants: RestaurantRepository::new(db),
        }
    }

    /// 手动为单个扫码绑定问卷
    ///
    /// 扫码已有任何激活分配时返回 `Conflict`；并发竞争下由
    /// (scan_code, questionnaire) 唯一索引兜底，同样映射为 `Conflict`。
    pub async fn assign_single(
        &self,
        scan_code_id: &str,
        questionnaire_id: &str,
        weight: i64,
    ) -> AppResult<Assignment> {
        validate_weight(weight)?;

        let scan_code = self
            .scan_codes
            .find_by_id(scan_code_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Scan code {} not found", scan_code_id)))?;
        let questionnaire = self
            .questionnaires
            .find_by_id(questionnaire_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Questionnaire {} not found", questionnaire_id))
            })?;

        let scan_code_ref = scan_code
            .id
            .clone()
            .ok_or_else(|| AppError::internal("Scan code record without id"))?;

        let active = self
            .assignments
            .find_active_by_scan_code(&scan_code_ref)
            .await?;
        if !active.is_empty() {
            return Err(AppError::conflict(format!(
                "Scan code {} already has an active assignment",
                scan_code_id
            )));
        }

        let questionnaire_ref = questionnaire
            .id
            .ok_or_else(|| AppError::internal("Questionnaire record without id"))?;

        let created = self
            .assignments
            .create(AssignmentCreate {
                scan_code: scan_code_ref,
                questionnaire: questionnaire_ref,
                restaurant: scan_code.restaurant,
                weight,
            })
            .await?;

        info!(
            scan_code = %scan_code_id,
            questionnaire = %questionnaire_id,
            weight,
            "Assignment created"
        );

        Ok(created)
    }

    /// 为餐厅内所有有扫码的桌台批量分配问卷
    ///
    /// 桌台分两组：已有激活分配的跳过，没有的创建。只有当所有符合
    /// 条件的桌台都已有分配 (或根本没有可分配目标) 时才返回
    /// `AllAssigned`；否则返回计数和跳过明细。
    pub async fn assign_to_restaurant(
        &self,
        restaurant_id: &str,
        questionnaire_id: &str,
        weight: i64,
    ) -> AppResult<BulkAssignOutcome> {
        validate_weight(weight)?;

        let restaurant = self
            .restaurants
            .find_by_id(restaurant_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Restaurant {} not found", restaurant_id))
            })?;
        let questionnaire = self
            .questionnaires
            .find_by_id(questionnaire_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Questionnaire {} not found", questionnaire_id))
            })?;

        let restaurant_ref = restaurant
            .id
            .ok_or_else(|| AppError::internal("Restaurant record without id"))?;
        let questionnaire_ref = questionnaire
            .id
            .ok_or_else(|| AppError::internal("Questionnaire record without id"))?;

        let tables = self.tables.find_by_restaurant(restaurant_id).await?;

        let mut assigned_count = 0usize;
        let mut skipped = Vec::new();

        for table in tables {
            let Some(table_ref) = table.id.clone() else {
                continue;
            };
            // 没有扫码的桌台不参与分配
            let Some(scan_code) = self.scan_codes.find_by_table(&table_ref).await? else {
                continue;
            };
            let Some(scan_code_ref) = scan_code.id else {
                continue;
            };

            let active = self
                .assignments
                .find_active_by_scan_code(&scan_code_ref)
                .await?;
            if !active.is_empty() {
                skipped.push(SkippedTable {
                    dining_table: table_ref,
                    name: table.name,
                });
                continue;
            }

            // 并发竞争时另一个写入者可能刚好抢先；该桌台按跳过处理
            match self
                .assignments
                .create(AssignmentCreate {
                    scan_code: scan_code_ref,
                    questionnaire: questionnaire_ref.clone(),
                    restaurant: restaurant_ref.clone(),
                    weight,
                })
                .await
            {
                Ok(_) => assigned_count += 1,
                Err(RepoError::Duplicate(_)) => {
                    skipped.push(SkippedTable {
                        dining_table: table_ref,
                        name: table.name,
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }

        if assigned_count == 0 {
            return Err(AppError::AllAssigned(format!(
                "Every eligible table in restaurant {} already has an assignment",
                restaurant_id
            )));
        }

        info!(
            restaurant = %restaurant_id,
            questionnaire = %questionnaire_id,
            assigned = assigned_count,
            skipped = skipped.len(),
            "Bulk assignment completed"
        );

        Ok(BulkAssignOutcome {
            assigned_count,
            skipped_count: skipped.len(),
            skipped,
        })
    }

    /// 新扫码创建后的自动传播
    ///
    /// 取餐厅内*其余*扫码的激活分配中不同的 (问卷, 权重) 对，整套复制
    /// 到新扫码上。餐厅尚无任何分配时新扫码保持为空 (暂不可解析)。
    /// 整批写入在单事务内完成；同一扫码的并发传播由唯一索引保证幂等。
    pub async fn provision_propagation(
        &self,
        new_scan_code_id: &str,
        restaurant_id: &str,
    ) -> AppResult<Vec<Assignment>> {
        let scan_code = self
            .scan_codes
            .find_by_id(new_scan_code_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Scan code {} not found", new_scan_code_id))
            })?;
        let restaurant: RecordId = restaurant_id
            .parse()
            .map_err(|_| AppError::validation(format!("Invalid restaurant ID: {restaurant_id}")))?;

        let scan_code_ref = scan_code
            .id
            .ok_or_else(|| AppError::internal("Scan code record without id"))?;

        let existing = self
            .assignments
            .find_active_in_restaurant_excluding(&restaurant, &scan_code_ref)
            .await?;

        // 去重为 (questionnaire, weight) 对；BTreeMap 保证确定性顺序
        let mut mix: BTreeMap<String, (RecordId, i64)> = BTreeMap::new();
        for assignment in existing {
            let key = format!("{}|{}", assignment.questionnaire, assignment.weight);
            mix.entry(key)
                .or_insert((assignment.questionnaire, assignment.weight));
        }

        if mix.is_empty() {
            info!(
                scan_code = %new_scan_code_id,
                restaurant = %restaurant_id,
                "No existing assignments to propagate"
            );
            return Ok(Vec::new());
        }

        let batch: Vec<AssignmentCreate> = mix
            .into_values()
            .map(|(questionnaire, weight)| AssignmentCreate {
                scan_code: scan_code_ref.clone(),
                questionnaire,
                restaurant: restaurant.clone(),
                weight,
            })
            .collect();
        let propagated = batch.len();

        match self.assignments.create_many(batch).await {
            Ok(()) => {}
            // 并发传播已经写入同一组合：结果一致，按幂等处理
            Err(RepoError::Duplicate(_)) => {}
            Err(e) => return Err(e.into()),
        }

        info!(
            scan_code = %new_scan_code_id,
            restaurant = %restaurant_id,
            propagated,
            "Propagated restaurant variant mix to new scan code"
        );

        self.assignments
            .find_by_scan_code(&scan_code_ref)
            .await
            .map_err(Into::into)
    }

    /// 软停用分配：保留记录供历史分析，只摘掉激活标记
    pub async fn deactivate(&self, assignment_id: &str) -> AppResult<()> {
        self.assignments.deactivate(assignment_id).await?;
        info!(assignment = %assignment_id, "Assignment deactivated");
        Ok(())
    }

    /// 硬删除单个分配
    pub async fn remove(&self, assignment_id: &str) -> AppResult<()> {
        self.assignments
            .find_by_id(assignment_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Assignment {} not found", assignment_id))
            })?;
        self.assignments.delete(assignment_id).await?;
        info!(assignment = %assignment_id, "Assignment removed");
        Ok(())
    }

    /// 硬删除一家餐厅针对某问卷的所有分配，返回删除数量
    pub async fn remove_all_for_restaurant(
        &self,
        questionnaire_id: &str,
        restaurant_id: &str,
    ) -> AppResult<u64> {
        let questionnaire: RecordId = questionnaire_id.parse().map_err(|_| {
            AppError::validation(format!("Invalid questionnaire ID: {questionnaire_id}"))
        })?;
        let restaurant: RecordId = restaurant_id
            .parse()
            .map_err(|_| AppError::validation(format!("Invalid restaurant ID: {restaurant_id}")))?;

        let removed = self
            .assignments
            .delete_by_questionnaire_in_restaurant(&questionnaire, &restaurant)
            .await?;

        info!(
            questionnaire = %questionnaire_id,
            restaurant = %restaurant_id,
            removed,
            "Assignments removed for restaurant"
        );

        Ok(removed)
    }

    /// 列出扫码的全部分配 (含停用，审计用)
    pub async fn list_for_scan_code(&self, scan_code_id: &str) -> AppResult<Vec<Assignment>> {
        let scan_code: RecordId = scan_code_id
            .parse()
            .map_err(|_| AppError::validation(format!("Invalid scan code ID: {scan_code_id}")))?;
        self.assignments
            .find_by_scan_code(&scan_code)
            .await
            .map_err(Into::into)
    }

    /// 列出餐厅的全部分配
    pub async fn list_for_restaurant(&self, restaurant_id: &str) -> AppResult<Vec<Assignment>> {
        let restaurant: RecordId = restaurant_id
            .parse()
            .map_err(|_| AppError::validation(format!("Invalid restaurant ID: {restaurant_id}")))?;
        self.assignments
            .find_by_restaurant(&restaurant)
            .await
            .map_err(Into::into)
    }
}
