//! Assignment engine integration tests
//!
//! 使用嵌入式 RocksDb (tempdir) 覆盖分配管理的核心行为：
//! 单桌绑定冲突、批量分配的幂等性、传播、级联删除。

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};
use tempfile::TempDir;

use survey_server::db::models::{
    AssignmentCreate, ChoiceOption, DiningTableCreate, Question, QuestionKind,
    QuestionnaireCreate, RestaurantCreate,
};
use survey_server::db::repository::{
    AssignmentRepository, DiningTableRepository, QuestionnaireRepository, ResponseRepository,
    RestaurantRepository, ScanCodeRepository,
};
use survey_server::utils::AppError;
use survey_server::{Config, ServerState};

async fn setup() -> (TempDir, ServerState) {
    let tmp = tempfile::tempdir().unwrap();
    let db: Surreal<Db> = Surreal::new::<RocksDb>(tmp.path()).await.unwrap();
    db.use_ns("survey").use_db("test").await.unwrap();
    survey_server::db::apply_schema(&db).await.unwrap();

    let config = Config::with_overrides(tmp.path().to_string_lossy(), 0);
    let state = ServerState::with_db(config, db);
    (tmp, state)
}

async fn create_restaurant(state: &ServerState, name: &str) -> String {
    let repo = RestaurantRepository::new(state.get_db());
    let restaurant = repo
        .create(RestaurantCreate {
            name: name.to_string(),
        })
        .await
        .unwrap();
    restaurant.id.unwrap().to_string()
}

/// 桌台 + 扫码一并创建，并触发传播 (生产路径的员工操作)
async fn create_table(state: &ServerState, restaurant_id: &str, name: &str) -> (String, String) {
    let tables = DiningTableRepository::new(state.get_db());
    let table = tables
        .create(DiningTableCreate {
            name: name.to_string(),
            restaurant: restaurant_id.parse().unwrap(),
        })
        .await
        .unwrap();
    let table_id = table.id.unwrap();

    let scan_codes = ScanCodeRepository::new(state.get_db());
    let scan_code = scan_codes
        .create(table_id.clone(), restaurant_id.parse().unwrap())
        .await
        .unwrap();
    let scan_code_id = scan_code.id.unwrap().to_string();

    state
        .assignments
        .provision_propagation(&scan_code_id, restaurant_id)
        .await
        .unwrap();

    (table_id.to_string(), scan_code_id)
}

async fn create_questionnaire(state: &ServerState, title: &str) -> String {
    let repo = QuestionnaireRepository::new(state.get_db());
    let questionnaire = repo
        .create(QuestionnaireCreate {
            title: title.to_string(),
            description: String::new(),
            questions: vec![
                Question {
                    id: "q1".to_string(),
                    prompt: "How was the food?".to_string(),
                    kind: QuestionKind::MultipleChoice {
                        options: vec![
                            ChoiceOption {
                                value: "good".to_string(),
                                label: "Good".to_string(),
                            },
                            ChoiceOption {
                                value: "bad".to_string(),
                                label: "Bad".to_string(),
                            },
                        ],
                    },
                },
                Question {
                    id: "q2".to_string(),
                    prompt: "Anything else?".to_string(),
                    kind: QuestionKind::FreeText,
                },
            ],
        })
        .await
        .unwrap();
    questionnaire.id.unwrap().to_string()
}

#[tokio::test]
async fn assign_single_conflicts_on_second_attempt() {
    let (_tmp, state) = setup().await;
    let restaurant = create_restaurant(&state, "Golden Dragon").await;
    let (_table, scan_code) = create_table(&state, &restaurant, "T1").await;
    let q1 = create_questionnaire(&state, "Service survey").await;
    let q2 = create_questionnaire(&state, "Menu survey").await;

    let first = state
        .assignments
        .assign_single(&scan_code, &q1, 100)
        .await
        .unwrap();
    assert!(first.is_active);
    assert_eq!(first.weight, 100);

    let err = state
        .assignments
        .assign_single(&scan_code, &q2, 100)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");

    // 已有分配保持不变
    let assignments = state.assignments.list_for_scan_code(&scan_code).await.unwrap();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].questionnaire.to_string(), q1);
    assert_eq!(assignments[0].weight, 100);
}

#[tokio::test]
async fn assign_single_rejects_non_positive_weight() {
    let (_tmp, state) = setup().await;
    let restaurant = create_restaurant(&state, "Golden Dragon").await;
    let (_table, scan_code) = create_table(&state, &restaurant, "T1").await;
    let q1 = create_questionnaire(&state, "Service survey").await;

    let err = state
        .assignments
        .assign_single(&scan_code, &q1, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {err:?}");

    // 校验失败必须发生在任何写入之前
    let assignments = state.assignments.list_for_scan_code(&scan_code).await.unwrap();
    assert!(assignments.is_empty());
}

#[tokio::test]
async fn assign_single_unknown_scan_code_is_not_found() {
    let (_tmp, state) = setup().await;
    let q1 = create_questionnaire(&state, "Service survey").await;

    let err = state
        .assignments
        .assign_single("scan_code:nonexistent", &q1, 100)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn assign_to_restaurant_partitions_and_skips() {
    let (_tmp, state) = setup().await;
    let restaurant = create_restaurant(&state, "Golden Dragon").await;
    let (_t1, sc1) = create_table(&state, &restaurant, "T1").await;
    let q1 = create_questionnaire(&state, "Service survey").await;

    // T1 手动绑定 Q1；T2/T3 尚无分配
    state
        .assignments
        .assign_single(&sc1, &q1, 100)
        .await
        .unwrap();
    // 注意：T2/T3 在 T1 绑定之后创建会通过传播继承 Q1，
    // 因此先清空传播结果再测试批量路径
    let (_t2, sc2) = create_table(&state, &restaurant, "T2").await;
    let (_t3, sc3) = create_table(&state, &restaurant, "T3").await;
    for sc in [&sc2, &sc3] {
        for a in state.assignments.list_for_scan_code(sc).await.unwrap() {
            state
                .assignments
                .remove(&a.id.unwrap().to_string())
                .await
                .unwrap();
        }
    }

    let q2 = create_questionnaire(&state, "Menu survey").await;
    let outcome = state
        .assignments
        .assign_to_restaurant(&restaurant, &q2, 100)
        .await
        .unwrap();

    assert_eq!(outcome.assigned_count, 2);
    assert_eq!(outcome.skipped_count, 1);
    assert_eq!(outcome.skipped[0].name, "T1");

    // 重复执行：所有桌台都已有分配 → AllAssigned，且不产生重复行
    let err = state
        .assignments
        .assign_to_restaurant(&restaurant, &q2, 100)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AllAssigned(_)), "got {err:?}");

    let all = state.assignments.list_for_restaurant(&restaurant).await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn assign_to_restaurant_without_tables_is_all_assigned() {
    let (_tmp, state) = setup().await;
    let restaurant = create_restaurant(&state, "Empty Place").await;
    let q1 = create_questionnaire(&state, "Service survey").await;

    let err = state
        .assignments
        .assign_to_restaurant(&restaurant, &q1, 100)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AllAssigned(_)), "got {err:?}");
}

#[tokio::test]
async fn propagation_copies_restaurant_variant_mix() {
    let (_tmp, state) = setup().await;
    let restaurant = create_restaurant(&state, "Golden Dragon").await;
    let (_t1, sc1) = create_table(&state, &restaurant, "T1").await;
    let qa = create_questionnaire(&state, "Variant A").await;
    let qb = create_questionnaire(&state, "Variant B").await;

    // 在 T1 上搭建 50/50 实验 (多变体集合来自批量/实验路径)
    let repo = AssignmentRepository::new(state.get_db());
    for (q, w) in [(&qa, 50i64), (&qb, 50i64)] {
        repo.create(AssignmentCreate {
            scan_code: sc1.parse().unwrap(),
            questionnaire: q.parse().unwrap(),
            restaurant: restaurant.parse().unwrap(),
            weight: w,
        })
        .await
        .unwrap();
    }

    // 新桌台的扫码继承完全相同的组合
    let (_t2, sc2) = create_table(&state, &restaurant, "T2").await;
    let mut propagated: Vec<(String, i64)> = state
        .assignments
        .list_for_scan_code(&sc2)
        .await
        .unwrap()
        .into_iter()
        .map(|a| (a.questionnaire.to_string(), a.weight))
        .collect();
    propagated.sort();

    let mut expected = vec![(qa.clone(), 50), (qb.clone(), 50)];
    expected.sort();
    assert_eq!(propagated, expected);
}

#[tokio::test]
async fn propagation_in_fresh_restaurant_yields_nothing() {
    let (_tmp, state) = setup().await;
    let restaurant = create_restaurant(&state, "Fresh Start").await;
    let (_t1, sc1) = create_table(&state, &restaurant, "T1").await;

    let assignments = state.assignments.list_for_scan_code(&sc1).await.unwrap();
    assert!(assignments.is_empty());

    // 尚无分配的扫码不可解析
    let err = state.resolver.resolve_for_scan(&sc1).await.unwrap_err();
    assert!(matches!(err, AppError::NoActiveQuestionnaire(_)), "got {err:?}");
}

#[tokio::test]
async fn propagation_does_not_leak_across_restaurants() {
    let (_tmp, state) = setup().await;
    let r1 = create_restaurant(&state, "Golden Dragon").await;
    let r2 = create_restaurant(&state, "Silver Phoenix").await;
    let (_t1, sc1) = create_table(&state, &r1, "T1").await;
    let q1 = create_questionnaire(&state, "Dragon survey").await;
    state
        .assignments
        .assign_single(&sc1, &q1, 100)
        .await
        .unwrap();

    // 另一家餐厅的新扫码不得继承 r1 的分配
    let (_t2, sc2) = create_table(&state, &r2, "T1").await;
    let assignments = state.assignments.list_for_scan_code(&sc2).await.unwrap();
    assert!(assignments.is_empty());
}

#[tokio::test]
async fn deactivate_is_soft_and_keeps_history() {
    let (_tmp, state) = setup().await;
    let restaurant = create_restaurant(&state, "Golden Dragon").await;
    let (_table, scan_code) = create_table(&state, &restaurant, "T1").await;
    let q1 = create_questionnaire(&state, "Service survey").await;
    let assignment = state
        .assignments
        .assign_single(&scan_code, &q1, 100)
        .await
        .unwrap();
    let assignment_id = assignment.id.unwrap().to_string();

    state.assignments.deactivate(&assignment_id).await.unwrap();

    // 记录仍在，带停用时间戳
    let assignments = state.assignments.list_for_scan_code(&scan_code).await.unwrap();
    assert_eq!(assignments.len(), 1);
    assert!(!assignments[0].is_active);
    assert!(assignments[0].deactivated_at.is_some());

    // 停用后不可解析
    let err = state.resolver.resolve_for_scan(&scan_code).await.unwrap_err();
    assert!(matches!(err, AppError::NoActiveQuestionnaire(_)), "got {err:?}");
}

#[tokio::test]
async fn remove_all_for_restaurant_returns_count() {
    let (_tmp, state) = setup().await;
    let restaurant = create_restaurant(&state, "Golden Dragon").await;
    create_table(&state, &restaurant, "T1").await;
    create_table(&state, &restaurant, "T2").await;
    let q1 = create_questionnaire(&state, "Service survey").await;

    let outcome = state
        .assignments
        .assign_to_restaurant(&restaurant, &q1, 100)
        .await
        .unwrap();
    assert_eq!(outcome.assigned_count, 2);

    let removed = state
        .assignments
        .remove_all_for_restaurant(&q1, &restaurant)
        .await
        .unwrap();
    assert_eq!(removed, 2);

    let all = state.assignments.list_for_restaurant(&restaurant).await.unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn deleting_table_cascades_to_scan_code_assignments_responses() {
    let (_tmp, state) = setup().await;
    let restaurant = create_restaurant(&state, "Golden Dragon").await;
    let (table, scan_code) = create_table(&state, &restaurant, "T1").await;
    let q1 = create_questionnaire(&state, "Service survey").await;
    state
        .assignments
        .assign_single(&scan_code, &q1, 100)
        .await
        .unwrap();

    // 先留下一条回答
    let resolved = state.resolver.resolve_for_scan(&scan_code).await.unwrap();
    let mut answers = std::collections::BTreeMap::new();
    answers.insert("q1".to_string(), serde_json::json!("good"));
    state
        .recorder
        .record(survey_server::services::RecordSubmission {
            dining_table_id: table.clone(),
            questionnaire_id: q1.clone(),
            scan_code_id: scan_code.clone(),
            assignment_id: resolved.assignment_id.to_string(),
            answers,
            customer_identifier: None,
        })
        .await
        .unwrap();

    let tables = DiningTableRepository::new(state.get_db());
    tables.delete(&table).await.unwrap();

    let scan_codes = ScanCodeRepository::new(state.get_db());
    assert!(scan_codes.find_by_id(&scan_code).await.unwrap().is_none());

    let assignments = state.assignments.list_for_scan_code(&scan_code).await.unwrap();
    assert!(assignments.is_empty());

    let responses = ResponseRepository::new(state.get_db());
    let remaining = responses
        .find_by_questionnaire(&q1.parse().unwrap())
        .await
        .unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn deleting_questionnaire_cascades_but_spares_others() {
    let (_tmp, state) = setup().await;
    let restaurant = create_restaurant(&state, "Golden Dragon").await;
    let (_t1, sc1) = create_table(&state, &restaurant, "T1").await;
    let qa = create_questionnaire(&state, "Variant A").await;
    let qb = create_questionnaire(&state, "Variant B").await;

    let repo = AssignmentRepository::new(state.get_db());
    for q in [&qa, &qb] {
        repo.create(AssignmentCreate {
            scan_code: sc1.parse().unwrap(),
            questionnaire: q.parse().unwrap(),
            restaurant: restaurant.parse().unwrap(),
            weight: 50,
        })
        .await
        .unwrap();
    }

    let questionnaires = QuestionnaireRepository::new(state.get_db());
    questionnaires.delete(&qa).await.unwrap();

    let remaining = state.assignments.list_for_scan_code(&sc1).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].questionnaire.to_string(), qb);
}
