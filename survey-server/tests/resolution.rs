//! Scan resolution and response recording integration tests
//!
//! 覆盖落地页路径：不透明码查找、加权变体解析、停用/零权重
//! 的排除语义、回答提交与陈旧答案键标记。

use std::collections::BTreeMap;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};
use tempfile::TempDir;

use survey_server::db::models::{
    AssignmentCreate, ChoiceOption, DiningTableCreate, Question, QuestionKind,
    QuestionnaireCreate, QuestionnaireUpdate, RestaurantCreate,
};
use survey_server::db::repository::{
    AssignmentRepository, DiningTableRepository, QuestionnaireRepository, RestaurantRepository,
    ScanCodeRepository,
};
use survey_server::services::RecordSubmission;
use survey_server::utils::AppError;
use survey_server::{Config, ServerState};

struct Fixture {
    _tmp: TempDir,
    state: ServerState,
    restaurant: String,
    table: String,
    scan_code: String,
    code: String,
}

async fn setup() -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let db: Surreal<Db> = Surreal::new::<RocksDb>(tmp.path()).await.unwrap();
    db.use_ns("survey").use_db("test").await.unwrap();
    survey_server::db::apply_schema(&db).await.unwrap();

    let config = Config::with_overrides(tmp.path().to_string_lossy(), 0);
    let state = ServerState::with_db(config, db);

    let restaurants = RestaurantRepository::new(state.get_db());
    let restaurant = restaurants
        .create(RestaurantCreate {
            name: "Golden Dragon".to_string(),
        })
        .await
        .unwrap();
    let restaurant_id = restaurant.id.unwrap();

    let tables = DiningTableRepository::new(state.get_db());
    let table = tables
        .create(DiningTableCreate {
            name: "T1".to_string(),
            restaurant: restaurant_id.clone(),
        })
        .await
        .unwrap();
    let table_id = table.id.unwrap();

    let scan_codes = ScanCodeRepository::new(state.get_db());
    let scan_code = scan_codes
        .create(table_id.clone(), restaurant_id.clone())
        .await
        .unwrap();

    Fixture {
        _tmp: tmp,
        state,
        restaurant: restaurant_id.to_string(),
        table: table_id.to_string(),
        scan_code: scan_code.id.unwrap().to_string(),
        code: scan_code.code,
    }
}

async fn create_questionnaire(state: &ServerState, title: &str) -> String {
    let repo = QuestionnaireRepository::new(state.get_db());
    let questionnaire = repo
        .create(QuestionnaireCreate {
            title: title.to_string(),
            description: String::new(),
            questions: vec![
                Question {
                    id: "food".to_string(),
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
                    id: "comment".to_string(),
                    prompt: "Anything else?".to_string(),
                    kind: QuestionKind::FreeText,
                },
            ],
        })
        .await
        .unwrap();
    questionnaire.id.unwrap().to_string()
}

async fn raw_assignment(fx: &Fixture, questionnaire: &str, weight: i64, active: bool) -> String {
    let repo = AssignmentRepository::new(fx.state.get_db());
    let assignment = repo
        .create(AssignmentCreate {
            scan_code: fx.scan_code.parse().unwrap(),
            questionnaire: questionnaire.parse().unwrap(),
            restaurant: fx.restaurant.parse().unwrap(),
            weight,
        })
        .await
        .unwrap();
    let id = assignment.id.unwrap().to_string();
    if !active {
        repo.deactivate(&id).await.unwrap();
    }
    id
}

#[tokio::test]
async fn resolve_by_code_returns_the_single_variant() {
    let fx = setup().await;
    let q1 = create_questionnaire(&fx.state, "Service survey").await;
    fx.state
        .assignments
        .assign_single(&fx.scan_code, &q1, 100)
        .await
        .unwrap();

    let resolved = fx.state.resolver.resolve_by_code(&fx.code).await.unwrap();
    assert_eq!(resolved.questionnaire.id.as_ref().unwrap().to_string(), q1);
    assert_eq!(resolved.scan_code_id.to_string(), fx.scan_code);
    assert_eq!(resolved.dining_table_id.to_string(), fx.table);
}

#[tokio::test]
async fn resolve_unknown_code_is_not_found() {
    let fx = setup().await;
    let err = fx
        .state
        .resolver
        .resolve_by_code("no-such-code")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn resolve_skips_inactive_questionnaires() {
    let fx = setup().await;
    let q1 = create_questionnaire(&fx.state, "Retired survey").await;
    fx.state
        .assignments
        .assign_single(&fx.scan_code, &q1, 100)
        .await
        .unwrap();

    // 下架问卷后分配虽激活，但解析必须失败
    let repo = QuestionnaireRepository::new(fx.state.get_db());
    repo.update(
        &q1,
        QuestionnaireUpdate {
            title: None,
            description: None,
            is_active: Some(false),
            questions: None,
        },
    )
    .await
    .unwrap();

    let err = fx.state.resolver.resolve_by_code(&fx.code).await.unwrap_err();
    assert!(matches!(err, AppError::NoActiveQuestionnaire(_)), "got {err:?}");
}

#[tokio::test]
async fn resolve_ignores_deactivated_assignments() {
    let fx = setup().await;
    let qa = create_questionnaire(&fx.state, "Variant A").await;
    let qb = create_questionnaire(&fx.state, "Variant B").await;
    raw_assignment(&fx, &qa, 100, false).await;
    raw_assignment(&fx, &qb, 100, true).await;

    // 停用的 A 永不被抽中，100 次解析全部命中 B
    for _ in 0..100 {
        let resolved = fx.state.resolver.resolve_by_code(&fx.code).await.unwrap();
        assert_eq!(resolved.questionnaire.id.as_ref().unwrap().to_string(), qb);
    }
}

#[tokio::test]
async fn record_stores_immutable_response_with_variant_tag() {
    let fx = setup().await;
    let q1 = create_questionnaire(&fx.state, "Service survey").await;
    fx.state
        .assignments
        .assign_single(&fx.scan_code, &q1, 100)
        .await
        .unwrap();
    let resolved = fx.state.resolver.resolve_by_code(&fx.code).await.unwrap();

    let mut answers = BTreeMap::new();
    answers.insert("food".to_string(), serde_json::json!("good"));
    answers.insert("comment".to_string(), serde_json::json!("great place"));

    let response = fx
        .state
        .recorder
        .record(RecordSubmission {
            dining_table_id: fx.table.clone(),
            questionnaire_id: q1.clone(),
            scan_code_id: fx.scan_code.clone(),
            assignment_id: resolved.assignment_id.to_string(),
            answers,
            customer_identifier: Some("member-42".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(response.assignment.to_string(), resolved.assignment_id.to_string());
    assert!(response.stale_keys.is_empty());
    assert_eq!(response.customer_identifier.as_deref(), Some("member-42"));
    // 提交时间戳固定 UTC+8 报表时区
    assert!(response.submitted_at.to_rfc3339().ends_with("+08:00"));

    let stored = fx
        .state
        .recorder
        .list_for_questionnaire(&q1)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].answers["food"], serde_json::json!("good"));
}

#[tokio::test]
async fn record_flags_answer_keys_missing_from_questionnaire() {
    let fx = setup().await;
    let q1 = create_questionnaire(&fx.state, "Service survey").await;
    fx.state
        .assignments
        .assign_single(&fx.scan_code, &q1, 100)
        .await
        .unwrap();
    let resolved = fx.state.resolver.resolve_by_code(&fx.code).await.unwrap();

    // "speed" 不在当前问卷快照中：接受但标记
    let mut answers = BTreeMap::new();
    answers.insert("food".to_string(), serde_json::json!("good"));
    answers.insert("speed".to_string(), serde_json::json!("slow"));

    let response = fx
        .state
        .recorder
        .record(RecordSubmission {
            dining_table_id: fx.table.clone(),
            questionnaire_id: q1.clone(),
            scan_code_id: fx.scan_code.clone(),
            assignment_id: resolved.assignment_id.to_string(),
            answers,
            customer_identifier: None,
        })
        .await
        .unwrap();

    assert_eq!(response.stale_keys, vec!["speed".to_string()]);
}

#[tokio::test]
async fn record_rejects_empty_answers() {
    let fx = setup().await;
    let q1 = create_questionnaire(&fx.state, "Service survey").await;
    fx.state
        .assignments
        .assign_single(&fx.scan_code, &q1, 100)
        .await
        .unwrap();
    let resolved = fx.state.resolver.resolve_by_code(&fx.code).await.unwrap();

    let err = fx
        .state
        .recorder
        .record(RecordSubmission {
            dining_table_id: fx.table.clone(),
            questionnaire_id: q1.clone(),
            scan_code_id: fx.scan_code.clone(),
            assignment_id: resolved.assignment_id.to_string(),
            answers: BTreeMap::new(),
            customer_identifier: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {err:?}");
}

#[tokio::test]
async fn record_rejects_assignment_of_another_scan_code() {
    let fx = setup().await;
    let q1 = create_questionnaire(&fx.state, "Service survey").await;
    fx.state
        .assignments
        .assign_single(&fx.scan_code, &q1, 100)
        .await
        .unwrap();

    // 第二张桌台的分配不能挂在第一张桌台的扫码下提交
    let tables = DiningTableRepository::new(fx.state.get_db());
    let other_table = tables
        .create(DiningTableCreate {
            name: "T2".to_string(),
            restaurant: fx.restaurant.parse().unwrap(),
        })
        .await
        .unwrap();
    let scan_codes = ScanCodeRepository::new(fx.state.get_db());
    let other_code = scan_codes
        .create(other_table.id.unwrap(), fx.restaurant.parse().unwrap())
        .await
        .unwrap();
    let other_assignment = fx
        .state
        .assignments
        .assign_single(&other_code.id.unwrap().to_string(), &q1, 100)
        .await
        .unwrap();

    let mut answers = BTreeMap::new();
    answers.insert("food".to_string(), serde_json::json!("good"));

    let err = fx
        .state
        .recorder
        .record(RecordSubmission {
            dining_table_id: fx.table.clone(),
            questionnaire_id: q1.clone(),
            scan_code_id: fx.scan_code.clone(),
            assignment_id: other_assignment.id.unwrap().to_string(),
            answers,
            customer_identifier: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {err:?}");
}
