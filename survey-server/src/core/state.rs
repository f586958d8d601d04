use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::core::Config;
use crate::db::DbService;
use crate::services::{AssignmentManager, ResponseRecorder, VariantResolver};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 所有字段内部都是浅拷贝 (数据库句柄 + 仓储引用)，Clone 成本极低。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | db | 嵌入式数据库 (SurrealDB) |
/// | assignments | 分配管理引擎 |
/// | resolver | 扫码变体解析 |
/// | recorder | 提交记录 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// 分配管理引擎
    pub assignments: AssignmentManager,
    /// 扫码变体解析
    pub resolver: VariantResolver,
    /// 提交记录
    pub recorder: ResponseRecorder,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 数据库 (work_dir/database)
    /// 3. 引擎服务
    ///
    /// # Panics
    ///
    /// 数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_dir = config.database_dir();
        let db_path = db_dir.to_string_lossy();

        let db_service = DbService::new(&db_path)
            .await
            .expect("Failed to initialize database");

        Self::with_db(config.clone(), db_service.db)
    }

    /// 用现有数据库句柄构造状态 (测试用)
    pub fn with_db(config: Config, db: Surreal<Db>) -> Self {
        Self {
            config,
            assignments: AssignmentManager::new(db.clone()),
            resolver: VariantResolver::new(db.clone()),
            recorder: ResponseRecorder::new(db.clone()),
            db,
        }
    }

    /// 获取数据库实例
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }
}
