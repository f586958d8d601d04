//! Dining Table Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{DiningTable, DiningTableCreate};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

#[derive(Clone)]
pub struct DiningTableRepository {
    base: BaseRepository,
}

impl DiningTableRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all tables in a restaurant
    pub async fn find_by_restaurant(&self, restaurant_id: &str) -> RepoResult<Vec<DiningTable>> {
        let restaurant: RecordId = restaurant_id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid restaurant ID: {}", restaurant_id)))?;
        let tables: Vec<DiningTable> = self
            .base
            .db()
            .query("SELECT * FROM dining_table WHERE restaurant = $restaurant ORDER BY name")
            .bind(("restaurant", restaurant))
            .await?
            .take(0)?;
        Ok(tables)
    }

    /// Find table by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<DiningTable>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let table: Option<DiningTable> = self.base.db().select(thing).await?;
        Ok(table)
    }

    /// Find table by name in restaurant
    pub async fn find_by_name(
        &self,
        restaurant: &RecordId,
        name: &str,
    ) -> RepoResult<Option<DiningTable>> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM dining_table WHERE restaurant = $restaurant AND name = $name LIMIT 1",
            )
            .bind(("restaurant", restaurant.clone()))
            .bind(("name", name.to_string()))
            .await?;
        let tables: Vec<DiningTable> = result.take(0)?;
        Ok(tables.into_iter().next())
    }

    /// Create a new dining table
    pub async fn create(&self, data: DiningTableCreate) -> RepoResult<DiningTable> {
        // Check duplicate name in same restaurant
        if self
            .find_by_name(&data.restaurant, &data.name)
            .await?
            .is_some()
        {
            return Err(RepoError::Duplicate(format!(
                "Table '{}' already exists in this restaurant",
                data.name
            )));
        }

        // 手动构建 CREATE 语句，避免 restaurant 被序列化为字符串
        let mut result = self
            .base
            .db()
            .query("CREATE dining_table SET name = $name, restaurant = $restaurant")
            .bind(("name", data.name))
            .bind(("restaurant", data.restaurant))
            .await?;
        let created: Vec<DiningTable> = result.take(0)?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create dining table".to_string()))
    }

    /// Hard delete a dining table with cascade
    ///
    /// 级联删除该桌台的扫码、扫码的所有分配、以及引用该桌台的所有回答。
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        self.base
            .db()
            .query(
                "BEGIN TRANSACTION;
                 DELETE response WHERE dining_table = $thing;
                 DELETE assignment WHERE scan_code IN (SELECT VALUE id FROM scan_code WHERE dining_table = $thing);
                 DELETE scan_code WHERE dining_table = $thing;
                 DELETE $thing;
                 COMMIT TRANSACTION;",
            )
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }
}
