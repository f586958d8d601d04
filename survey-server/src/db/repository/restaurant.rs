//! Restaurant Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Restaurant, RestaurantCreate};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "restaurant";

#[derive(Clone)]
pub struct RestaurantRepository {
    base: BaseRepository,
}

impl RestaurantRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all restaurants
    pub async fn find_all(&self) -> RepoResult<Vec<Restaurant>> {
        let restaurants: Vec<Restaurant> = self
            .base
            .db()
            .query("SELECT * FROM restaurant ORDER BY name")
            .await?
            .take(0)?;
        Ok(restaurants)
    }

    /// Find restaurant by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Restaurant>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let restaurant: Option<Restaurant> = self.base.db().select(thing).await?;
        Ok(restaurant)
    }

    /// Create a new restaurant
    pub async fn create(&self, data: RestaurantCreate) -> RepoResult<Restaurant> {
        let restaurant = Restaurant {
            id: None,
            name: data.name,
        };
        let created: Option<Restaurant> =
            self.base.db().create(TABLE).content(restaurant).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create restaurant".to_string()))
    }

    /// Hard delete a restaurant and everything under it
    ///
    /// 级联链：restaurant → dining_table → scan_code → assignment → response。
    /// 单事务执行，存储失败不会留下悬挂的部分状态。
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        self.base
            .db()
            .query(
                "BEGIN TRANSACTION;
                 DELETE response WHERE restaurant = $thing;
                 DELETE assignment WHERE restaurant = $thing;
                 DELETE scan_code WHERE restaurant = $thing;
                 DELETE dining_table WHERE restaurant = $thing;
                 DELETE $thing;
                 COMMIT TRANSACTION;",
            )
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }
}
