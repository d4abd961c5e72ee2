use sqlx::{postgres::PgRow, FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};

/// A model backed by one table
pub trait Table {
    const TABLE: &'static str;
    /// Human-readable noun for error messages
    const NAME: &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Generic by-id access to any model table
pub struct Repository<T> {
    table: String,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: Table + for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(pool: PgPool) -> Result<Self, DatabaseError> {
        Ok(Self {
            table: DatabaseManager::quote_identifier(T::TABLE)?,
            pool,
            _phantom: std::marker::PhantomData,
        })
    }

    pub async fn select_optional(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", self.table);
        let row = sqlx::query_as::<_, T>(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row)
    }

    pub async fn select_404(&self, id: Uuid) -> Result<T, DatabaseError> {
        self.select_optional(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {} not found", T::NAME, id)))
    }

    pub async fn select_all(&self, order_by: &str, order: SortOrder, limit: i64) -> Result<Vec<T>, DatabaseError> {
        let sql = format!(
            "SELECT * FROM {} ORDER BY {} {} LIMIT $1",
            self.table,
            DatabaseManager::quote_identifier(order_by)?,
            order.as_sql()
        );
        let rows = sqlx::query_as::<_, T>(&sql).bind(limit).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn count(&self) -> Result<i64, DatabaseError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("{} {} not found", T::NAME, id)));
        }
        Ok(())
    }
}
