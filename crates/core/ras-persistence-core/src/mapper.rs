use crate::criteria::Criteria;
use crate::entity::Entity;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapperError {
    #[error("Expected at most one row in {table}, found {found}")]
    TooManyResults { table: &'static str, found: usize },

    #[error("Row in {0} has no primary key")]
    MissingPrimaryKey(&'static str),

    #[error("Duplicate primary key: {0}")]
    DuplicateKey(i32),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type MapperResult<T> = Result<T, MapperError>;

/// Data access for one entity type.
///
/// `*_selective` reads return rows holding only the requested columns.
/// `*_selective` writes only touch the columns that are non-null on the
/// supplied record. Logical selects and deletes honour the entity's deleted
/// flag; the plain variants see every row.
#[async_trait]
pub trait EntityMapper<E: Entity>: Send + Sync {
    async fn count_by_criteria(&self, criteria: &Criteria<E::Column>) -> MapperResult<u64>;

    async fn delete_by_criteria(&self, criteria: &Criteria<E::Column>) -> MapperResult<u64>;

    async fn delete_by_primary_key(&self, id: i32) -> MapperResult<u64>;

    /// Inserts every column. A missing primary key is assigned and the stored
    /// row is returned.
    async fn insert(&self, record: E) -> MapperResult<E>;

    /// Inserts only the non-null columns; the rest keep their defaults.
    async fn insert_selective(&self, record: E) -> MapperResult<E>;

    async fn select_one_by_criteria(&self, criteria: &Criteria<E::Column>)
    -> MapperResult<Option<E>>;

    async fn select_one_by_criteria_selective(
        &self,
        criteria: &Criteria<E::Column>,
        columns: &[E::Column],
    ) -> MapperResult<Option<E>>;

    async fn select_by_criteria(&self, criteria: &Criteria<E::Column>) -> MapperResult<Vec<E>>;

    async fn select_by_criteria_selective(
        &self,
        criteria: &Criteria<E::Column>,
        columns: &[E::Column],
    ) -> MapperResult<Vec<E>>;

    async fn select_by_primary_key(&self, id: i32) -> MapperResult<Option<E>>;

    async fn select_by_primary_key_selective(
        &self,
        id: i32,
        columns: &[E::Column],
    ) -> MapperResult<Option<E>>;

    /// Returns the row only if its deleted flag equals `deleted`.
    async fn select_by_primary_key_with_logical_delete(
        &self,
        id: i32,
        deleted: bool,
    ) -> MapperResult<Option<E>>;

    async fn update_by_criteria(
        &self,
        record: &E,
        criteria: &Criteria<E::Column>,
    ) -> MapperResult<u64>;

    async fn update_by_criteria_selective(
        &self,
        record: &E,
        criteria: &Criteria<E::Column>,
    ) -> MapperResult<u64>;

    async fn update_by_primary_key(&self, record: &E) -> MapperResult<u64>;

    async fn update_by_primary_key_selective(&self, record: &E) -> MapperResult<u64>;

    /// Sets the deleted flag on every live row matching `criteria`.
    async fn logical_delete_by_criteria(&self, criteria: &Criteria<E::Column>)
    -> MapperResult<u64>;

    async fn logical_delete_by_primary_key(&self, id: i32) -> MapperResult<u64>;
}
