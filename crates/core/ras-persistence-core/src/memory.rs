use crate::brand::BrandRecord;
use crate::criteria::Criteria;
use crate::entity::Entity;
use crate::mapper::{EntityMapper, MapperError, MapperResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory implementation of EntityMapper
///
/// Rows are kept in primary key order and ids are assigned from a counter
/// starting at 1.
pub struct InMemoryMapper<E: Entity> {
    rows: Arc<RwLock<BTreeMap<i32, E>>>,
    next_id: Arc<AtomicI32>,
}

pub type InMemoryBrandMapper = InMemoryMapper<BrandRecord>;

impl<E: Entity> InMemoryMapper<E> {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: Arc::new(AtomicI32::new(1)),
        }
    }

    async fn store(&self, mut row: E) -> MapperResult<E> {
        let mut rows = self.rows.write().await;

        let id = match row.id() {
            Some(id) => {
                if rows.contains_key(&id) {
                    return Err(MapperError::DuplicateKey(id));
                }
                self.next_id.fetch_max(id.saturating_add(1), Ordering::SeqCst);
                id
            }
            None => {
                let mut id = self.next_id.fetch_add(1, Ordering::SeqCst);
                while rows.contains_key(&id) {
                    id = self.next_id.fetch_add(1, Ordering::SeqCst);
                }
                row.set_id(id);
                id
            }
        };

        debug!(table = E::TABLE, id, "Inserted row");
        rows.insert(id, row.clone());
        Ok(row)
    }

    async fn select(&self, criteria: &Criteria<E::Column>) -> Vec<E> {
        let rows = self.rows.read().await;
        let mut selected: Vec<E> = rows
            .values()
            .filter(|row| criteria.matches(*row))
            .cloned()
            .collect();
        criteria.sort(&mut selected);
        selected
    }

    async fn update_matching(
        &self,
        record: &E,
        criteria: &Criteria<E::Column>,
        non_null_only: bool,
    ) -> u64 {
        let mut rows = self.rows.write().await;
        let mut updated = 0;
        for row in rows.values_mut().filter(|row| criteria.matches(&**row)) {
            row.apply(record, non_null_only);
            updated += 1;
        }
        debug!(table = E::TABLE, updated, "Updated rows by criteria");
        updated
    }

    async fn update_by_id(&self, record: &E, non_null_only: bool) -> MapperResult<u64> {
        let id = record
            .id()
            .ok_or(MapperError::MissingPrimaryKey(E::TABLE))?;

        let mut rows = self.rows.write().await;
        match rows.get_mut(&id) {
            Some(row) => {
                row.apply(record, non_null_only);
                debug!(table = E::TABLE, id, "Updated row");
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

impl<E: Entity> Default for InMemoryMapper<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn at_most_one<E: Entity>(mut rows: Vec<E>) -> MapperResult<Option<E>> {
    match rows.len() {
        0 | 1 => Ok(rows.pop()),
        found => Err(MapperError::TooManyResults {
            table: E::TABLE,
            found,
        }),
    }
}

#[async_trait]
impl<E: Entity> EntityMapper<E> for InMemoryMapper<E> {
    async fn count_by_criteria(&self, criteria: &Criteria<E::Column>) -> MapperResult<u64> {
        let rows = self.rows.read().await;
        Ok(rows.values().filter(|row| criteria.matches(*row)).count() as u64)
    }

    async fn delete_by_criteria(&self, criteria: &Criteria<E::Column>) -> MapperResult<u64> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|_, row| !criteria.matches(row));
        let deleted = (before - rows.len()) as u64;
        debug!(table = E::TABLE, deleted, "Deleted rows by criteria");
        Ok(deleted)
    }

    async fn delete_by_primary_key(&self, id: i32) -> MapperResult<u64> {
        let mut rows = self.rows.write().await;
        Ok(rows.remove(&id).map_or(0, |_| 1))
    }

    async fn insert(&self, record: E) -> MapperResult<E> {
        self.store(record).await
    }

    async fn insert_selective(&self, record: E) -> MapperResult<E> {
        let mut row = E::with_column_defaults();
        row.apply(&record, true);
        if let Some(id) = record.id() {
            row.set_id(id);
        }
        self.store(row).await
    }

    async fn select_one_by_criteria(
        &self,
        criteria: &Criteria<E::Column>,
    ) -> MapperResult<Option<E>> {
        at_most_one(self.select(criteria).await)
    }

    async fn select_one_by_criteria_selective(
        &self,
        criteria: &Criteria<E::Column>,
        columns: &[E::Column],
    ) -> MapperResult<Option<E>> {
        let row = at_most_one(self.select(criteria).await)?;
        Ok(row.map(|row| row.project(columns)))
    }

    async fn select_by_criteria(&self, criteria: &Criteria<E::Column>) -> MapperResult<Vec<E>> {
        Ok(self.select(criteria).await)
    }

    async fn select_by_criteria_selective(
        &self,
        criteria: &Criteria<E::Column>,
        columns: &[E::Column],
    ) -> MapperResult<Vec<E>> {
        let rows = self.select(criteria).await;
        Ok(rows.iter().map(|row| row.project(columns)).collect())
    }

    async fn select_by_primary_key(&self, id: i32) -> MapperResult<Option<E>> {
        let rows = self.rows.read().await;
        Ok(rows.get(&id).cloned())
    }

    async fn select_by_primary_key_selective(
        &self,
        id: i32,
        columns: &[E::Column],
    ) -> MapperResult<Option<E>> {
        let rows = self.rows.read().await;
        Ok(rows.get(&id).map(|row| row.project(columns)))
    }

    async fn select_by_primary_key_with_logical_delete(
        &self,
        id: i32,
        deleted: bool,
    ) -> MapperResult<Option<E>> {
        let rows = self.rows.read().await;
        Ok(rows.get(&id).filter(|row| row.is_deleted() == deleted).cloned())
    }

    async fn update_by_criteria(
        &self,
        record: &E,
        criteria: &Criteria<E::Column>,
    ) -> MapperResult<u64> {
        Ok(self.update_matching(record, criteria, false).await)
    }

    async fn update_by_criteria_selective(
        &self,
        record: &E,
        criteria: &Criteria<E::Column>,
    ) -> MapperResult<u64> {
        Ok(self.update_matching(record, criteria, true).await)
    }

    async fn update_by_primary_key(&self, record: &E) -> MapperResult<u64> {
        self.update_by_id(record, false).await
    }

    async fn update_by_primary_key_selective(&self, record: &E) -> MapperResult<u64> {
        self.update_by_id(record, true).await
    }

    async fn logical_delete_by_criteria(
        &self,
        criteria: &Criteria<E::Column>,
    ) -> MapperResult<u64> {
        let mut rows = self.rows.write().await;
        let mut deleted = 0;
        for row in rows
            .values_mut()
            .filter(|row| !row.is_deleted() && criteria.matches(&**row))
        {
            row.set_deleted(true);
            deleted += 1;
        }
        debug!(table = E::TABLE, deleted, "Logically deleted rows by criteria");
        Ok(deleted)
    }

    async fn logical_delete_by_primary_key(&self, id: i32) -> MapperResult<u64> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&id) {
            Some(row) if !row.is_deleted() => {
                row.set_deleted(true);
                debug!(table = E::TABLE, id, "Logically deleted row");
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}
