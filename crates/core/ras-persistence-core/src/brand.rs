use crate::entity::{ColumnValue, Entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of the `litemall_brand` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandRecord {
    pub id: Option<i32>,
    pub name: Option<String>,
    pub desc: Option<String>,
    pub pic_url: Option<String>,
    pub sort_order: Option<i32>,
    /// Lowest product price in cents.
    pub floor_price_cents: Option<i64>,
    pub add_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
    pub deleted: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrandColumn {
    Id,
    Name,
    Desc,
    PicUrl,
    SortOrder,
    FloorPrice,
    AddTime,
    UpdateTime,
    Deleted,
}

const ALL_COLUMNS: [BrandColumn; 9] = [
    BrandColumn::Id,
    BrandColumn::Name,
    BrandColumn::Desc,
    BrandColumn::PicUrl,
    BrandColumn::SortOrder,
    BrandColumn::FloorPrice,
    BrandColumn::AddTime,
    BrandColumn::UpdateTime,
    BrandColumn::Deleted,
];

impl Entity for BrandRecord {
    type Column = BrandColumn;

    const TABLE: &'static str = "litemall_brand";

    fn all_columns() -> &'static [BrandColumn] {
        &ALL_COLUMNS
    }

    fn with_column_defaults() -> Self {
        Self {
            deleted: Some(false),
            ..Self::default()
        }
    }

    fn primary_key_column() -> BrandColumn {
        BrandColumn::Id
    }

    fn id(&self) -> Option<i32> {
        self.id
    }

    fn set_id(&mut self, id: i32) {
        self.id = Some(id);
    }

    fn value(&self, column: BrandColumn) -> ColumnValue {
        match column {
            BrandColumn::Id => self.id.into(),
            BrandColumn::Name => self.name.clone().into(),
            BrandColumn::Desc => self.desc.clone().into(),
            BrandColumn::PicUrl => self.pic_url.clone().into(),
            BrandColumn::SortOrder => self.sort_order.into(),
            BrandColumn::FloorPrice => self.floor_price_cents.into(),
            BrandColumn::AddTime => self.add_time.into(),
            BrandColumn::UpdateTime => self.update_time.into(),
            BrandColumn::Deleted => self.deleted.into(),
        }
    }

    fn copy_column(&mut self, source: &Self, column: BrandColumn) {
        match column {
            BrandColumn::Id => self.id = source.id,
            BrandColumn::Name => self.name = source.name.clone(),
            BrandColumn::Desc => self.desc = source.desc.clone(),
            BrandColumn::PicUrl => self.pic_url = source.pic_url.clone(),
            BrandColumn::SortOrder => self.sort_order = source.sort_order,
            BrandColumn::FloorPrice => self.floor_price_cents = source.floor_price_cents,
            BrandColumn::AddTime => self.add_time = source.add_time,
            BrandColumn::UpdateTime => self.update_time = source.update_time,
            BrandColumn::Deleted => self.deleted = source.deleted,
        }
    }

    fn is_deleted(&self) -> bool {
        self.deleted.unwrap_or(false)
    }

    fn set_deleted(&mut self, deleted: bool) {
        self.deleted = Some(deleted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_keeps_only_requested_columns() {
        let brand = BrandRecord {
            id: Some(7),
            name: Some("Acme".to_string()),
            desc: Some("Shoes".to_string()),
            sort_order: Some(3),
            ..Default::default()
        };

        let projected = brand.project(&[BrandColumn::Id, BrandColumn::Name]);

        assert_eq!(projected.id, Some(7));
        assert_eq!(projected.name.as_deref(), Some("Acme"));
        assert!(projected.desc.is_none());
        assert!(projected.sort_order.is_none());
    }

    #[test]
    fn test_selective_apply_skips_nulls_and_primary_key() {
        let mut stored = BrandRecord {
            id: Some(1),
            name: Some("Old".to_string()),
            desc: Some("Keep me".to_string()),
            ..Default::default()
        };
        let patch = BrandRecord {
            id: Some(99),
            name: Some("New".to_string()),
            ..Default::default()
        };

        stored.apply(&patch, true);

        assert_eq!(stored.id, Some(1));
        assert_eq!(stored.name.as_deref(), Some("New"));
        assert_eq!(stored.desc.as_deref(), Some("Keep me"));

        stored.apply(&patch, false);
        assert!(stored.desc.is_none());
        assert_eq!(stored.id, Some(1));
    }

    #[test]
    fn test_serializes_camel_case() {
        let brand = BrandRecord {
            pic_url: Some("http://x/logo.png".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_value(&brand).unwrap();
        assert_eq!(json["picUrl"], "http://x/logo.png");
    }
}
