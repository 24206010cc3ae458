//! Per-entity data access traits.
//!
//! An [`EntityMapper`] exposes the usual count/select/insert/update/delete
//! operations by primary key or by [`Criteria`], "selective" variants that
//! only touch a subset of columns, and logical-delete variants that flip a
//! deleted flag instead of removing the row. Query building and schema live
//! in whatever backs the trait; [`InMemoryMapper`] is provided for tests.

mod brand;
mod criteria;
mod entity;
mod mapper;
mod memory;

pub use brand::{BrandColumn, BrandRecord};
pub use criteria::{Condition, Criteria, SortOrder};
pub use entity::{ColumnValue, Entity};
pub use mapper::{EntityMapper, MapperError, MapperResult};
pub use memory::{InMemoryBrandMapper, InMemoryMapper};
