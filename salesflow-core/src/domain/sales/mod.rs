// salesflow-core/src/domain/sales/mod.rs

pub mod record;
pub mod schema;

pub use record::{
    AggregatedRecord, Cell, CleanedRecord, EnrichedRecord, GroupKey, RawSaleRecord, SourceRow,
};
