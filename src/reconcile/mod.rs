//! Purchase-to-sale reconciliation: entity resolution, sale construction,
//! and the pipeline that ties them to the credential manager.

mod pipeline;
mod resolver;
mod sale_builder;

pub use pipeline::{Outcome, ReconciliationPipeline};
pub use resolver::{EntityResolver, MAX_PHONE_DIGITS, POSTAL_CODE_DIGITS, normalize_phone};
pub use sale_builder::{NOTE_PREFIX, SaleBuilder, due_date};
