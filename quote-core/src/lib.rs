pub mod calculations;
pub mod db;
pub mod export;
pub mod models;

pub use calculations::{Breakdown, OperationLedger, PricingEngine, QuoteError, price};
pub use db::repository::{QuoteRepository, RepositoryError};
pub use export::{DocumentLine, ExportError, QuoteDocument, QuoteExporter};
pub use models::*;
