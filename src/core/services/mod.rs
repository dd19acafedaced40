//! Account-level facades over the pure engine functions.

pub mod summary_service;
pub mod template_service;
pub mod transaction_service;

pub use summary_service::{
    CategorySpending, CycleSummary, ExportBundle, ExportSink, MonthSummary, SummaryService,
};
pub use template_service::{TemplateService, TemplateTotals};
pub use transaction_service::TransactionService;
