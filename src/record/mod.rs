//! Ledger records and everything needed to store and query them.
//!
//! This module contains:
//! - The validated field types [Amount], [Category] and [RecordType]
//! - The [Record] model, its builder and the SQLite queries that store it
//! - The ledger operations used by route handlers, which own input validation
//!   and database locking
//! - Route handlers for creating, listing and summarizing records

mod amount;
mod category;
mod core;
mod create_endpoint;
mod form;
mod ledger;
mod list_endpoint;
mod record_type;
mod summary;

pub use amount::Amount;
pub use category::Category;
pub use core::{
    NewRecord, Record, create_record, create_record_table, get_all_records, get_record,
    get_records_created_between, map_record_row,
};
pub use create_endpoint::{CreateRecordState, create_record_endpoint};
pub use form::{AmountInput, RecordForm, RecordInput};
pub use ledger::{create_transaction, get_transaction, list_transactions, summarize_period};
pub use list_endpoint::{RecordsState, get_record_endpoint, list_records_endpoint};
pub use record_type::RecordType;
pub use summary::{
    CategoryTotal, LedgerSummary, Period, SummaryQuery, SummaryState, get_summary_endpoint,
    summarize,
};

#[cfg(test)]
pub use core::count_records;
