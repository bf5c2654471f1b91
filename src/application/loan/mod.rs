mod loan_service;
mod queries;

pub use loan_service::{approve_borrow, extend_loan, reject_borrow, request_borrow, return_book};
pub use queries::{LoanSummary, admin_dashboard, my_loans};
