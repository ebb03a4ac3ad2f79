//! Recurring expense templates.
//!
//! A template describes a cost that repeats monthly, e.g. insurance or a
//! phone plan. Templates are never materialized into stored expenses.
//! Instead, expense listings and summaries expand them into virtual
//! instances at read time, so editing a template retroactively changes
//! history and deleting one removes every instance at once.

mod db;
mod domain;
mod endpoints;
mod expand;

pub use db::{
    create_recurring_expense, create_recurring_expense_tables, delete_recurring_expense,
    get_recurring_expense, list_recurring_expenses, update_recurring_expense,
};
pub use domain::{RecurringExpense, RecurringExpenseData, RecurringExpenseId};
pub use endpoints::{
    create_recurring_expense_endpoint, delete_recurring_expense_endpoint,
    get_recurring_expenses, update_recurring_expense_endpoint,
};
pub use expand::expand_recurring_expenses;
