//! Expenses: the core records of money spent.
//!
//! Stored expenses are created directly, imported from CSV, or mirrored from
//! mileage logs. List responses also include virtual instances expanded from
//! recurring expense templates at read time.

mod db;
mod domain;
mod endpoints;
mod import;

pub use db::{
    create_expense, create_expense_tables, delete_expense, get_expense, list_expenses,
    update_expense,
};
pub(crate) use db::{insert_mirror_expense, update_mirror_expense};
pub use domain::{Expense, ExpenseData, ExpenseId, ExpenseInstance};
pub use endpoints::{
    ExpenseBody, create_expense_endpoint, delete_expense_endpoint, get_expense_endpoint,
    get_expenses, update_expense_endpoint,
};
pub(crate) use endpoints::list_merged_expenses;
pub use import::import_expenses;
