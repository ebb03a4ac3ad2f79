//! Core expense domain types.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, mileage::MileageLogId, recurring::RecurringExpenseId, tag::Tag};

/// Database identifier for an expense.
pub type ExpenseId = i64;

/// A stored expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The expense's database ID.
    pub id: ExpenseId,
    /// When the money was spent.
    pub date: Date,
    /// What the expense was for.
    pub description: String,
    /// Who was paid.
    pub recipient: String,
    /// The amount of money spent.
    pub amount: f64,
    /// The portion of the amount spent on materials, for job costing.
    pub materials: Option<f64>,
    /// Hours of labour associated with the expense.
    pub hours: Option<f64>,
    /// Set when this expense mirrors a mileage log's deduction.
    ///
    /// Mirror expenses are owned by their mileage log and cannot be edited or
    /// deleted directly.
    pub mileage_log_id: Option<MileageLogId>,
    /// The tags attached to the expense.
    pub tags: Vec<Tag>,
}

/// One row of an expense listing.
///
/// Either a stored expense or a virtual instance expanded from a recurring
/// expense template. Virtual instances have no ID of their own, they exist
/// only in list responses and carry the ID of the template that produced
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseInstance {
    /// The stored expense's ID, or `None` for a virtual instance.
    pub id: Option<ExpenseId>,
    /// When the money was (or would be) spent.
    pub date: Date,
    /// What the expense was for.
    pub description: String,
    /// Who was paid.
    pub recipient: String,
    /// The amount of money spent.
    pub amount: f64,
    /// The portion of the amount spent on materials.
    pub materials: Option<f64>,
    /// Hours of labour associated with the expense.
    pub hours: Option<f64>,
    /// Set when the expense mirrors a mileage log's deduction.
    pub mileage_log_id: Option<MileageLogId>,
    /// Set when the row is a virtual instance of a recurring expense.
    pub recurring_expense_id: Option<RecurringExpenseId>,
    /// The tags attached to the expense.
    pub tags: Vec<Tag>,
}

impl From<Expense> for ExpenseInstance {
    fn from(expense: Expense) -> Self {
        Self {
            id: Some(expense.id),
            date: expense.date,
            description: expense.description,
            recipient: expense.recipient,
            amount: expense.amount,
            materials: expense.materials,
            hours: expense.hours,
            mileage_log_id: expense.mileage_log_id,
            recurring_expense_id: None,
            tags: expense.tags,
        }
    }
}

/// Validated input for creating or updating an expense.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseData {
    /// When the money was spent.
    pub date: Date,
    /// What the expense was for.
    pub description: String,
    /// Who was paid.
    pub recipient: String,
    /// The amount of money spent.
    pub amount: f64,
    /// The portion of the amount spent on materials.
    pub materials: Option<f64>,
    /// Hours of labour associated with the expense.
    pub hours: Option<f64>,
    /// Tag names to attach, created for the user if they do not exist yet.
    pub tags: Vec<String>,
}

impl ExpenseData {
    /// Validate raw expense fields.
    ///
    /// # Errors
    /// Returns [Error::EmptyDescription], [Error::EmptyRecipient] or
    /// [Error::NonPositiveAmount] if the corresponding field is invalid.
    pub fn new(
        date: Date,
        description: &str,
        recipient: &str,
        amount: f64,
        materials: Option<f64>,
        hours: Option<f64>,
        tags: Vec<String>,
    ) -> Result<Self, Error> {
        let description = description.trim();
        if description.is_empty() {
            return Err(Error::EmptyDescription);
        }

        let recipient = recipient.trim();
        if recipient.is_empty() {
            return Err(Error::EmptyRecipient);
        }

        if amount <= 0.0 {
            return Err(Error::NonPositiveAmount(amount));
        }

        Ok(Self {
            date,
            description: description.to_owned(),
            recipient: recipient.to_owned(),
            amount,
            materials,
            hours,
            tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::Error;

    use super::ExpenseData;

    #[test]
    fn new_fails_on_blank_description() {
        let result = ExpenseData::new(
            date!(2026 - 01 - 15),
            "  ",
            "Hardware Store",
            10.0,
            None,
            None,
            vec![],
        );

        assert_eq!(result, Err(Error::EmptyDescription));
    }

    #[test]
    fn new_fails_on_blank_recipient() {
        let result = ExpenseData::new(
            date!(2026 - 01 - 15),
            "Lumber",
            "\t",
            10.0,
            None,
            None,
            vec![],
        );

        assert_eq!(result, Err(Error::EmptyRecipient));
    }

    #[test]
    fn new_fails_on_non_positive_amount() {
        for amount in [0.0, -15.5] {
            let result = ExpenseData::new(
                date!(2026 - 01 - 15),
                "Lumber",
                "Hardware Store",
                amount,
                None,
                None,
                vec![],
            );

            assert_eq!(result, Err(Error::NonPositiveAmount(amount)));
        }
    }

    #[test]
    fn new_trims_text_fields() {
        let data = ExpenseData::new(
            date!(2026 - 01 - 15),
            " Lumber ",
            " Hardware Store ",
            10.0,
            None,
            None,
            vec![],
        )
        .unwrap();

        assert_eq!(data.description, "Lumber");
        assert_eq!(data.recipient, "Hardware Store");
    }
}
