//! Core recurring expense domain types.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::{Error, tag::Tag};

/// Database identifier for a recurring expense template.
pub type RecurringExpenseId = i64;

/// The years a template may start or end in.
const YEAR_RANGE: RangeInclusive<i32> = 1900..=2100;

/// A monthly recurring expense template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringExpense {
    /// The template's database ID.
    pub id: RecurringExpenseId,
    /// What the recurring cost is for.
    pub description: String,
    /// Who is paid each month.
    pub recipient: String,
    /// The amount charged each month.
    pub amount: f64,
    /// The day of the month the charge lands on, 1 to 31.
    ///
    /// Days past the end of a short month are clamped to the month's last
    /// day when instances are expanded.
    pub day_of_month: u8,
    /// The year of the first charge.
    pub start_year: i32,
    /// The month of the first charge, 1 to 12.
    pub start_month: u8,
    /// The year of the final charge. `None` means the template is open-ended.
    pub end_year: Option<i32>,
    /// The month of the final charge, 1 to 12.
    pub end_month: Option<u8>,
    /// The tags attached to every expanded instance.
    pub tags: Vec<Tag>,
}

/// Validated input for creating or updating a recurring expense template.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringExpenseData {
    /// What the recurring cost is for.
    pub description: String,
    /// Who is paid each month.
    pub recipient: String,
    /// The amount charged each month.
    pub amount: f64,
    /// The day of the month the charge lands on.
    pub day_of_month: u8,
    /// The year of the first charge.
    pub start_year: i32,
    /// The month of the first charge.
    pub start_month: u8,
    /// The year of the final charge, if the template ends.
    pub end_year: Option<i32>,
    /// The month of the final charge, if the template ends.
    pub end_month: Option<u8>,
    /// Tag names to attach, created for the user if they do not exist yet.
    pub tags: Vec<String>,
}

impl RecurringExpenseData {
    /// Validate raw recurring expense fields.
    ///
    /// An end year without an end month (or vice versa) is rejected as an
    /// invalid month, since a half-specified end cannot be compared against
    /// the start.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        description: &str,
        recipient: &str,
        amount: f64,
        day_of_month: u8,
        start_year: i32,
        start_month: u8,
        end_year: Option<i32>,
        end_month: Option<u8>,
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

        if !(1..=31).contains(&day_of_month) {
            return Err(Error::InvalidDayOfMonth(day_of_month));
        }

        if !(1..=12).contains(&start_month) {
            return Err(Error::InvalidMonth(start_month));
        }

        // Expansion walks month by month from the start, so an unbounded
        // year would turn every expense listing into a months-long loop.
        if !YEAR_RANGE.contains(&start_year) {
            return Err(Error::InvalidYear(start_year));
        }

        match (end_year, end_month) {
            (None, None) => {}
            (Some(_), None) | (None, Some(_)) => {
                return Err(Error::InvalidMonth(end_month.unwrap_or(0)));
            }
            (Some(end_year), Some(end_month)) => {
                if !(1..=12).contains(&end_month) {
                    return Err(Error::InvalidMonth(end_month));
                }

                if !YEAR_RANGE.contains(&end_year) {
                    return Err(Error::InvalidYear(end_year));
                }

                if (end_year, end_month) < (start_year, start_month) {
                    return Err(Error::EndBeforeStart);
                }
            }
        }

        Ok(Self {
            description: description.to_owned(),
            recipient: recipient.to_owned(),
            amount,
            day_of_month,
            start_year,
            start_month,
            end_year,
            end_month,
            tags,
        })
    }
}
