//! Read-time expansion of recurring expense templates into virtual expense
//! instances.

use time::{Date, Month, util::days_in_year_month};

use crate::{expense::ExpenseInstance, recurring::RecurringExpense};

/// Expand templates into one virtual instance per elapsed month.
///
/// An instance is produced for every month from the template's start through
/// its end, but never past the month containing `today`. The instance lands
/// on the template's day of month, clamped to the last day of short months,
/// so a template on the 31st produces Feb 28 (or 29).
///
/// `start_date` and `end_date` filter the produced instances by their dates,
/// both bounds inclusive.
pub fn expand_recurring_expenses(
    templates: &[RecurringExpense],
    today: Date,
    start_date: Option<Date>,
    end_date: Option<Date>,
) -> Vec<ExpenseInstance> {
    let current = (today.year(), today.month() as u8);
    let mut instances = Vec::new();

    for template in templates {
        let last = match (template.end_year, template.end_month) {
            (Some(end_year), Some(end_month)) => (end_year, end_month).min(current),
            _ => current,
        };

        let (mut year, mut month) = (template.start_year, template.start_month);

        while (year, month) <= last {
            let date = instance_date(year, month, template.day_of_month);

            let before_start = start_date.is_some_and(|bound| date < bound);
            let after_end = end_date.is_some_and(|bound| date > bound);

            if !before_start && !after_end {
                instances.push(ExpenseInstance {
                    id: None,
                    date,
                    description: template.description.clone(),
                    recipient: template.recipient.clone(),
                    amount: template.amount,
                    materials: None,
                    hours: None,
                    mileage_log_id: None,
                    recurring_expense_id: Some(template.id),
                    tags: template.tags.clone(),
                });
            }

            (year, month) = next_month(year, month);
        }
    }

    instances
}

fn instance_date(year: i32, month: u8, day_of_month: u8) -> Date {
    // Month is validated to 1-12 before a template is stored.
    let month = Month::try_from(month).unwrap_or(Month::January);
    let day = day_of_month.min(days_in_year_month(year, month));

    Date::from_calendar_date(year, month, day)
        .unwrap_or_else(|_| Date::from_calendar_date(year, month, 1).unwrap_or(Date::MIN))
}

fn next_month(year: i32, month: u8) -> (i32, u8) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}
