//! Transaction aggregation for monthly statistics.
//!
//! Every function here is pure: it takes the transactions already loaded
//! from the store and never touches the database. Transactions belonging to
//! another user or falling outside the requested window are ignored, so the
//! results are correct even if the caller passes a wider set of records.

use std::{collections::HashMap, ops::RangeInclusive};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use time::{PrimitiveDateTime, Time};

use crate::{
    Error,
    auth::UserID,
    stats::period::Period,
    transaction::{Transaction, TransactionType},
};

/// One category's share of a month's expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    /// The category label.
    pub category: String,
    /// The total spent in the category.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    /// The category's share of total expenses as a percentage, to one decimal place.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub percentage: Decimal,
}

/// Totals and a per-category breakdown of one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    /// The month that was summarised, 1 to 12.
    pub month: u8,
    /// The year that was summarised.
    pub year: i32,
    /// The sum of all expenses in the month.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub total_expense: Decimal,
    /// The sum of all income in the month.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub total_income: Decimal,
    /// The currency code the amounts are in.
    pub currency: String,
    /// Expenses per category in the order each category was first seen.
    pub breakdown: Vec<CategoryBreakdown>,
}

/// A category's expenses in a month and in the month before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryComparison {
    /// The category label.
    pub category: String,
    /// The total spent in the category in the requested month.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub this_month: Decimal,
    /// The total spent in the category in the month before.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub last_month: Decimal,
}

/// Total expenses so far this month compared with all of last month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalComparison {
    /// Expenses from the start of this month up to now.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub this_month_total: Decimal,
    /// Expenses over the whole of last month.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub last_month_total: Decimal,
    /// `this_month_total - last_month_total`.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub difference: Decimal,
    /// The difference as a percentage of last month's total, to one decimal
    /// place. Zero when nothing was spent last month.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub percentage_change: Decimal,
    /// The currency code the amounts are in.
    pub currency: String,
    /// A sentence describing the change for display.
    pub message: String,
}

/// Per-category sums that remember the order categories were first seen in.
#[derive(Debug, Default)]
struct CategoryTotals {
    totals: Vec<(String, Decimal)>,
    positions: HashMap<String, usize>,
}

impl CategoryTotals {
    fn add(&mut self, category: &str, amount: Decimal) -> Result<(), Error> {
        match self.positions.get(category) {
            Some(&position) => {
                let total = &mut self.totals[position].1;
                *total = checked_sum(*total, amount)?;
            }
            None => {
                self.positions
                    .insert(category.to_owned(), self.totals.len());
                self.totals.push((category.to_owned(), amount));
            }
        }

        Ok(())
    }

    fn get(&self, category: &str) -> Decimal {
        self.positions
            .get(category)
            .map_or(Decimal::ZERO, |&position| self.totals[position].1)
    }

    fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.totals
            .iter()
            .map(|(category, amount)| (category.as_str(), *amount))
    }
}

fn checked_sum(total: Decimal, amount: Decimal) -> Result<Decimal, Error> {
    total.checked_add(amount).ok_or(Error::AmountOverflow)
}

fn transactions_in<'a>(
    transactions: &'a [Transaction],
    user_id: UserID,
    date_range: &'a RangeInclusive<PrimitiveDateTime>,
) -> impl Iterator<Item = &'a Transaction> {
    transactions.iter().filter(move |transaction| {
        transaction.user_id == user_id && date_range.contains(&transaction.date)
    })
}

fn expenses_by_category(
    transactions: &[Transaction],
    user_id: UserID,
    date_range: &RangeInclusive<PrimitiveDateTime>,
) -> Result<CategoryTotals, Error> {
    let mut totals = CategoryTotals::default();

    for transaction in transactions_in(transactions, user_id, date_range)
        .filter(|transaction| transaction.transaction_type == TransactionType::Expense)
    {
        totals.add(&transaction.category, transaction.amount)?;
    }

    Ok(totals)
}

fn total_expenses(
    transactions: &[Transaction],
    user_id: UserID,
    date_range: &RangeInclusive<PrimitiveDateTime>,
) -> Result<Decimal, Error> {
    transactions_in(transactions, user_id, date_range)
        .filter(|transaction| transaction.transaction_type == TransactionType::Expense)
        .try_fold(Decimal::ZERO, |total, transaction| {
            checked_sum(total, transaction.amount)
        })
}

/// `part` as a percentage of `whole`, rounded half away from zero to one
/// decimal place. Zero when `whole` is zero.
///
/// # Errors
/// Returns [Error::AmountOverflow] if the percentage does not fit in a [Decimal].
pub(crate) fn percentage_of(part: Decimal, whole: Decimal) -> Result<Decimal, Error> {
    if whole.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let mut percentage = part
        .checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or(Error::AmountOverflow)?
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    percentage.rescale(1);

    Ok(percentage)
}

/// Summarise `user_id`'s transactions in `period`.
///
/// Expenses and income are totalled separately. Expenses are also broken
/// down by category, in the order each category first appears in
/// `transactions`.
///
/// # Errors
/// Returns [Error::AmountOverflow] if a total does not fit in a [Decimal].
pub fn summarize_month(
    transactions: &[Transaction],
    user_id: UserID,
    period: Period,
    currency: &str,
) -> Result<MonthlySummary, Error> {
    let date_range = period.date_time_range();
    let mut total_expense = Decimal::ZERO;
    let mut total_income = Decimal::ZERO;
    let mut by_category = CategoryTotals::default();

    for transaction in transactions_in(transactions, user_id, &date_range) {
        match transaction.transaction_type {
            TransactionType::Expense => {
                total_expense = checked_sum(total_expense, transaction.amount)?;
                by_category.add(&transaction.category, transaction.amount)?;
            }
            TransactionType::Income => {
                total_income = checked_sum(total_income, transaction.amount)?;
            }
        }
    }

    let breakdown = by_category
        .iter()
        .map(|(category, amount)| {
            Ok(CategoryBreakdown {
                category: category.to_owned(),
                amount,
                percentage: percentage_of(amount, total_expense)?,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(MonthlySummary {
        month: period.month(),
        year: period.year(),
        total_expense,
        total_income,
        currency: currency.to_owned(),
        breakdown,
    })
}

/// Compare `user_id`'s expenses per category in `period` with the month before.
///
/// The result holds every category with a non-zero total in either month,
/// with zero for the month it was absent from. Categories are ordered by
/// first appearance in `period`, followed by those only seen the month before.
///
/// # Errors
/// Returns [Error::AmountOverflow] if a total does not fit in a [Decimal].
pub fn compare_categories(
    transactions: &[Transaction],
    user_id: UserID,
    period: Period,
) -> Result<Vec<CategoryComparison>, Error> {
    let this_month = expenses_by_category(transactions, user_id, &period.date_time_range())?;
    let last_month =
        expenses_by_category(transactions, user_id, &period.previous().date_time_range())?;

    let this_month_rows = this_month.iter().map(|(category, amount)| CategoryComparison {
        category: category.to_owned(),
        this_month: amount,
        last_month: last_month.get(category),
    });

    let last_month_only_rows = last_month
        .iter()
        .filter(|(category, _)| !this_month.positions.contains_key(*category))
        .map(|(category, amount)| CategoryComparison {
            category: category.to_owned(),
            this_month: Decimal::ZERO,
            last_month: amount,
        });

    Ok(this_month_rows
        .chain(last_month_only_rows)
        .filter(|row| !(row.this_month.is_zero() && row.last_month.is_zero()))
        .collect())
}

/// Compare `user_id`'s total expenses from the start of the month containing
/// `now` up to `now` against the whole of the previous month.
///
/// # Errors
/// Returns [Error::AmountOverflow] if a total or the percentage change does
/// not fit in a [Decimal].
pub fn compare_totals(
    transactions: &[Transaction],
    user_id: UserID,
    now: PrimitiveDateTime,
    currency: &str,
) -> Result<TotalComparison, Error> {
    let this_period = Period::containing(now.date());
    let this_month_range = PrimitiveDateTime::new(this_period.first_day(), Time::MIDNIGHT)..=now;

    let this_month_total = total_expenses(transactions, user_id, &this_month_range)?;
    let last_month_total = total_expenses(
        transactions,
        user_id,
        &this_period.previous().date_time_range(),
    )?;
    let difference = this_month_total
        .checked_sub(last_month_total)
        .ok_or(Error::AmountOverflow)?;

    Ok(TotalComparison {
        this_month_total,
        last_month_total,
        difference,
        percentage_change: percentage_of(difference, last_month_total)?,
        currency: currency.to_owned(),
        message: describe_difference(difference),
    })
}

fn describe_difference(difference: Decimal) -> String {
    let amount = difference
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    if difference.is_sign_positive() && !difference.is_zero() {
        format!("Spent ${amount:.2} more than last month.")
    } else if difference.is_zero() {
        "Spent the same as last month.".to_owned()
    } else {
        format!("Spent ${amount:.2} less than last month.")
    }
}
