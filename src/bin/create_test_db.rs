use std::env;
use std::error::Error;
use std::path::Path;
use std::process::exit;
use std::sync::{Arc, Mutex};

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, PrimitiveDateTime, Time, UtcOffset};

use expense_tracker::{
    JwtKeys, Period, SQLiteTransactionStore, Transaction, TransactionStore, TransactionType,
    UserID, initialize_db, issue_token,
};

/// A utility for creating a test database for the expense tracker's REST API server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The ID of the user to create transactions for.
    #[arg(long, default_value_t = 1)]
    user_id: i64,
}

/// Create and populate a database for manual testing.
///
/// Transactions are created for this month and last month so that every
/// statistics route has something to show. If `JWT_SECRET` is set, a token
/// for the user is printed.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    let store = SQLiteTransactionStore::new(Arc::new(Mutex::new(conn)));
    let user_id = UserID::new(args.user_id);
    let this_month = Period::current(UtcOffset::UTC);
    let last_month = this_month.previous();

    println!("Creating transactions for user {user_id}...");

    let on = |period: Period, day: i64| {
        PrimitiveDateTime::new(period.first_day() + Duration::days(day - 1), Time::MIDNIGHT)
    };

    let transactions = [
        (last_month, 1, TransactionType::Income, "Salary", Decimal::new(300_000, 2)),
        (last_month, 1, TransactionType::Expense, "Rent", Decimal::new(120_000, 2)),
        (last_month, 8, TransactionType::Expense, "Groceries", Decimal::new(8_450, 2)),
        (last_month, 20, TransactionType::Expense, "Transport", Decimal::new(4_000, 2)),
        (this_month, 1, TransactionType::Income, "Salary", Decimal::new(300_000, 2)),
        (this_month, 1, TransactionType::Expense, "Rent", Decimal::new(120_000, 2)),
        (this_month, 1, TransactionType::Expense, "Groceries", Decimal::new(5_000, 2)),
    ];

    for (period, day, transaction_type, category, amount) in transactions {
        store.create(Transaction::build(
            user_id,
            amount,
            transaction_type,
            category,
            on(period, day),
        ))?;
    }

    match env::var("JWT_SECRET") {
        Ok(secret) => {
            let keys = JwtKeys::new(&secret);
            let token = issue_token(user_id, Duration::days(1), keys.encoding_key())
                .map_err(|error| format!("could not create token: {error:?}"))?;
            println!("Token for user {user_id} (valid for one day):\n{token}");
        }
        Err(_) => println!("Set JWT_SECRET to also print a token for user {user_id}."),
    }

    println!("Success!");

    Ok(())
}
