use std::error::Error;
use std::path::Path;
use std::process::exit;
use std::sync::Mutex;

use clap::Parser;

use family_ledger::{RecordForm, create_transaction, open_connection};

/// A utility for creating a test database for the family ledger server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// A month of typical household records: (amount, category, type, note).
const SAMPLE_RECORDS: [(&str, &str, &str, &str); 8] = [
    ("8500.00", "工资", "income", "Monthly salary"),
    ("42.50", "餐饮", "expense", ""),
    ("3200.00", "Rent", "expense", "October"),
    ("12.80", "Transport", "expense", "Metro card top up"),
    ("268.40", "Groceries", "expense", ""),
    ("150.00", "Side job", "income", "Weekend tutoring"),
    ("89.90", "Utilities", "expense", "Electricity"),
    ("35.00", "餐饮", "expense", "Lunch with colleagues"),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    if output_path
        .extension()
        .is_none_or(|extension| extension.is_empty())
    {
        eprintln!("Output path must include a file extension (e.g., 'ledger.db').");
        exit(1);
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Mutex::new(open_connection(output_path)?);

    println!("Creating sample records...");

    for (amount, category, record_type, note) in SAMPLE_RECORDS {
        let form = RecordForm {
            amount: Some(amount.into()),
            category: Some(category.to_owned()),
            record_type: Some(record_type.to_owned()),
            note: Some(note.to_owned()),
        };

        create_transaction(form, &connection)?;
    }

    println!("Success!");

    Ok(())
}
