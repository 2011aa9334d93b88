use calamine::{open_workbook_auto, Data, Reader};
use forage_production_service::pipeline::YIELD_SHEET_NAME;
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let Some(file_path) = args.get(1) else {
        eprintln!("Usage: examine-workbook <file> [sheet]");
        std::process::exit(2);
    };

    println!("Opening workbook: {file_path}");
    let mut workbook = open_workbook_auto(file_path)?;

    let sheet_names = workbook.sheet_names().to_owned();
    println!("\nSheet names:");
    for (i, name) in sheet_names.iter().enumerate() {
        println!("  {i}: {name}");
    }

    // Default to the survey sheet when present, otherwise the first sheet
    let sheet_name = match args.get(2) {
        Some(name) => name.clone(),
        None => sheet_names
            .iter()
            .find(|name| name.as_str() == YIELD_SHEET_NAME)
            .or_else(|| sheet_names.first())
            .cloned()
            .ok_or("Workbook has no sheets")?,
    };

    println!("\n\nExamining sheet: {sheet_name}");
    println!("{}", "=".repeat(100));

    let range = workbook.worksheet_range(&sheet_name)?;

    println!("Dimensions: {:?}", range.get_size());
    println!("\nFirst 40 rows (showing first 10 columns):");
    println!("{}", "=".repeat(100));

    for (row_idx, row) in range.rows().enumerate().take(40) {
        let has_data = row.iter().any(|cell| !matches!(cell, Data::Empty));
        if has_data {
            print!("Row {:3}: ", row_idx + 1);
            for cell in row.iter().take(10) {
                match cell {
                    Data::Empty => print!("[empty] "),
                    Data::DateTime(dt) => match dt.as_datetime() {
                        Some(datetime) => print!("[date {}] ", datetime.date()),
                        None => print!("[{cell}] "),
                    },
                    _ => print!("[{cell}] "),
                }
            }
            println!();
        }
    }

    // Header row, one column per line, to check expected column names
    println!("\n{}", "=".repeat(100));
    println!("Header row (all columns):");
    println!("{}", "=".repeat(100));
    if let Some(row) = range.rows().next() {
        for (col_idx, cell) in row.iter().enumerate() {
            if !matches!(cell, Data::Empty) {
                println!("Col {:3}: {}", col_idx + 1, cell);
            }
        }
    }

    Ok(())
}
