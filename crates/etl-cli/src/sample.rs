//! Deterministic sample sales data.
//!
//! Generates a flat sales table with the columns the modeler expects, then
//! dirties it the way real exports arrive: ~5% exact duplicate rows and ~3%
//! missing values in quantity, unit_price, and customer_id. The RNG is
//! seeded, so repeated runs produce byte-identical files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

const SEED: u64 = 42;

const CATEGORIES: [&str; 5] = ["Electronics", "Clothing", "Food", "Books", "Home"];
const COUNTRIES: [&str; 4] = ["US", "DE", "FR", "JP"];
const SEGMENTS: [&str; 2] = ["Consumer", "Corporate"];
const REGIONS: [&str; 4] = ["North", "South", "East", "West"];

const HEADER: [&str; 17] = [
    "transaction_id",
    "date",
    "customer_id",
    "customer_country",
    "customer_segment",
    "product_id",
    "product_name",
    "product_category",
    "product_cost",
    "seller_id",
    "seller_name",
    "seller_region",
    "quantity",
    "unit_price",
    "discount",
    "shipping_cost",
    "total_price",
];

/// What the generator produced, for the command summary.
#[derive(Debug)]
pub struct SampleStats {
    pub path: PathBuf,
    pub rows_written: usize,
    pub duplicate_rows: usize,
    pub cells_nulled: usize,
}

/// Generate `rows` base rows plus duplicates and write them as CSV.
pub fn generate_sales_csv(path: &Path, rows: usize) -> Result<SampleStats> {
    let mut rng = StdRng::seed_from_u64(SEED);

    let mut records: Vec<Vec<String>> = Vec::with_capacity(rows + rows / 20);
    for id in 1..=rows {
        records.push(sales_row(id, &mut rng));
    }

    // ~5% duplicate rows, appended as exact copies.
    let duplicate_rows = rows / 20;
    for _ in 0..duplicate_rows {
        let index = rng.gen_range(0..records.len());
        let copy = records[index].clone();
        records.push(copy);
    }
    records.shuffle(&mut rng);

    // ~3% missing values in a few columns, injected after duplication so
    // some duplicates stay exact.
    let mut cells_nulled = 0;
    for column in ["quantity", "unit_price", "customer_id"] {
        let column_index = HEADER.iter().position(|h| *h == column).unwrap();
        let nulls = records.len() * 3 / 100;
        for _ in 0..nulls {
            let row = rng.gen_range(0..records.len());
            if !records[row][column_index].is_empty() {
                records[row][column_index] = String::new();
                cells_nulled += 1;
            }
        }
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    writer.write_record(HEADER)?;
    for record in &records {
        writer.write_record(record)?;
    }
    writer.flush()?;

    info!(
        rows = records.len(),
        duplicates = duplicate_rows,
        nulled = cells_nulled,
        output = %path.display(),
        "sample data written"
    );
    Ok(SampleStats {
        path: path.to_path_buf(),
        rows_written: records.len(),
        duplicate_rows,
        cells_nulled,
    })
}

fn sales_row(id: usize, rng: &mut StdRng) -> Vec<String> {
    let customer = rng.gen_range(0..200usize);
    let product = rng.gen_range(0..100usize);
    let seller = rng.gen_range(0..40usize);
    let quantity = rng.gen_range(1..10i64);
    let unit_price = round2(rng.gen_range(10.0..500.0));
    let product_cost = round2(5.0 + (product as f64) * 1.75);
    let discount = round2(rng.gen_range(0.0..30.0));
    let shipping_cost = round2(rng.gen_range(0.0..25.0));
    let month = rng.gen_range(1..=12u32);
    let day = rng.gen_range(1..=28u32);

    vec![
        id.to_string(),
        format!("2023-{month:02}-{day:02}"),
        format!("CUST_{customer:04}"),
        COUNTRIES[customer % COUNTRIES.len()].to_string(),
        SEGMENTS[customer % SEGMENTS.len()].to_string(),
        format!("PROD_{product:03}"),
        format!("Product {product}"),
        CATEGORIES[product % CATEGORIES.len()].to_string(),
        format!("{product_cost:.2}"),
        format!("SLR_{seller:03}"),
        format!("Seller {seller}"),
        REGIONS[seller % REGIONS.len()].to_string(),
        quantity.to_string(),
        format!("{unit_price:.2}"),
        format!("{discount:.2}"),
        format!("{shipping_cost:.2}"),
        format!("{:.2}", quantity as f64 * unit_price),
    ]
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.csv");
        let second = dir.path().join("b.csv");
        generate_sales_csv(&first, 200).unwrap();
        generate_sales_csv(&second, 200).unwrap();
        assert_eq!(
            std::fs::read(&first).unwrap(),
            std::fs::read(&second).unwrap()
        );
    }

    #[test]
    fn row_counts_include_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.csv");
        let stats = generate_sales_csv(&path, 100).unwrap();
        assert_eq!(stats.rows_written, 105);
        assert_eq!(stats.duplicate_rows, 5);
        assert!(stats.cells_nulled > 0);
    }
}
