//! The layered model build: raw -> cleaned -> modeled.
//!
//! Raw is the extracted table persisted as-is. Cleaned drops exact
//! duplicates and rows missing a natural key or measure. Modeled is the
//! star schema (dimensions + fact) plus the canned report tables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, info_span};

use etl_core::config::{MissingValueStrategy, WriteMode};
use etl_core::frame::SourceFrame;
use etl_load::{write_csv, write_parquet};
use etl_model::{
    StarSchema, build_star_schema, columns, revenue_by_category, revenue_by_month, top_customers,
};
use etl_transform::{handle_missing_values, remove_duplicates};

/// How many customers the top-customers report keeps.
const TOP_CUSTOMER_LIMIT: usize = 10;

#[derive(Debug)]
pub struct LayerReport {
    pub name: String,
    pub rows: usize,
}

#[derive(Debug)]
pub struct ModelSummary {
    pub output_dir: PathBuf,
    pub layers: Vec<LayerReport>,
}

/// Build all three layers under `output_dir`.
pub fn run_model(source: &Path, output_dir: &Path) -> Result<ModelSummary> {
    let span = info_span!("model", source = %source.display());
    let _guard = span.enter();
    let mut layers = Vec::new();

    // Raw layer: the extracted table, persisted untouched.
    let raw = etl_extract::extract_from_csv(source).context("extract source table")?;
    let raw_path = output_dir.join("raw/sales.parquet");
    write_parquet(&raw, &raw_path, WriteMode::Overwrite).context("write raw layer")?;
    layers.push(LayerReport {
        name: "raw".to_string(),
        rows: raw.row_count(),
    });

    // Cleaned layer: exact duplicates out, then rows missing a natural key
    // or a measure.
    let required: Vec<String> = [
        columns::TRANSACTION_ID,
        columns::DATE,
        columns::CUSTOMER_ID,
        columns::PRODUCT_ID,
        columns::SELLER_ID,
        columns::QUANTITY,
        columns::UNIT_PRICE,
        columns::DISCOUNT,
        columns::SHIPPING_COST,
        columns::PRODUCT_COST,
    ]
    .iter()
    .map(|name| (*name).to_string())
    .collect();
    let deduped = remove_duplicates(&raw.data, None).context("deduplicate")?;
    let cleaned_data =
        handle_missing_values(&deduped, MissingValueStrategy::Drop, Some(&required), None)
            .context("drop incomplete rows")?;
    let cleaned = SourceFrame::new("cleaned", cleaned_data);
    let cleaned_path = output_dir.join("cleaned/sales.parquet");
    write_parquet(&cleaned, &cleaned_path, WriteMode::Overwrite).context("write cleaned layer")?;
    info!(
        raw = raw.row_count(),
        cleaned = cleaned.row_count(),
        "cleaning complete"
    );
    layers.push(LayerReport {
        name: "cleaned".to_string(),
        rows: cleaned.row_count(),
    });

    // Modeled layer: star schema and reports.
    let star = build_star_schema(&cleaned.data).context("build star schema")?;
    write_star(&star, output_dir, &mut layers)?;
    write_reports(&star, output_dir)?;

    Ok(ModelSummary {
        output_dir: output_dir.to_path_buf(),
        layers,
    })
}

fn write_star(star: &StarSchema, output_dir: &Path, layers: &mut Vec<LayerReport>) -> Result<()> {
    for dimension in star.dimensions() {
        let name = format!("dim_{}", dimension.name);
        let path = output_dir.join(format!("modeled/{name}.parquet"));
        let frame = SourceFrame::new(name.clone(), dimension.data.clone());
        write_parquet(&frame, &path, WriteMode::Overwrite)
            .with_context(|| format!("write {name}"))?;
        layers.push(LayerReport {
            name,
            rows: dimension.row_count(),
        });
    }
    let fact = SourceFrame::new("fact_sales", star.fact.clone());
    let fact_path = output_dir.join("modeled/fact_sales.parquet");
    write_parquet(&fact, &fact_path, WriteMode::Overwrite).context("write fact_sales")?;
    layers.push(LayerReport {
        name: "fact_sales".to_string(),
        rows: star.fact.height(),
    });
    Ok(())
}

fn write_reports(star: &StarSchema, output_dir: &Path) -> Result<()> {
    let reports = [
        ("revenue_by_category", revenue_by_category(star)?),
        ("revenue_by_month", revenue_by_month(star)?),
        ("top_customers", top_customers(star, TOP_CUSTOMER_LIMIT)?),
    ];
    for (name, data) in reports {
        let path = output_dir.join(format!("modeled/reports/{name}.csv"));
        let frame = SourceFrame::new(name.to_string(), data);
        write_csv(&frame, &path, WriteMode::Overwrite)
            .with_context(|| format!("write report {name}"))?;
    }
    Ok(())
}
