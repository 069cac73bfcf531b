// Ledger Store - append-only CSV tables for sales, customers and products
//
// One headerless CSV file per table, one row per record, fields in
// declaration order. Rows are never rewritten.

use crate::config::Config;
use crate::error::{LedgerError, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::Path;
use tracing::{debug, info, warn};

// ============================================================================
// RECORDS
// ============================================================================

/// One recorded sale. `total` is always `quantity * unit_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub product: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub total: f64,
}

impl SaleRecord {
    /// Build a sale, computing its total
    pub fn new(product: &str, quantity: i64, unit_price: f64) -> Self {
        SaleRecord {
            product: product.to_string(),
            quantity,
            unit_price,
            total: quantity as f64 * unit_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    pub price: f64,
}

/// The three tables, used as refresh targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Table {
    Sales,
    Customers,
    Products,
}

impl Table {
    pub fn name(&self) -> &str {
        match self {
            Table::Sales => "sales",
            Table::Customers => "customers",
            Table::Products => "products",
        }
    }
}

/// Trim, then upper-case the first character and lower-case the rest
pub fn normalize_name(raw: &str) -> String {
    let mut chars = raw.trim().chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

// ============================================================================
// LEDGER
// ============================================================================

pub struct Ledger {
    config: Config,
}

impl Ledger {
    /// Open the ledger, creating the data directory if needed.
    /// Table files are created lazily on first append.
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;
        debug!(data_dir = ?config.data_dir, "ledger opened");
        Ok(Ledger { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Append a sale and return the stored record
    pub fn append_sale(&self, product: &str, quantity: i64, unit_price: f64) -> Result<SaleRecord> {
        let sale = SaleRecord::new(product, quantity, unit_price);
        append_row(&self.config.sales_path(), &sale)?;
        info!(product = %sale.product, quantity, unit_price, total = sale.total, "sale recorded");
        Ok(sale)
    }

    /// Append a customer; the name is normalized first and must not be empty
    pub fn append_customer(&self, name: &str) -> Result<CustomerRecord> {
        let name = normalize_name(name);
        if name.is_empty() {
            return Err(LedgerError::Validation("customer name is empty".to_string()));
        }

        let customer = CustomerRecord { name };
        append_row(&self.config.customers_path(), &customer)?;
        info!(name = %customer.name, "customer recorded");
        Ok(customer)
    }

    /// Append a product. The price is stored as given.
    pub fn append_product(&self, name: &str, price: f64) -> Result<ProductRecord> {
        let product = ProductRecord {
            name: name.to_string(),
            price,
        };
        append_row(&self.config.products_path(), &product)?;
        info!(name = %product.name, price, "product recorded");
        Ok(product)
    }

    /// Full sales table in insertion order
    pub fn load_sales(&self) -> Result<Vec<SaleRecord>> {
        let rows: Vec<(String, i64, f64, f64)> = load_rows(&self.config.sales_path())?;

        Ok(rows
            .into_iter()
            .map(|(product, quantity, unit_price, stored_total)| {
                let sale = SaleRecord::new(&product, quantity, unit_price);
                if sale.total != stored_total {
                    warn!(
                        product = %sale.product,
                        stored_total,
                        computed_total = sale.total,
                        "stored sale total disagrees with quantity * price"
                    );
                }
                sale
            })
            .collect())
    }

    pub fn load_customers(&self) -> Result<Vec<CustomerRecord>> {
        load_rows(&self.config.customers_path())
    }

    pub fn load_products(&self) -> Result<Vec<ProductRecord>> {
        load_rows(&self.config.products_path())
    }
}

/// Append one row and sync it to disk before returning
fn append_row<T: Serialize>(path: &Path, row: &T) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer.serialize(row)?;

    let file = writer
        .into_inner()
        .map_err(|e| LedgerError::Io(e.into_error()))?;
    file.sync_all()?;

    Ok(())
}

/// Read a whole table. A missing file is an empty table.
fn load_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    let rows = rdr.deserialize().collect::<std::result::Result<Vec<T>, _>>()?;
    debug!(path = ?path, rows = rows.len(), "table loaded");

    Ok(rows)
}

// ============================================================================
// TESTS
// ============================================================================
