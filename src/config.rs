// Where the three tables live and how amounts are labelled

use clap::Args;
use std::path::{Path, PathBuf};

pub const DEFAULT_SALES_FILE: &str = "sales_data.csv";
pub const DEFAULT_CUSTOMERS_FILE: &str = "customers.csv";
pub const DEFAULT_PRODUCTS_FILE: &str = "products.csv";
pub const DEFAULT_CURRENCY: &str = "CFA";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding all three table files
    pub data_dir: PathBuf,
    pub sales_file: String,
    pub customers_file: String,
    pub products_file: String,
    /// Label printed after every amount
    pub currency: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("."),
            sales_file: DEFAULT_SALES_FILE.to_string(),
            customers_file: DEFAULT_CUSTOMERS_FILE.to_string(),
            products_file: DEFAULT_PRODUCTS_FILE.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl Config {
    /// Default file names under `dir`
    pub fn with_data_dir<P: AsRef<Path>>(dir: P) -> Self {
        Config {
            data_dir: dir.as_ref().to_path_buf(),
            ..Config::default()
        }
    }

    /// Builder pattern: override the currency label
    pub fn with_currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_string();
        self
    }

    pub fn sales_path(&self) -> PathBuf {
        self.data_dir.join(&self.sales_file)
    }

    pub fn customers_path(&self) -> PathBuf {
        self.data_dir.join(&self.customers_file)
    }

    pub fn products_path(&self) -> PathBuf {
        self.data_dir.join(&self.products_file)
    }
}

/// Command line / environment options shared by both binaries
#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Directory holding the CSV tables
    #[arg(long, env = "SALES_BOT_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Currency label shown after amounts
    #[arg(long, env = "SALES_BOT_CURRENCY", default_value = DEFAULT_CURRENCY)]
    pub currency: String,
}

impl ConfigArgs {
    pub fn into_config(self) -> Config {
        Config::with_data_dir(self.data_dir).with_currency(&self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_file_names() {
        let config = Config::default();
        assert_eq!(config.sales_path(), PathBuf::from("./sales_data.csv"));
        assert_eq!(config.customers_path(), PathBuf::from("./customers.csv"));
        assert_eq!(config.products_path(), PathBuf::from("./products.csv"));
        assert_eq!(config.currency, "CFA");
    }

    #[test]
    fn test_relocated_data_dir() {
        let config = Config::with_data_dir("/tmp/shop").with_currency("EUR");
        assert_eq!(config.sales_path(), PathBuf::from("/tmp/shop/sales_data.csv"));
        assert_eq!(config.currency, "EUR");
    }

    #[test]
    fn test_args_into_config() {
        let args = ConfigArgs {
            data_dir: PathBuf::from("data"),
            currency: "XOF".to_string(),
        };
        let config = args.into_config();
        assert_eq!(config.products_path(), PathBuf::from("data/products.csv"));
        assert_eq!(config.currency, "XOF");
    }
}
