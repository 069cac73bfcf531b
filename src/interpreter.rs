// Command Interpreter - turn an utterance into a reply and ledger writes
//
// Every utterance gets a Reply. Bad arguments become the intent's usage
// hint; storage failures become a StorageFailed reply. Nothing is raised
// to the caller.

use crate::aggregator::total_sales;
use crate::error::{LedgerError, Result};
use crate::intent::{classify, normalize, Intent};
use crate::ledger::{CustomerRecord, Ledger, ProductRecord, SaleRecord, Table};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{error, warn};

const GREETINGS: &[&str] = &[
    "Hey there! 😊",
    "Hello boss! Ready to record some sales?",
    "Hi! What are we selling today?",
];

const HELP_HINTS: &[&str] = &[
    "I'm not sure I understand 🤔. Try 'add sale apple 5 200'",
    "I can help with sales, products, and customers 💼",
    "Try 'show sales' or 'total' to begin!",
];

pub const SALE_USAGE: &str = "⚠️ Please say: add sale [product] [quantity] [price]";
pub const PRODUCT_USAGE: &str = "⚠️ Please say: add product [name] [price]";
pub const CUSTOMER_PROMPT: &str = "⚠️ Please provide a customer name.";
pub const THANKS_REPLY: &str = "You're welcome! 😄";
pub const SALES_REFRESHED: &str = "📊 Sales list refreshed!";
pub const CHAT_CLEARED: &str = "Chat cleared 🧹";
pub const FAREWELL: &str = "Goodbye 👋";

// ============================================================================
// REPLY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ReplyStatus {
    /// Handled, including informational replies
    Ok,
    /// Arguments missing or malformed; nothing was written
    Rejected,
    /// The ledger could not be read or written
    StorageFailed(String),
}

/// What the shells render after an utterance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub text: String,
    pub intent: Intent,
    /// Tables whose view is stale
    pub refresh: BTreeSet<Table>,
    /// Discard the displayed transcript
    pub clear_transcript: bool,
    /// End the session
    pub terminate: bool,
    pub status: ReplyStatus,
}

impl Reply {
    fn new(intent: Intent, text: impl Into<String>) -> Self {
        Reply {
            text: text.into(),
            intent,
            refresh: BTreeSet::new(),
            clear_transcript: false,
            terminate: false,
            status: ReplyStatus::Ok,
        }
    }

    fn rejected(intent: Intent, text: &str) -> Self {
        Reply {
            status: ReplyStatus::Rejected,
            ..Reply::new(intent, text)
        }
    }

    fn storage_failed(intent: Intent, what: &str, err: &LedgerError) -> Self {
        error!(intent = intent.name(), error = %err, "ledger failure while handling {}", what);
        Reply {
            status: ReplyStatus::StorageFailed(err.to_string()),
            ..Reply::new(intent, format!("❌ Could not {}. {}", what, err.user_message()))
        }
    }

    fn refreshing(mut self, table: Table) -> Self {
        self.refresh.insert(table);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == ReplyStatus::Ok
    }
}

// ============================================================================
// INTERPRETER
// ============================================================================

pub struct Interpreter<R = StdRng> {
    ledger: Ledger,
    rng: R,
}

impl Interpreter<StdRng> {
    pub fn new(ledger: Ledger) -> Self {
        Interpreter::with_rng(ledger, StdRng::from_entropy())
    }
}

impl<R: Rng> Interpreter<R> {
    /// Use a specific random source for greeting and hint selection
    pub fn with_rng(ledger: Ledger, rng: R) -> Self {
        Interpreter { ledger, rng }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn get_sales(&self) -> Result<Vec<SaleRecord>> {
        self.ledger.load_sales()
    }

    pub fn get_customers(&self) -> Result<Vec<CustomerRecord>> {
        self.ledger.load_customers()
    }

    pub fn get_products(&self) -> Result<Vec<ProductRecord>> {
        self.ledger.load_products()
    }

    pub fn interpret(&mut self, utterance: &str) -> Reply {
        let msg = normalize(utterance);
        let intent = classify(&msg);

        match intent {
            Intent::Greet => Reply::new(intent, self.pick(GREETINGS)),
            Intent::AddSale => self.add_sale(&msg),
            Intent::ShowTotal => self.show_total(),
            Intent::ShowSales => Reply::new(intent, SALES_REFRESHED).refreshing(Table::Sales),
            Intent::AddCustomer => self.add_customer(&msg),
            Intent::AddProduct => self.add_product(&msg),
            Intent::Thanks => Reply::new(intent, THANKS_REPLY),
            Intent::ClearChat => Reply {
                clear_transcript: true,
                ..Reply::new(intent, CHAT_CLEARED)
            },
            Intent::Exit => Reply {
                terminate: true,
                ..Reply::new(intent, FAREWELL)
            },
            Intent::Unknown => Reply::new(intent, self.pick(HELP_HINTS)),
        }
    }

    fn pick(&mut self, choices: &[&str]) -> String {
        choices
            .choose(&mut self.rng)
            .copied()
            .unwrap_or_default()
            .to_string()
    }

    fn currency(&self) -> &str {
        &self.ledger.config().currency
    }

    fn add_sale(&mut self, msg: &str) -> Reply {
        let (product, quantity, price) = match parse_sale(msg) {
            Ok(args) => args,
            Err(e) => {
                warn!(error = %e, "add sale rejected");
                return Reply::rejected(Intent::AddSale, SALE_USAGE);
            }
        };

        match self.ledger.append_sale(&product, quantity, price) {
            Ok(sale) => Reply::new(
                Intent::AddSale,
                format!(
                    "✅ Added {} {}(s) at {:.2} {} each.",
                    sale.quantity,
                    sale.product,
                    sale.unit_price,
                    self.currency()
                ),
            )
            .refreshing(Table::Sales),
            Err(e) => Reply::storage_failed(Intent::AddSale, "record the sale", &e),
        }
    }

    fn show_total(&mut self) -> Reply {
        match self.ledger.load_sales() {
            Ok(sales) => Reply::new(
                Intent::ShowTotal,
                format!("💰 Total sales so far: {:.2} {}", total_sales(&sales), self.currency()),
            ),
            Err(e) => Reply::storage_failed(Intent::ShowTotal, "read the sales", &e),
        }
    }

    fn add_customer(&mut self, msg: &str) -> Reply {
        let name = msg.replace("add customer", "");

        match self.ledger.append_customer(&name) {
            Ok(customer) => Reply::new(
                Intent::AddCustomer,
                format!("👤 Customer '{}' added successfully.", customer.name),
            )
            .refreshing(Table::Customers),
            Err(LedgerError::Validation(reason)) => {
                warn!(reason = %reason, "add customer rejected");
                Reply::rejected(Intent::AddCustomer, CUSTOMER_PROMPT)
            }
            Err(e) => Reply::storage_failed(Intent::AddCustomer, "record the customer", &e),
        }
    }

    fn add_product(&mut self, msg: &str) -> Reply {
        let (name, price) = match parse_product(msg) {
            Ok(args) => args,
            Err(e) => {
                warn!(error = %e, "add product rejected");
                return Reply::rejected(Intent::AddProduct, PRODUCT_USAGE);
            }
        };

        match self.ledger.append_product(&name, price) {
            Ok(product) => Reply::new(
                Intent::AddProduct,
                format!(
                    "📦 Product '{}' added at {:.2} {}.",
                    product.name,
                    product.price,
                    self.currency()
                ),
            )
            .refreshing(Table::Products),
            Err(e) => Reply::storage_failed(Intent::AddProduct, "record the product", &e),
        }
    }
}

// ============================================================================
// ARGUMENT EXTRACTION
// ============================================================================

/// `add sale <product> <quantity> <price>`; extra tokens are ignored
fn parse_sale(msg: &str) -> Result<(String, i64, f64)> {
    let parts: Vec<&str> = msg.split_whitespace().collect();

    let product = token(&parts, 2, "product")?;
    let quantity = token(&parts, 3, "quantity")?
        .parse::<i64>()
        .map_err(|e| LedgerError::Validation(format!("quantity: {}", e)))?;
    let price = parse_amount(token(&parts, 4, "price")?)?;

    if !(quantity as f64 * price).is_finite() {
        return Err(LedgerError::Validation(format!(
            "total of {} x {} is not a finite number",
            quantity, price
        )));
    }

    Ok((product.to_string(), quantity, price))
}

/// `add product <name> <price>`; extra tokens are ignored
fn parse_product(msg: &str) -> Result<(String, f64)> {
    let parts: Vec<&str> = msg.split_whitespace().collect();

    let name = token(&parts, 2, "name")?;
    let price = parse_amount(token(&parts, 3, "price")?)?;

    Ok((name.to_string(), price))
}

fn token<'a>(parts: &[&'a str], index: usize, what: &str) -> Result<&'a str> {
    parts
        .get(index)
        .copied()
        .ok_or_else(|| LedgerError::Validation(format!("missing {}", what)))
}

/// Any finite decimal. Sign and magnitude are not checked.
fn parse_amount(raw: &str) -> Result<f64> {
    let value = raw
        .parse::<f64>()
        .map_err(|e| LedgerError::Validation(format!("price: {}", e)))?;

    if !value.is_finite() {
        return Err(LedgerError::Validation(format!("price is not a finite number: {}", raw)));
    }

    Ok(value)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use rand::rngs::mock::StepRng;
    use tempfile::TempDir;

    fn test_interpreter() -> (TempDir, Interpreter<StepRng>) {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::open(Config::with_data_dir(dir.path())).unwrap();
        (dir, Interpreter::with_rng(ledger, StepRng::new(0, 0)))
    }

    #[test]
    fn test_add_sale() {
        let (_dir, mut bot) = test_interpreter();

        let reply = bot.interpret("add sale apple 5 200");
        assert_eq!(reply.text, "✅ Added 5 apple(s) at 200.00 CFA each.");
        assert_eq!(reply.intent, Intent::AddSale);
        assert!(reply.is_ok());
        assert!(reply.refresh.contains(&Table::Sales));

        let sales = bot.get_sales().unwrap();
        assert_eq!(sales, vec![SaleRecord::new("apple", 5, 200.0)]);
        assert_eq!(sales[0].total, 1000.0);
    }

    #[test]
    fn test_add_sale_total_is_exact_product() {
        let (_dir, mut bot) = test_interpreter();

        bot.interpret("add sale rice 3 0.1");
        let sales = bot.get_sales().unwrap();
        assert_eq!(sales[0].total, 3.0 * 0.1);
    }

    #[test]
    fn test_add_sale_non_numeric_quantity() {
        let (_dir, mut bot) = test_interpreter();

        let reply = bot.interpret("add sale apple five 100");
        assert_eq!(reply.text, SALE_USAGE);
        assert_eq!(reply.status, ReplyStatus::Rejected);
        assert!(reply.refresh.is_empty());
        assert!(bot.get_sales().unwrap().is_empty());
    }

    #[test]
    fn test_add_sale_malformed_variants() {
        let (_dir, mut bot) = test_interpreter();

        for utterance in [
            "add sale",
            "add sale apple",
            "add sale apple 5",
            "add sale apple 5 cheap",
            "add sale apple 2.5 100",
            "add sale apple 5 nan",
            "add sale apple 5 inf",
            "add sale bulk 9223372036854775807 1e300",
        ] {
            let reply = bot.interpret(utterance);
            assert_eq!(reply.text, SALE_USAGE, "utterance: {}", utterance);
        }

        assert!(bot.get_sales().unwrap().is_empty());
    }

    #[test]
    fn test_add_sale_ignores_extra_tokens() {
        let (_dir, mut bot) = test_interpreter();

        let reply = bot.interpret("ADD SALE Mango 2 150 today");
        assert_eq!(reply.text, "✅ Added 2 mango(s) at 150.00 CFA each.");
        assert_eq!(bot.get_sales().unwrap()[0].product, "mango");
    }

    #[test]
    fn test_greeting_wins_over_sale() {
        let (_dir, mut bot) = test_interpreter();

        let reply = bot.interpret("hi, add sale apple 2 100");
        assert_eq!(reply.intent, Intent::Greet);
        assert_eq!(reply.text, GREETINGS[0]);
        assert!(bot.get_sales().unwrap().is_empty());
    }

    #[test]
    fn test_random_choice_comes_from_fixed_set() {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::open(Config::with_data_dir(dir.path())).unwrap();
        let mut bot = Interpreter::with_rng(ledger, StdRng::seed_from_u64(7));

        for _ in 0..20 {
            let reply = bot.interpret("hello");
            assert!(GREETINGS.contains(&reply.text.as_str()));

            let reply = bot.interpret("what can you do");
            assert_eq!(reply.intent, Intent::Unknown);
            assert!(HELP_HINTS.contains(&reply.text.as_str()));
        }
    }

    #[test]
    fn test_show_total() {
        let (_dir, mut bot) = test_interpreter();

        assert_eq!(bot.interpret("total").text, "💰 Total sales so far: 0.00 CFA");

        bot.interpret("add sale p 2 5");
        bot.interpret("add sale p 1 3");
        assert_eq!(bot.interpret("total").text, "💰 Total sales so far: 13.00 CFA");
    }

    #[test]
    fn test_show_sales_only_signals_refresh() {
        let (_dir, mut bot) = test_interpreter();
        bot.interpret("add sale apple 5 200");

        let reply = bot.interpret("show sales");
        assert_eq!(reply.text, SALES_REFRESHED);
        assert_eq!(reply.refresh, BTreeSet::from([Table::Sales]));
        assert_eq!(bot.get_sales().unwrap().len(), 1);
        assert!(bot.get_customers().unwrap().is_empty());
        assert!(bot.get_products().unwrap().is_empty());
    }

    #[test]
    fn test_add_customer() {
        let (_dir, mut bot) = test_interpreter();

        let reply = bot.interpret("add customer john doe");
        assert_eq!(reply.text, "👤 Customer 'John doe' added successfully.");
        assert_eq!(reply.refresh, BTreeSet::from([Table::Customers]));
        assert_eq!(bot.get_customers().unwrap()[0].name, "John doe");
    }

    #[test]
    fn test_add_customer_without_name() {
        let (_dir, mut bot) = test_interpreter();

        let reply = bot.interpret("add customer   ");
        assert_eq!(reply.text, CUSTOMER_PROMPT);
        assert_eq!(reply.status, ReplyStatus::Rejected);
        assert!(reply.refresh.is_empty());
        assert!(bot.get_customers().unwrap().is_empty());
    }

    #[test]
    fn test_add_product() {
        let (_dir, mut bot) = test_interpreter();

        let reply = bot.interpret("add product rice 400");
        assert_eq!(reply.text, "📦 Product 'rice' added at 400.00 CFA.");
        assert_eq!(reply.refresh, BTreeSet::from([Table::Products]));

        let reply = bot.interpret("add product rice");
        assert_eq!(reply.text, PRODUCT_USAGE);
        assert_eq!(bot.get_products().unwrap().len(), 1);
    }

    #[test]
    fn test_product_price_is_permissive() {
        let (_dir, mut bot) = test_interpreter();

        let reply = bot.interpret("add product sample -5");
        assert!(reply.is_ok());
        assert_eq!(bot.get_products().unwrap()[0].price, -5.0);
    }

    #[test]
    fn test_session_signals() {
        let (_dir, mut bot) = test_interpreter();

        let reply = bot.interpret("thank you");
        assert_eq!(reply.text, THANKS_REPLY);

        let reply = bot.interpret("clear");
        assert_eq!(reply.text, CHAT_CLEARED);
        assert!(reply.clear_transcript);
        assert!(!reply.terminate);

        let reply = bot.interpret("bye");
        assert_eq!(reply.text, FAREWELL);
        assert!(reply.terminate);
    }

    #[test]
    fn test_currency_from_config() {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::open(Config::with_data_dir(dir.path()).with_currency("EUR")).unwrap();
        let mut bot = Interpreter::with_rng(ledger, StepRng::new(0, 0));

        let reply = bot.interpret("add sale apple 1 2.5");
        assert_eq!(reply.text, "✅ Added 1 apple(s) at 2.50 EUR each.");
    }

    #[test]
    fn test_storage_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("shop");
        let ledger = Ledger::open(Config::with_data_dir(&data_dir)).unwrap();
        let mut bot = Interpreter::with_rng(ledger, StepRng::new(0, 0));

        std::fs::remove_dir(&data_dir).unwrap();
        std::fs::write(&data_dir, "not a directory").unwrap();

        let reply = bot.interpret("add sale apple 5 200");
        assert!(matches!(reply.status, ReplyStatus::StorageFailed(_)));
        assert!(reply.text.starts_with("❌"));
        assert!(reply.refresh.is_empty());
    }
}
