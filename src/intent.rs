// Intent Matcher - classify an utterance by keyword containment
//
// Triggers are data, checked in a fixed order. The first intent with a
// trigger contained in the normalized utterance wins, so "hi ... bye" is a
// greeting and "add customer hilda" is a greeting too.

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    Greet,
    AddSale,
    ShowTotal,
    ShowSales,
    AddCustomer,
    AddProduct,
    Thanks,
    ClearChat,
    Exit,
    Unknown,
}

impl Intent {
    pub fn name(&self) -> &str {
        match self {
            Intent::Greet => "greet",
            Intent::AddSale => "add_sale",
            Intent::ShowTotal => "show_total",
            Intent::ShowSales => "show_sales",
            Intent::AddCustomer => "add_customer",
            Intent::AddProduct => "add_product",
            Intent::Thanks => "thanks",
            Intent::ClearChat => "clear_chat",
            Intent::Exit => "exit",
            Intent::Unknown => "unknown",
        }
    }
}

/// Priority order. Do not reorder.
const TRIGGERS: &[(Intent, &[&str])] = &[
    (Intent::Greet, &["hello", "hi"]),
    (Intent::AddSale, &["add sale"]),
    (Intent::ShowTotal, &["total"]),
    (Intent::ShowSales, &["show sales", "view sales"]),
    (Intent::AddCustomer, &["add customer"]),
    (Intent::AddProduct, &["add product"]),
    (Intent::Thanks, &["thank"]),
    (Intent::ClearChat, &["clear"]),
    (Intent::Exit, &["bye"]),
];

/// Lowercase and trim, the form every trigger and extractor works on
pub fn normalize(utterance: &str) -> String {
    utterance.trim().to_lowercase()
}

pub fn classify(utterance: &str) -> Intent {
    let msg = normalize(utterance);

    let intent = TRIGGERS
        .iter()
        .find(|(_, triggers)| triggers.iter().any(|t| msg.contains(t)))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::Unknown);

    debug!(intent = intent.name(), "utterance classified");
    intent
}
