// Session - the state both shells render
//
// Holds the loaded tables and the chat transcript. Replies are applied
// here so the shells only draw.

use crate::error::Result;
use crate::interpreter::{Interpreter, Reply};
use crate::ledger::{CustomerRecord, Ledger, ProductRecord, SaleRecord, Table};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::error;

pub const WELCOME: &str = "Hello! I'm your AI Sales Manager 🤖\nTry 'add sale apple 5 200' to begin.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    User,
    Bot,
}

impl Role {
    pub fn label(&self) -> &str {
        match self {
            Role::User => "You",
            Role::Bot => "Bot",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: &str) -> Self {
        ChatMessage {
            role,
            content: content.to_string(),
            at: Utc::now(),
        }
    }
}

pub struct Session {
    pub transcript: Vec<ChatMessage>,
    pub sales: Vec<SaleRecord>,
    pub customers: Vec<CustomerRecord>,
    pub products: Vec<ProductRecord>,
    /// Set once an Exit reply has been applied
    pub ended: bool,
}

impl Session {
    /// Load every table and greet
    pub fn open(ledger: &Ledger) -> Result<Self> {
        Ok(Session {
            transcript: vec![ChatMessage::new(Role::Bot, WELCOME)],
            sales: ledger.load_sales()?,
            customers: ledger.load_customers()?,
            products: ledger.load_products()?,
            ended: false,
        })
    }

    /// Run one utterance through the interpreter and apply the reply.
    /// Blank input is ignored.
    pub fn submit<R: Rng>(&mut self, interpreter: &mut Interpreter<R>, utterance: &str) -> Option<Reply> {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return None;
        }

        self.transcript.push(ChatMessage::new(Role::User, utterance));
        let reply = interpreter.interpret(utterance);
        self.apply(interpreter.ledger(), &reply);

        Some(reply)
    }

    fn apply(&mut self, ledger: &Ledger, reply: &Reply) {
        for table in &reply.refresh {
            if let Err(e) = self.reload(ledger, *table) {
                error!(table = table.name(), error = %e, "failed to reload table");
            }
        }

        if reply.clear_transcript {
            self.transcript.clear();
        }
        self.transcript.push(ChatMessage::new(Role::Bot, &reply.text));

        if reply.terminate {
            self.ended = true;
        }
    }

    pub fn reload(&mut self, ledger: &Ledger, table: Table) -> Result<()> {
        match table {
            Table::Sales => self.sales = ledger.load_sales()?,
            Table::Customers => self.customers = ledger.load_customers()?,
            Table::Products => self.products = ledger.load_products()?,
        }
        Ok(())
    }
}
