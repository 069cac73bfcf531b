// Web shell - server-rendered chat page plus a JSON API
//
// All handlers share one Session behind a mutex. The page is rebuilt from
// the session on every GET; the chat form posts and redirects back.

use crate::aggregator::summarize;
use crate::interpreter::{Interpreter, Reply, ReplyStatus};
use crate::ledger::Ledger;
use crate::session::{Role, Session};
use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

pub struct Shared {
    pub interpreter: Interpreter,
    pub session: Session,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Mutex<Shared>>,
}

impl AppState {
    pub fn new(interpreter: Interpreter) -> crate::Result<Self> {
        let session = Session::open(interpreter.ledger())?;
        Ok(AppState {
            inner: Arc::new(Mutex::new(Shared {
                interpreter,
                session,
            })),
        })
    }

    pub fn lock(&self) -> MutexGuard<'_, Shared> {
        // A panicked handler leaves the tables on disk intact
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

fn respond<T: Serialize>(what: &str, result: crate::Result<T>) -> axum::response::Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))).into_response(),
        Err(e) => {
            error!(error = %e, "failed to load {}", what);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<T>::failed(e.user_message())),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/sales
async fn get_sales(State(state): State<AppState>) -> impl IntoResponse {
    let shared = state.lock();
    respond("sales", shared.interpreter.get_sales())
}

/// GET /api/customers
async fn get_customers(State(state): State<AppState>) -> impl IntoResponse {
    let shared = state.lock();
    respond("customers", shared.interpreter.get_customers())
}

/// GET /api/products
async fn get_products(State(state): State<AppState>) -> impl IntoResponse {
    let shared = state.lock();
    respond("products", shared.interpreter.get_products())
}

/// GET /api/total - Running total and counts
async fn get_total(State(state): State<AppState>) -> impl IntoResponse {
    let shared = state.lock();
    respond("total", shared.interpreter.get_sales().map(|sales| summarize(&sales)))
}

/// POST /api/interpret - Run one utterance, return the reply
async fn interpret(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> impl IntoResponse {
    let mut shared = state.lock();
    let reply = submit(&mut shared, &req.message);

    let failure = match &reply {
        Some(Reply {
            status: ReplyStatus::StorageFailed(reason),
            ..
        }) => Some(reason.clone()),
        _ => None,
    };

    match failure {
        Some(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse {
                success: false,
                data: reply,
                error: Some(error),
            }),
        )
            .into_response(),
        None => (StatusCode::OK, Json(ApiResponse::ok(reply))).into_response(),
    }
}

// ============================================================================
// Page Handlers
// ============================================================================

/// GET / - Render the chat page
async fn serve_index(State(state): State<AppState>) -> impl IntoResponse {
    let shared = state.lock();
    Html(render_page(&shared))
}

/// POST /chat - Form submission from the page
async fn post_chat(State(state): State<AppState>, Form(req): Form<ChatRequest>) -> impl IntoResponse {
    let mut shared = state.lock();
    submit(&mut shared, &req.message);
    Redirect::to("/")
}

/// Start over after a goodbye, then run the utterance
fn submit(shared: &mut Shared, message: &str) -> Option<Reply> {
    if shared.session.ended {
        match Session::open(shared.interpreter.ledger()) {
            Ok(session) => {
                info!("session restarted after exit");
                shared.session = session;
            }
            Err(e) => error!(error = %e, "failed to restart session"),
        }
    }

    let Shared {
        interpreter,
        session,
    } = shared;
    session.submit(interpreter, message)
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/sales", get(get_sales))
        .route("/customers", get(get_customers))
        .route("/products", get(get_products))
        .route("/total", get(get_total))
        .route("/interpret", post(interpret))
        .with_state(state.clone());

    Router::new()
        .route("/", get(serve_index))
        .route("/chat", post(post_chat))
        .with_state(state)
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

/// Build a router over a freshly opened ledger
pub fn app(ledger: Ledger) -> crate::Result<Router> {
    Ok(router(AppState::new(Interpreter::new(ledger))?))
}

// ============================================================================
// Page rendering
// ============================================================================

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_table(out: &mut String, title: &str, headers: &[String], rows: Vec<Vec<String>>) {
    let _ = write!(out, "<h3>{}</h3><table><tr>", escape(title));
    for h in headers {
        let _ = write!(out, "<th>{}</th>", escape(h));
    }
    out.push_str("</tr>");
    for row in rows {
        out.push_str("<tr>");
        for cell in row {
            let _ = write!(out, "<td>{}</td>", escape(&cell));
        }
        out.push_str("</tr>");
    }
    out.push_str("</table>");
}

fn render_page(shared: &Shared) -> String {
    let session = &shared.session;
    let currency = shared.interpreter.ledger().config().currency.clone();
    let summary = summarize(&session.sales);

    let mut out = String::from(concat!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\">",
        "<title>AI Sales Bot 🤖</title><style>",
        "body{font-family:Arial,sans-serif;background:#f5f7fa;display:flex;gap:2em;padding:1em}",
        ".chat{flex:1}.records{flex:2}.user{color:#2c3e50;font-weight:bold}",
        ".bot{color:#0a9396;font-style:italic}table{border-collapse:collapse;width:100%}",
        "td,th{border:1px solid #ccc;padding:4px}",
        "</style></head><body>",
    ));

    out.push_str("<div class=\"chat\"><h2>💬 Sales Chatbot</h2>");
    for message in &session.transcript {
        let class = match message.role {
            Role::User => "user",
            Role::Bot => "bot",
        };
        let _ = write!(
            out,
            "<p class=\"{}\">{}: {}</p>",
            class,
            message.role.label(),
            escape(&message.content).replace('\n', "<br>")
        );
    }
    out.push_str(concat!(
        "<form method=\"post\" action=\"/chat\">",
        "<input name=\"message\" autofocus placeholder=\"Enter command (e.g., add sale apple 5 200)\">",
        "<button type=\"submit\">Send</button></form></div>",
    ));

    out.push_str("<div class=\"records\"><h2>📊 Sales &amp; Records</h2>");
    render_table(
        &mut out,
        "Sales Records",
        &[
            "Product".to_string(),
            "Quantity".to_string(),
            format!("Price ({})", currency),
            format!("Total ({})", currency),
        ],
        session
            .sales
            .iter()
            .map(|s| {
                vec![
                    s.product.clone(),
                    s.quantity.to_string(),
                    format!("{:.2}", s.unit_price),
                    format!("{:.2}", s.total),
                ]
            })
            .collect(),
    );
    let _ = write!(
        out,
        "<p>💰 <b>Total Sales</b>: <b>{:.2} {}</b></p>",
        summary.total,
        escape(&currency)
    );
    render_table(
        &mut out,
        "👥 Customers",
        &["Customer Name".to_string()],
        session.customers.iter().map(|c| vec![c.name.clone()]).collect(),
    );
    render_table(
        &mut out,
        "📦 Products",
        &["Product".to_string(), format!("Price ({})", currency)],
        session
            .products
            .iter()
            .map(|p| vec![p.name.clone(), format!("{:.2}", p.price)])
            .collect(),
    );
    out.push_str("</div></body></html>");

    out
}
