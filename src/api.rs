// HTTP surface: router, handlers and error → response mapping

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::AuthenticatedCustomer;
use crate::directory::AccountDirectory;
use crate::error::{LedgerError, LedgerResult};
use crate::store::LedgerStore;
use crate::transactions::TransactionService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub directory: AccountDirectory,
    pub transactions: TransactionService,
}

impl AppState {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            directory: AccountDirectory::new(Arc::clone(&store)),
            transactions: TransactionService::new(store),
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub balance: f64,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

// Every field is optional on the wire so a missing one becomes a 400 with
// our own message instead of a serde rejection.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateAccountRequest {
    pub name: Option<String>,
    pub cpf: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AmountRequest {
    pub description: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TransactionRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DateQuery {
    pub date: Option<String>,
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> LedgerResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| LedgerError::validation(format!("invalid request body: {}", rejection.body_text())))
}

fn require_amount(amount: Option<f64>) -> LedgerResult<f64> {
    amount.ok_or_else(|| LedgerError::validation("invalid amount: must be greater than zero"))
}

// ============================================================================
// Error mapping
// ============================================================================

impl LedgerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LedgerError::Validation(_)
            | LedgerError::DuplicateCredential
            | LedgerError::MissingCredential
            | LedgerError::InsufficientFunds { .. } => StatusCode::BAD_REQUEST,
            LedgerError::UnknownCredential | LedgerError::NotFound => StatusCode::NOT_FOUND,
            LedgerError::Storage(_) | LedgerError::LockPoisoned => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error = if self.is_client_error() {
            self.to_string()
        } else {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /health - Health check
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: crate::VERSION,
    })
}

/// POST /account - Open an account
async fn create_account(
    State(state): State<AppState>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> LedgerResult<impl IntoResponse> {
    let request = json_body(payload)?;

    state
        .directory
        .create_account(
            request.name.as_deref().unwrap_or_default(),
            request.cpf.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok((StatusCode::CREATED, MessageResponse::new("Account created successfully.")))
}

/// GET /account - Customer record with statement and balance
async fn get_account(
    State(state): State<AppState>,
    AuthenticatedCustomer(customer): AuthenticatedCustomer,
) -> LedgerResult<impl IntoResponse> {
    Ok(Json(state.directory.account(customer).await?))
}

/// PUT /account - Rename the customer
async fn update_account(
    State(state): State<AppState>,
    AuthenticatedCustomer(customer): AuthenticatedCustomer,
    payload: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> LedgerResult<impl IntoResponse> {
    let request = json_body(payload)?;

    state
        .directory
        .rename(&customer, request.name.as_deref().unwrap_or_default())
        .await?;

    Ok(MessageResponse::new("Name updated successfully."))
}

/// DELETE /account - Close the account
async fn delete_account(
    State(state): State<AppState>,
    AuthenticatedCustomer(customer): AuthenticatedCustomer,
) -> LedgerResult<impl IntoResponse> {
    state.directory.delete(&customer).await?;
    Ok(MessageResponse::new("Account deleted successfully."))
}

/// GET /statement - All entries, newest first
async fn get_statement(
    State(state): State<AppState>,
    AuthenticatedCustomer(customer): AuthenticatedCustomer,
) -> LedgerResult<impl IntoResponse> {
    Ok(Json(state.transactions.statement(&customer).await?))
}

/// GET /statement/date?date=YYYY-MM-DD - Entries from one calendar day
async fn get_statement_by_date(
    State(state): State<AppState>,
    AuthenticatedCustomer(customer): AuthenticatedCustomer,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> LedgerResult<impl IntoResponse> {
    let Query(query) =
        query.map_err(|rejection| LedgerError::validation(format!("invalid query: {}", rejection.body_text())))?;
    let date = query
        .date
        .ok_or_else(|| LedgerError::validation("date is required (YYYY-MM-DD)"))?;

    Ok(Json(state.transactions.statement_on(&customer, &date).await?))
}

/// POST /deposit - Credit the account
async fn deposit(
    State(state): State<AppState>,
    AuthenticatedCustomer(customer): AuthenticatedCustomer,
    payload: Result<Json<AmountRequest>, JsonRejection>,
) -> LedgerResult<impl IntoResponse> {
    let request = json_body(payload)?;
    let amount = require_amount(request.amount)?;

    state
        .transactions
        .deposit(&customer, amount, request.description)
        .await?;

    Ok((StatusCode::CREATED, MessageResponse::new("Deposit completed successfully.")))
}

/// POST /withdraw - Debit the account if the balance covers it
async fn withdraw(
    State(state): State<AppState>,
    AuthenticatedCustomer(customer): AuthenticatedCustomer,
    payload: Result<Json<AmountRequest>, JsonRejection>,
) -> LedgerResult<impl IntoResponse> {
    let request = json_body(payload)?;
    let amount = require_amount(request.amount)?;

    state
        .transactions
        .withdraw(&customer, amount, request.description)
        .await?;

    Ok((StatusCode::CREATED, MessageResponse::new("Withdrawal completed successfully.")))
}

/// POST /transactions - Credit or debit selected by `type`
async fn create_transaction(
    State(state): State<AppState>,
    AuthenticatedCustomer(customer): AuthenticatedCustomer,
    payload: Result<Json<TransactionRequest>, JsonRejection>,
) -> LedgerResult<impl IntoResponse> {
    let request = json_body(payload)?;
    let kind = request
        .kind
        .ok_or_else(|| LedgerError::validation("type is required ('credit' or 'debit')"))?;
    let amount = require_amount(request.amount)?;

    state
        .transactions
        .create_transaction(&customer, &kind, amount, request.description)
        .await?;

    Ok((StatusCode::CREATED, MessageResponse::new("Transaction completed successfully.")))
}

/// GET /balance - Current balance
async fn get_account_balance(
    State(state): State<AppState>,
    AuthenticatedCustomer(customer): AuthenticatedCustomer,
) -> LedgerResult<impl IntoResponse> {
    let balance = state.transactions.balance(&customer).await?;
    Ok(Json(BalanceResponse { balance }))
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/account",
            post(create_account)
                .get(get_account)
                .put(update_account)
                .delete(delete_account),
        )
        .route("/accounts", post(create_account))
        .route("/statement", get(get_statement))
        .route("/statement/date", get(get_statement_by_date))
        .route("/deposit", post(deposit))
        .route("/withdraw", post(withdraw))
        .route("/transactions", post(create_transaction))
        .route("/balance", get(get_account_balance))
        .with_state(state)
}
