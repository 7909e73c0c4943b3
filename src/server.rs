//! HTTP gateway
//!
//! | Method | Path                          | Success                |
//! |--------|-------------------------------|------------------------|
//! | POST   | `/transfer`                   | 200 transfer receipt   |
//! | POST   | `/accounts`                   | 201 opened account     |
//! | GET    | `/accounts/{id}`              | 200 balances           |
//! | GET    | `/accounts/{id}/transactions` | 200 records, newest first |
//! | GET    | `/transactions/{id}`          | 200 one record         |
//! | GET    | `/health`                     | 200 `ok`               |
//!
//! Failures are `{ "error", "code" }` bodies; transfers that moved funds but
//! could not be confirmed also carry `transactionId`. An `outcome_unknown`
//! 504 means the balance mutation was cut off; read the account before
//! retrying.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tokio::net::TcpListener;

use crate::config::WalletConfig;
use crate::core::spawn_event_logger;
use crate::types::{
    Account, ErrorKind, TransactionId, TransactionRecord, TransferReceipt, TransferRequest,
    WalletError,
};
use crate::wallet::Wallet;

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    wallet: Wallet,
    opening_balances: Arc<BTreeMap<String, Decimal>>,
    history_limit: usize,
}

impl AppState {
    pub fn new(wallet: Wallet, config: &WalletConfig) -> Self {
        Self {
            wallet,
            opening_balances: Arc::new(config.opening_balances.clone()),
            history_limit: config.history_limit,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    transaction_id: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn malformed(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                error: rejection.body_text(),
                code: "malformed_request",
                transaction_id: None,
            },
        }
    }

    fn transaction_not_found(id: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorBody {
                error: format!("Transaction {} not found", id),
                code: "transaction_not_found",
                transaction_id: None,
            },
        }
    }
}

/// HTTP status for each error
pub fn status_for(error: &WalletError) -> StatusCode {
    match error.kind() {
        ErrorKind::Validation | ErrorKind::InsufficientFunds => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Committed | ErrorKind::Io => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::Unavailable => match error {
            WalletError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::SERVICE_UNAVAILABLE,
        },
        ErrorKind::Indeterminate => StatusCode::GATEWAY_TIMEOUT,
    }
}

impl From<WalletError> for ApiError {
    fn from(error: WalletError) -> Self {
        Self {
            status: status_for(&error),
            body: ErrorBody {
                error: error.to_string(),
                code: error.code(),
                transaction_id: error.transaction_id().map(str::to_string),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// `POST /transfer` body
///
/// Every field is optional here so absence is reported as `missing_field`
/// instead of a generic decoding error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferPayload {
    account_id: Option<String>,
    amount: Option<Value>,
    currency: Option<String>,
}

impl TransferPayload {
    fn into_request(self) -> Result<TransferRequest, WalletError> {
        let account_id = self
            .account_id
            .ok_or_else(|| WalletError::missing_field("accountId"))?;
        let amount = self
            .amount
            .ok_or_else(|| WalletError::missing_field("amount"))?;
        let currency = self
            .currency
            .ok_or_else(|| WalletError::missing_field("currency"))?;

        Ok(TransferRequest::new(account_id, parse_amount(&amount)?, &currency))
    }
}

/// Accept a JSON number or a numeric string
fn parse_amount(value: &Value) -> Result<Decimal, WalletError> {
    let parsed = match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text))
        }
        Value::String(s) => Decimal::from_str(s.trim()),
        Value::Null => return Err(WalletError::missing_field("amount")),
        _ => return Err(WalletError::invalid_amount(value)),
    };

    parsed.map_err(|_| WalletError::invalid_amount(value))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransferResponse {
    transaction_id: TransactionId,
    #[serde(with = "rust_decimal::serde::float")]
    new_external_balance: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    new_internal_balance: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    settlement_amount: Decimal,
}

impl From<TransferReceipt> for TransferResponse {
    fn from(receipt: TransferReceipt) -> Self {
        Self {
            transaction_id: receipt.transaction_id,
            new_external_balance: receipt.new_external_balance,
            new_internal_balance: receipt.new_internal_balance,
            settlement_amount: receipt.settlement_amount,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenAccountPayload {
    account_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    account_id: String,
    #[serde(serialize_with = "serialize_float_map")]
    external: BTreeMap<String, Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    internal: Decimal,
}

/// One balance written as a JSON number
#[derive(Serialize)]
struct FloatBalance(#[serde(with = "rust_decimal::serde::float")] Decimal);

fn serialize_float_map<S>(balances: &BTreeMap<String, Decimal>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(balances.len()))?;
    for (code, balance) in balances {
        map.serialize_entry(code, &FloatBalance(*balance))?;
    }
    map.end()
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            account_id: account.id,
            external: account.external,
            internal: account.internal,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    limit: Option<usize>,
}

async fn transfer(
    State(state): State<AppState>,
    payload: Result<Json<TransferPayload>, JsonRejection>,
) -> Result<Json<TransferResponse>, ApiError> {
    let Json(payload) = payload.map_err(ApiError::malformed)?;
    let request = payload.into_request()?;

    let receipt = state.wallet.engine.transfer(request).await?;
    Ok(Json(receipt.into()))
}

async fn open_account(
    State(state): State<AppState>,
    payload: Result<Json<OpenAccountPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let Json(payload) = payload.map_err(ApiError::malformed)?;
    let account_id = payload
        .account_id
        .ok_or_else(|| WalletError::missing_field("accountId"))?;

    let account = state.wallet.accounts.open_account(
        &account_id,
        state
            .opening_balances
            .iter()
            .map(|(code, balance)| (code.as_str(), *balance)),
    )?;
    tracing::info!(account = %account.id, "account opened");

    Ok((StatusCode::CREATED, Json(account.into())))
}

async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state.wallet.engine.balances(&account_id).await?;
    Ok(Json(account.into()))
}

async fn account_history(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<TransactionRecord>>, ApiError> {
    // Unknown accounts are a 404, not an empty history.
    state.wallet.engine.balances(&account_id).await?;

    let limit = params.limit.unwrap_or(state.history_limit);
    let records = state.wallet.engine.history(&account_id, limit).await?;
    Ok(Json(records))
}

async fn get_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<TransactionRecord>, ApiError> {
    state
        .wallet
        .engine
        .reconcile(&TransactionId::from(transaction_id.as_str()))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::transaction_not_found(&transaction_id))
}

async fn health() -> &'static str {
    "ok"
}

/// Build the gateway router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/transfer", post(transfer))
        .route("/accounts", post(open_account))
        .route("/accounts/{id}", get(get_account))
        .route("/accounts/{id}/transactions", get(account_history))
        .route("/transactions/{id}", get(get_transaction))
        .route("/health", get(health))
        .with_state(state)
}

/// Run the gateway until Ctrl-C
pub async fn serve(config: &WalletConfig) -> Result<(), String> {
    let (wallet, events) = Wallet::in_memory(config).map_err(|e| e.to_string())?;
    let event_logger = spawn_event_logger(events);
    let app = router(AppState::new(wallet, config));

    let listener = TcpListener::bind(&config.server.bind)
        .await
        .map_err(|e| format!("Failed to bind {}: {}", config.server.bind, e))?;
    tracing::info!(bind = %config.server.bind, "wallet gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    // The router and every bus sender it held are gone; drain what is left.
    match tokio::time::timeout(Duration::from_secs(5), event_logger).await {
        Ok(Ok(delivered)) => tracing::info!(delivered, "event logger stopped"),
        Ok(Err(e)) => tracing::error!(error = %e, "event logger panicked"),
        Err(_) => tracing::warn!("event logger did not stop in time"),
    }

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown requested"),
        Err(e) => {
            tracing::error!(error = %e, "cannot listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!(50), "50")]
    #[case(json!(0.00001), "0.00001")]
    #[case(json!("12.5"), "12.5")]
    #[case(json!(" 7 "), "7")]
    #[case(json!(-3), "-3")]
    fn test_parse_amount(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(
            parse_amount(&value).unwrap(),
            Decimal::from_str(expected).unwrap()
        );
    }

    #[rstest]
    #[case(json!("abc"), "invalid_amount")]
    #[case(json!(true), "invalid_amount")]
    #[case(json!([1]), "invalid_amount")]
    #[case(json!(null), "missing_field")]
    fn test_parse_amount_rejects(#[case] value: Value, #[case] code: &str) {
        assert_eq!(parse_amount(&value).unwrap_err().code(), code);
    }

    #[rstest]
    #[case(WalletError::missing_field("amount"), StatusCode::BAD_REQUEST)]
    #[case(WalletError::below_minimum(Decimal::ONE, Decimal::TEN), StatusCode::BAD_REQUEST)]
    #[case(
        WalletError::insufficient_funds("a", "USD", Decimal::ZERO, Decimal::ONE),
        StatusCode::BAD_REQUEST
    )]
    #[case(WalletError::account_not_found("a"), StatusCode::NOT_FOUND)]
    #[case(WalletError::account_exists("a"), StatusCode::CONFLICT)]
    #[case(WalletError::log_write_failed("id", "x"), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(WalletError::publish_failed("id", "x"), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(WalletError::store_unavailable("x"), StatusCode::SERVICE_UNAVAILABLE)]
    #[case(WalletError::timeout("get_balances", 5), StatusCode::GATEWAY_TIMEOUT)]
    #[case(WalletError::outcome_unknown("apply_transfer", 5), StatusCode::GATEWAY_TIMEOUT)]
    #[case(WalletError::precision_exceeded(Decimal::ONE, "EUR"), StatusCode::BAD_REQUEST)]
    fn test_status_for(#[case] error: WalletError, #[case] expected: StatusCode) {
        assert_eq!(status_for(&error), expected);
    }

    #[test]
    fn test_transfer_response_amounts_are_numbers() {
        let response = TransferResponse::from(TransferReceipt {
            transaction_id: TransactionId::from("tx-1"),
            new_external_balance: Decimal::new(450, 0),
            new_internal_balance: Decimal::new(10135623, 5),
            settlement_amount: Decimal::new(5000, 0),
        });

        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["transactionId"], "tx-1");
        assert_eq!(body["newExternalBalance"], json!(450.0));
        assert_eq!(body["newInternalBalance"], json!(101.35623));
        assert_eq!(body["settlementAmount"], json!(5000.0));
    }

    #[test]
    fn test_account_response_balances_are_numbers() {
        let mut account = Account::new("alice", ["RUB", "USD"]);
        account.external.insert("USD".to_string(), Decimal::new(4505, 1));
        account.internal = Decimal::new(5000, 0);

        let body = serde_json::to_value(AccountResponse::from(account)).unwrap();
        assert_eq!(body["accountId"], "alice");
        assert_eq!(body["external"]["USD"], json!(450.5));
        assert_eq!(body["external"]["RUB"], json!(0.0));
        assert_eq!(body["internal"], json!(5000.0));
    }

    #[test]
    fn test_committed_error_body_carries_transaction_id() {
        let api_error = ApiError::from(WalletError::publish_failed("tx-9", "bus closed"));

        let body = serde_json::to_value(&api_error.body).unwrap();
        assert_eq!(body["code"], "publish_failed");
        assert_eq!(body["transactionId"], "tx-9");
    }

    #[test]
    fn test_rejection_body_has_no_transaction_id() {
        let api_error = ApiError::from(WalletError::unsupported_currency("GBP"));

        let body = serde_json::to_value(&api_error.body).unwrap();
        assert_eq!(body["code"], "unsupported_currency");
        assert!(body.get("transactionId").is_none());
    }
}
