//! # Request Dispatcher
//!
//! Transport-agnostic glue between encoded request payloads and the
//! [`LedgerService`]. A transport hands over a method name and the raw
//! request bytes; the dispatcher decodes JSON, routes to the operation, and
//! encodes either the result or an `{error}` object back to bytes.
//!
//! ## Method Index
//!
//! | Method             | Request                              | Success                       |
//! |--------------------|--------------------------------------|-------------------------------|
//! | `createWallet`     | `{initialBalance?}`                  | `{walletId, address}`         |
//! | `getBalance`       | `{walletId}`                         | `{balance}`                   |
//! | `sendPayment`      | `{walletId, toAddress, amount}`      | `{txId}`                      |
//! | `listTransactions` | `{walletId}`                         | `{transactions}`              |
//!
//! Any failure (bad JSON, an unknown method, a ledger error) becomes
//! `{"error": "<message>"}`. The dispatcher never fails the transport.
//!
//! ## Amounts
//!
//! Amounts must be non-negative whole numbers that fit in a `u64`. `30`
//! and `30.0` are both accepted; `-1`, `2.5`, and `"30"` are not. For
//! `createWallet` a missing or non-numeric `initialBalance` means zero.
//!
//! ## Store Failures
//!
//! Any store failure maps to `"Failed to persist wallet"`, on reads as well
//! as writes. A wallet record that cannot be read back or decoded during
//! `getBalance` or `listTransactions` reports that string too; the cause is
//! in the `warn` log line, not on the wire.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::LedgerError;
use crate::service::LedgerService;
use crate::wallet::{Amount, Transaction};

// ---------------------------------------------------------------------------
// Method Enumeration
// ---------------------------------------------------------------------------

/// Operations the dispatcher can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    #[serde(rename = "createWallet")]
    CreateWallet,
    #[serde(rename = "getBalance")]
    GetBalance,
    #[serde(rename = "sendPayment")]
    SendPayment,
    #[serde(rename = "listTransactions")]
    ListTransactions,
}

impl Method {
    /// All methods, in table order.
    pub const ALL: [Method; 4] = [
        Method::CreateWallet,
        Method::GetBalance,
        Method::SendPayment,
        Method::ListTransactions,
    ];

    /// The wire name, e.g. `"sendPayment"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::CreateWallet => "createWallet",
            Method::GetBalance => "getBalance",
            Method::SendPayment => "sendPayment",
            Method::ListTransactions => "listTransactions",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| DispatchError::UnknownMethod(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a dispatched call produced an `{error}` response.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The payload is not a JSON object, or a required field is missing or
    /// has the wrong type.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

// ---------------------------------------------------------------------------
// Response Bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub balance: Amount,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub tx_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Routes decoded requests to a shared [`LedgerService`].
#[derive(Debug, Clone)]
pub struct Dispatcher {
    ledger: Arc<LedgerService>,
}

impl Dispatcher {
    pub fn new(ledger: Arc<LedgerService>) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Arc<LedgerService> {
        &self.ledger
    }

    /// Bytes in, bytes out. Always returns a JSON document.
    pub async fn dispatch(&self, method: &str, payload: &[u8]) -> Vec<u8> {
        encode_response(self.call(method, payload).await)
    }

    /// Decodes, routes, and runs one call, returning the success body as a
    /// JSON value.
    pub async fn call(&self, method: &str, payload: &[u8]) -> Result<Value, DispatchError> {
        let result = self.route(method, payload).await;
        if let Err(e) = &result {
            tracing::warn!(method, error = %e, "request rejected");
        }
        result
    }

    async fn route(&self, method: &str, payload: &[u8]) -> Result<Value, DispatchError> {
        let method: Method = method.parse()?;
        let params = decode_params(payload)?;

        match method {
            Method::CreateWallet => {
                let initial_balance = match params.get("initialBalance") {
                    Some(v) if v.is_number() => {
                        parse_amount(v).ok_or(LedgerError::InvalidAmount)?
                    }
                    _ => 0,
                };
                let created = self.ledger.create_wallet(initial_balance).await?;
                to_value(&created)
            }
            Method::GetBalance => {
                let wallet_id = require_str(&params, "walletId")?;
                let balance = self.ledger.get_balance(wallet_id).await?;
                to_value(&BalanceResponse { balance })
            }
            Method::SendPayment => {
                let amount = params
                    .get("amount")
                    .and_then(parse_amount)
                    .filter(|a| *a > 0)
                    .ok_or(LedgerError::InvalidAmount)?;
                let wallet_id = require_str(&params, "walletId")?;
                let to_address = require_str(&params, "toAddress")?;
                let tx = self
                    .ledger
                    .send_payment(wallet_id, to_address, amount)
                    .await?;
                to_value(&PaymentResponse { tx_id: tx.id })
            }
            Method::ListTransactions => {
                let wallet_id = require_str(&params, "walletId")?;
                let transactions = self.ledger.list_transactions(wallet_id).await?;
                to_value(&TransactionsResponse { transactions })
            }
        }
    }
}

/// Encodes a call outcome as response bytes.
pub fn encode_response(outcome: Result<Value, DispatchError>) -> Vec<u8> {
    let encoded = match outcome {
        Ok(value) => serde_json::to_vec(&value),
        Err(e) => serde_json::to_vec(&ErrorResponse {
            error: e.to_string(),
        }),
    };
    encoded.unwrap_or_else(|_| br#"{"error":"Internal error"}"#.to_vec())
}

// ---------------------------------------------------------------------------
// Decoding Helpers
// ---------------------------------------------------------------------------

fn decode_params(payload: &[u8]) -> Result<Map<String, Value>, DispatchError> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(DispatchError::InvalidRequest(
            "payload must be a JSON object".into(),
        )),
        Err(e) => Err(DispatchError::InvalidRequest(e.to_string())),
    }
}

fn require_str<'a>(params: &'a Map<String, Value>, field: &str) -> Result<&'a str, DispatchError> {
    params
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| DispatchError::InvalidRequest(format!("{field} must be a string")))
}

/// Whole, non-negative, and representable as `u64`; otherwise `None`.
fn parse_amount(value: &Value) -> Option<Amount> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

fn to_value<T: Serialize>(body: &T) -> Result<Value, DispatchError> {
    serde_json::to_value(body).map_err(|e| DispatchError::InvalidRequest(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn dispatcher() -> Dispatcher {
        let ledger = LedgerService::new(Arc::new(MemoryStore::new()));
        Dispatcher::new(Arc::new(ledger))
    }

    async fn call_json(d: &Dispatcher, method: &str, body: Value) -> Value {
        let bytes = d.dispatch(method, &serde_json::to_vec(&body).unwrap()).await;
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn undecodable_record_reports_store_failure() {
        use crate::storage::DurableStore;

        let store = Arc::new(MemoryStore::new());
        store
            .put(&crate::config::wallet_key("bad"), vec![0xff; 3])
            .await
            .unwrap();
        let d = Dispatcher::new(Arc::new(LedgerService::new(store)));

        for method in ["getBalance", "listTransactions"] {
            assert_eq!(
                call_json(&d, method, json!({ "walletId": "bad" })).await,
                json!({ "error": "Failed to persist wallet" })
            );
        }
    }

    #[test]
    fn method_names_roundtrip() {
        for method in Method::ALL {
            assert_eq!(method.as_str().parse::<Method>().unwrap(), method);
        }
        assert!("deleteWallet".parse::<Method>().is_err());
    }

    #[test]
    fn amount_parsing() {
        assert_eq!(parse_amount(&json!(30)), Some(30));
        assert_eq!(parse_amount(&json!(30.0)), Some(30));
        assert_eq!(parse_amount(&json!(0)), Some(0));
        assert_eq!(parse_amount(&json!(2.5)), None);
        assert_eq!(parse_amount(&json!(-1)), None);
        assert_eq!(parse_amount(&json!("30")), None);
        assert_eq!(parse_amount(&json!(null)), None);
    }

    #[tokio::test]
    async fn full_scenario_over_bytes() {
        let d = dispatcher();

        let created = call_json(&d, "createWallet", json!({ "initialBalance": 100 })).await;
        let wallet_id = created["walletId"].as_str().unwrap().to_string();
        let address = created["address"].as_str().unwrap().to_string();

        let paid = call_json(
            &d,
            "sendPayment",
            json!({ "walletId": wallet_id, "toAddress": "btc-xyz", "amount": 30 }),
        )
        .await;
        let tx_id = paid["txId"].as_str().unwrap().to_string();

        let balance = call_json(&d, "getBalance", json!({ "walletId": wallet_id })).await;
        assert_eq!(balance, json!({ "balance": 70 }));

        let listed = call_json(&d, "listTransactions", json!({ "walletId": wallet_id })).await;
        let txs = listed["transactions"].as_array().unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0]["id"], tx_id);
        assert_eq!(txs[0]["from"], address);
        assert_eq!(txs[0]["to"], "btc-xyz");
        assert_eq!(txs[0]["amount"], 30);
        assert!(txs[0]["timestamp"].is_u64());
    }

    #[tokio::test]
    async fn unknown_wallet_error_string() {
        let d = dispatcher();
        let resp = call_json(
            &d,
            "sendPayment",
            json!({ "walletId": "unknown-id", "toAddress": "btc-xyz", "amount": 10 }),
        )
        .await;
        assert_eq!(resp, json!({ "error": "Wallet not found" }));
    }

    #[tokio::test]
    async fn insufficient_funds_error_string() {
        let d = dispatcher();
        let created = call_json(&d, "createWallet", json!({ "initialBalance": 10 })).await;
        let wallet_id = created["walletId"].clone();

        let resp = call_json(
            &d,
            "sendPayment",
            json!({ "walletId": wallet_id, "toAddress": "btc-xyz", "amount": 50 }),
        )
        .await;
        assert_eq!(resp, json!({ "error": "Insufficient funds" }));

        let balance = call_json(&d, "getBalance", json!({ "walletId": wallet_id })).await;
        assert_eq!(balance, json!({ "balance": 10 }));
    }

    #[tokio::test]
    async fn initial_balance_defaults_to_zero() {
        let d = dispatcher();
        for body in [
            json!({}),
            json!({ "initialBalance": null }),
            json!({ "initialBalance": "lots" }),
        ] {
            let created = call_json(&d, "createWallet", body).await;
            let balance = call_json(
                &d,
                "getBalance",
                json!({ "walletId": created["walletId"] }),
            )
            .await;
            assert_eq!(balance, json!({ "balance": 0 }));
        }

        // Empty payload behaves like `{}`.
        let bytes = d.dispatch("createWallet", b"").await;
        let created: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(created["walletId"].is_string());
    }

    #[tokio::test]
    async fn negative_initial_balance_is_invalid() {
        let d = dispatcher();
        let resp = call_json(&d, "createWallet", json!({ "initialBalance": -5 })).await;
        assert_eq!(resp, json!({ "error": "Invalid amount" }));
        assert!(d.ledger().cache().is_empty());
    }

    #[tokio::test]
    async fn bad_payment_amounts_are_invalid() {
        let d = dispatcher();
        let created = call_json(&d, "createWallet", json!({ "initialBalance": 10 })).await;
        let wallet_id = created["walletId"].clone();

        for amount in [json!(0), json!(-3), json!(1.5), json!("5"), json!(null)] {
            let resp = call_json(
                &d,
                "sendPayment",
                json!({ "walletId": wallet_id, "toAddress": "btc-xyz", "amount": amount }),
            )
            .await;
            assert_eq!(resp, json!({ "error": "Invalid amount" }));
        }

        let balance = call_json(&d, "getBalance", json!({ "walletId": wallet_id })).await;
        assert_eq!(balance, json!({ "balance": 10 }));
    }

    #[tokio::test]
    async fn malformed_requests_become_error_objects() {
        let d = dispatcher();

        let resp: Value =
            serde_json::from_slice(&d.dispatch("getBalance", b"not json").await).unwrap();
        assert!(resp["error"].as_str().unwrap().starts_with("Invalid request"));

        let resp: Value =
            serde_json::from_slice(&d.dispatch("getBalance", b"[1,2]").await).unwrap();
        assert!(resp["error"].as_str().unwrap().starts_with("Invalid request"));

        let resp = call_json(&d, "getBalance", json!({ "walletId": 12 })).await;
        assert_eq!(resp, json!({ "error": "Invalid request: walletId must be a string" }));

        let resp = call_json(&d, "mintCoins", json!({})).await;
        assert_eq!(resp, json!({ "error": "Unknown method: mintCoins" }));
    }
}
