// 🔑 Authentication Gate
//
// The credential is the customer's CPF in plaintext, taken from the `cpf`
// header or from `Authorization: Bearer <cpf>`. No signing, no expiry.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::api::AppState;
use crate::directory::AccountDirectory;
use crate::entities::Customer;
use crate::error::{LedgerError, LedgerResult};

pub const CPF_HEADER: &str = "cpf";

const BEARER_PREFIX: &str = "Bearer ";

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Pull the CPF out of the request headers
///
/// The `cpf` header wins; the bearer token is only consulted when it is
/// absent or blank.
pub fn extract_credential(headers: &HeaderMap) -> LedgerResult<String> {
    if let Some(cpf) = header_value(headers, CPF_HEADER) {
        return Ok(cpf.to_string());
    }

    header_value(headers, AUTHORIZATION.as_str())
        .and_then(|auth| auth.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|cpf| !cpf.is_empty())
        .map(str::to_string)
        .ok_or(LedgerError::MissingCredential)
}

/// Resolve the request's credential to a customer
pub async fn authenticate(directory: &AccountDirectory, headers: &HeaderMap) -> LedgerResult<Customer> {
    let cpf = extract_credential(headers).inspect_err(|_| {
        tracing::debug!("request without CPF credential");
    })?;

    match directory.find_by_cpf(&cpf).await? {
        Some(customer) => {
            tracing::debug!(customer_id = %customer.id, "credential accepted");
            Ok(customer)
        }
        None => {
            tracing::debug!("unknown CPF credential");
            Err(LedgerError::UnknownCredential)
        }
    }
}

/// Extractor for handlers that need a logged-in customer
#[derive(Debug, Clone)]
pub struct AuthenticatedCustomer(pub Customer);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedCustomer {
    type Rejection = LedgerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authenticate(&state.directory, &parts.headers)
            .await
            .map(AuthenticatedCustomer)
    }
}
