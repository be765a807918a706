//! REST implementation of [`TicketValidator`] against a CAS-protocol SSO
//! server (`/p3/serviceValidate` with `format=JSON`).

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::services::sso::validator::{
    Assertion, CasToken, Principal, TicketValidator, ValidationError,
};

const VALIDATE_PATH: &str = "p3/serviceValidate";

pub struct RestTicketValidator {
    http: reqwest::Client,
    validate_url: Url,
}

impl RestTicketValidator {
    /// `server_prefix` is the SSO server base URL (e.g. `https://sso.example.com/cas`).
    /// `timeout` bounds the whole validation round trip.
    pub fn new(server_prefix: &Url, timeout: Duration) -> Result<Self, ValidationError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ValidationError::Unreachable(e.to_string()))?;

        let base = server_prefix.as_str().trim_end_matches('/');
        let validate_url = Url::parse(&format!("{base}/{VALIDATE_PATH}"))
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;

        Ok(Self { http, validate_url })
    }

    async fn validate_inner(&self, token: &CasToken) -> Result<Assertion, ValidationError> {
        let mut url = self.validate_url.clone();
        url.query_pairs_mut()
            .append_pair("ticket", token.ticket.value())
            .append_pair("service", token.service.as_str())
            .append_pair("format", "JSON");

        let response = self.http.get(url).send().await.map_err(map_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ValidationError::Unreachable(format!(
                "sso server answered {status}"
            )));
        }

        let envelope: ServiceResponseEnvelope = response
            .json()
            .await
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;

        match envelope.service_response {
            ServiceResponse {
                authentication_success: Some(success),
                ..
            } => {
                debug!(user = %success.user, "ticket accepted by sso server");
                Ok(Assertion {
                    principal: Principal::new(success.user),
                    attributes: success.attributes,
                })
            }
            ServiceResponse {
                authentication_failure: Some(failure),
                ..
            } => Err(ValidationError::Rejected {
                code: failure.code,
                description: failure.description,
            }),
            _ => Err(ValidationError::Malformed(
                "neither authenticationSuccess nor authenticationFailure present".to_string(),
            )),
        }
    }
}

impl TicketValidator for RestTicketValidator {
    fn validate<'a>(
        &'a self,
        token: &'a CasToken,
    ) -> Pin<Box<dyn Future<Output = Result<Assertion, ValidationError>> + Send + 'a>> {
        Box::pin(self.validate_inner(token))
    }
}

fn map_transport(e: reqwest::Error) -> ValidationError {
    if e.is_timeout() {
        ValidationError::Timeout
    } else {
        ValidationError::Unreachable(e.to_string())
    }
}

#[derive(Deserialize)]
struct ServiceResponseEnvelope {
    #[serde(rename = "serviceResponse")]
    service_response: ServiceResponse,
}

#[derive(Deserialize)]
struct ServiceResponse {
    #[serde(rename = "authenticationSuccess")]
    authentication_success: Option<AuthenticationSuccess>,
    #[serde(rename = "authenticationFailure")]
    authentication_failure: Option<AuthenticationFailure>,
}

#[derive(Deserialize)]
struct AuthenticationSuccess {
    user: String,
    #[serde(default)]
    attributes: HashMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct AuthenticationFailure {
    code: String,
    #[serde(default)]
    description: String,
}
