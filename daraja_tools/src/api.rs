use std::{sync::Arc, time::Duration};

use chrono::Utc;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde::Deserialize;

use crate::{
    config::DarajaConfig,
    data_objects::{StkPushRequest, StkPushResponse, StkQueryRequest, StkQueryResponse},
    helpers::{daraja_timestamp, stk_password},
    DarajaApiError,
};

#[derive(Clone)]
pub struct DarajaApi {
    config: DarajaConfig,
    client: Arc<Client>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl DarajaApi {
    pub fn new(config: DarajaConfig) -> Result<Self, DarajaApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DarajaApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Fetch a short-lived bearer token. Tokens are valid for an hour, but at the request rates this gateway sees it
    /// is not worth caching them and tracking expiry.
    async fn access_token(&self) -> Result<String, DarajaApiError> {
        let url = self.url("/oauth/v1/generate?grant_type=client_credentials");
        trace!("Requesting Daraja access token");
        let response = self
            .client
            .get(url)
            .basic_auth(&self.config.consumer_key, Some(self.config.consumer_secret.reveal()))
            .send()
            .await
            .map_err(|e| DarajaApiError::AuthTokenError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(DarajaApiError::AuthTokenError(format!("status {status}: {message}")));
        }
        let token = response.json::<TokenResponse>().await.map_err(|e| DarajaApiError::JsonError(e.to_string()))?;
        trace!("Daraja access token obtained");
        Ok(token.access_token)
    }

    async fn post_query<T: serde::de::DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, DarajaApiError> {
        let token = self.access_token().await?;
        let url = self.url(path);
        trace!("Sending Daraja request: {url}");
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| DarajaApiError::ResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("Daraja request successful. {}", response.status());
            response.json::<T>().await.map_err(|e| DarajaApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| DarajaApiError::ResponseError(e.to_string()))?;
            Err(DarajaApiError::QueryError { status, message })
        }
    }

    /// Push a payment prompt to the payer's handset.
    ///
    /// `phone` must already be in canonical `254...` form and `amount` in whole shillings. The response only
    /// acknowledges that the prompt was queued; the payment outcome arrives asynchronously.
    pub async fn stk_push(&self, phone: &str, amount: i64, account_ref: &str) -> Result<StkPushResponse, DarajaApiError> {
        let timestamp = daraja_timestamp(Utc::now());
        let password = stk_password(&self.config.shortcode, self.config.passkey.reveal(), &timestamp);
        let request = StkPushRequest {
            business_short_code: self.config.shortcode.clone(),
            password,
            timestamp,
            transaction_type: "CustomerPayBillOnline".to_string(),
            amount,
            party_a: phone.to_string(),
            party_b: self.config.shortcode.clone(),
            phone_number: phone.to_string(),
            callback_url: self.config.callback_url.clone(),
            account_reference: account_ref.to_string(),
            transaction_desc: format!("Payment for order {account_ref}"),
        };
        debug!("Initiating STK push of {amount} for order {account_ref}");
        let response: StkPushResponse = self.post_query("/mpesa/stkpush/v1/processrequest", &request).await?;
        if response.response_code.trim() != "0" {
            return Err(DarajaApiError::Rejected(format!(
                "STK push not accepted. Code {}: {}",
                response.response_code, response.response_description
            )));
        }
        info!("STK push accepted for order {account_ref}. CheckoutRequestID: {}", response.checkout_request_id);
        Ok(response)
    }

    /// Ask the provider for the outcome of a previously initiated push. Used by the pull half of reconciliation when
    /// the callback has not arrived (or was lost).
    pub async fn stk_query(&self, checkout_request_id: &str) -> Result<StkQueryResponse, DarajaApiError> {
        let timestamp = daraja_timestamp(Utc::now());
        let password = stk_password(&self.config.shortcode, self.config.passkey.reveal(), &timestamp);
        let request = StkQueryRequest {
            business_short_code: self.config.shortcode.clone(),
            password,
            timestamp,
            checkout_request_id: checkout_request_id.to_string(),
        };
        debug!("Querying STK push status for {checkout_request_id}");
        self.post_query("/mpesa/stkpushquery/v1/query", &request).await
    }
}
