use reqwest::{Client, RequestBuilder};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::UpstreamError;
use crate::models::{
    CustomerRecord, NewCustomer, NewService, SaleDocument, SaleRecord, ServiceRecord,
};

/// Typed façade over the accounting REST API.
///
/// Every call is bearer-authenticated with the token passed in and makes
/// exactly one request: no retries, errors are returned as-is.
#[derive(Debug, Clone)]
pub struct AccountingClient {
    client: Client,
    base_url: String,
}

impl AccountingClient {
    pub fn new(base_url: &str, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn find_customer_by_document(
        &self,
        document: &str,
        token: &str,
    ) -> Result<Vec<CustomerRecord>, UpstreamError> {
        let request = self
            .client
            .get(self.url("/v1/customers"))
            .query(&[("document", document)]);
        send(request, token, "/v1/customers?document").await
    }

    pub async fn find_customer_by_text(
        &self,
        query: &str,
        token: &str,
    ) -> Result<Vec<CustomerRecord>, UpstreamError> {
        let request = self
            .client
            .get(self.url("/v1/customers"))
            .query(&[("search", query)]);
        send(request, token, "/v1/customers?search").await
    }

    pub async fn create_customer(
        &self,
        customer: &NewCustomer,
        token: &str,
    ) -> Result<CustomerRecord, UpstreamError> {
        post(&self.client, &self.url("/v1/customers"), customer, token).await
    }

    pub async fn find_service_by_code(
        &self,
        code: &str,
        token: &str,
    ) -> Result<Vec<ServiceRecord>, UpstreamError> {
        let request = self
            .client
            .get(self.url("/v1/services"))
            .query(&[("code", code)]);
        send(request, token, "/v1/services?code").await
    }

    pub async fn create_service(
        &self,
        service: &NewService,
        token: &str,
    ) -> Result<ServiceRecord, UpstreamError> {
        post(&self.client, &self.url("/v1/services"), service, token).await
    }

    pub async fn create_sale(
        &self,
        sale: &SaleDocument,
        token: &str,
    ) -> Result<SaleRecord, UpstreamError> {
        post(&self.client, &self.url("/v1/sales"), sale, token).await
    }
}

async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
    client: &Client,
    url: &str,
    body: &B,
    token: &str,
) -> Result<T, UpstreamError> {
    send(client.post(url).json(body), token, url).await
}

/// `endpoint` only labels errors; it never includes query values, which may
/// carry buyer documents or emails.
async fn send<T: DeserializeOwned>(
    request: RequestBuilder,
    token: &str,
    endpoint: &str,
) -> Result<T, UpstreamError> {
    let response = request
        .bearer_auth(token)
        .send()
        .await
        .map_err(|source| UpstreamError::Transport {
            endpoint: endpoint.to_string(),
            source: source.without_url(),
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(UpstreamError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    response.json::<T>().await.map_err(|source| UpstreamError::Decode {
        endpoint: endpoint.to_string(),
        source: source.without_url(),
    })
}
