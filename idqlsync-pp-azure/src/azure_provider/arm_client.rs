/*
    Copyright 2025 MydriaTech AB

    Licensed under the Apache License 2.0 with Free world makers exception
    1.0.0 (the "License"); you may not use this file except in compliance with
    the License. You should have obtained a copy of the License with the source
    or binary distribution in file named

        LICENSE-Apache-2.0-with-FWM-Exception-1.0.0

    Unless required by applicable law or agreed to in writing, software
    distributed under the License is distributed on an "AS IS" BASIS,
    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
    See the License for the specific language governing permissions and
    limitations under the License.
*/

//! Azure Resource Manager REST API client for API Management Named Values.

use super::AccessTokenCache;
use super::AzureCredentials;
use super::NamedValueCollection;
use super::NamedValueContract;
use super::arm_update_operation::ArmUpdateOperation;
use idqlsync_pp::policy::PolicyError;
use idqlsync_pp::policy::PolicyErrorKind;
use idqlsync_pp::util::LongRunningOperation;
use idqlsync_pp::util::StartedOperation;
use reqwest::Client;
use reqwest::ClientBuilder;
use reqwest::RequestBuilder;
use reqwest::Response;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::IF_MATCH;
use std::sync::Arc;
use std::time::Duration;

/// Client for the Azure Resource Manager REST API.
pub struct ArmClient {
    management_url: String,
    // Client uses an Arc internally, so it doesn't need Arc<> wrapping here
    client: Client,
    token_cache: Arc<AccessTokenCache>,
}

impl ArmClient {
    const DEFAULT_MANAGEMENT_URL: &str = "https://management.azure.com";
    const API_VERSION: &str = "2022-08-01";
    const MIME_APPLICATION_JSON: &str = "application/json";
    const HEADER_AZURE_ASYNC_OPERATION: &str = "azure-asyncoperation";
    const HEADER_LOCATION: &str = "location";

    /// Return a new instance using the public Azure cloud.
    pub fn new(credentials: AzureCredentials, timeout: Duration) -> Result<Arc<Self>, PolicyError> {
        let token_cache = AccessTokenCache::new(credentials);
        Self::with_endpoints(Self::DEFAULT_MANAGEMENT_URL, token_cache, timeout)
    }

    /// Return a new instance using a non-default management endpoint.
    pub fn with_endpoints(
        management_url: &str,
        token_cache: Arc<AccessTokenCache>,
        timeout: Duration,
    ) -> Result<Arc<Self>, PolicyError> {
        let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        let client = ClientBuilder::new()
            .user_agent(user_agent)
            .referer(false)
            .brotli(true)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                PolicyErrorKind::BackendCommunication
                    .error_with_msg(format!("Unable to create HTTP client: {e}"))
            })?;
        Ok(Arc::new(Self {
            management_url: management_url.trim_end_matches('/').to_owned(),
            client,
            token_cache,
        }))
    }

    /// URL of the Named Values collection of an API Management service.
    pub fn named_values_url(&self, resource_group: &str, service_name: &str) -> String {
        format!(
            "{}/subscriptions/{}/resourceGroups/{resource_group}/providers/Microsoft.ApiManagement/service/{service_name}/namedValues",
            self.management_url,
            self.token_cache.credentials().subscription(),
        )
    }

    /// Add the API version query parameter to a resource URL.
    pub fn with_api_version(url: &str) -> String {
        format!("{url}?api-version={}", Self::API_VERSION)
    }

    /// Get a page of Named Values.
    ///
    /// `url` is either the collection URL with API version or the `nextLink`
    /// of the previous page.
    pub async fn list_named_values_page(
        &self,
        url: &str,
    ) -> Result<NamedValueCollection, PolicyError> {
        let response = self.send(self.client.get(url), url).await?;
        let status = response.status();
        let body = Self::response_text(response, url).await?;
        if status != StatusCode::OK {
            Err(Self::unexpected_status(url, status))?;
        }
        NamedValueCollection::from_json(&body)
    }

    /// Get a single resource and parse it as a [NamedValueContract].
    pub(super) async fn get_named_value(
        &self,
        url: &str,
    ) -> Result<NamedValueContract, PolicyError> {
        let response = self.send(self.client.get(url), url).await?;
        let status = response.status();
        let body = Self::response_text(response, url).await?;
        if status != StatusCode::OK {
            Err(Self::unexpected_status(url, status))?;
        }
        NamedValueContract::from_json(&body)
    }

    /// Start an update of the value of a Named Value.
    ///
    /// The returned operation resolves to the updated resource.
    pub async fn begin_update_named_value(
        self: &Arc<Self>,
        named_value_url: &str,
        value: &str,
    ) -> Result<StartedOperation<NamedValueContract>, PolicyError> {
        let url = Self::with_api_version(named_value_url);
        let body = NamedValueContract::value_update_json(value);
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("Sending body: {body}");
        }
        let request = self
            .client
            .patch(&url)
            .body(body)
            .header(&CONTENT_TYPE, Self::MIME_APPLICATION_JSON)
            .header(&IF_MATCH, "*");
        let response = self.send(request, &url).await?;
        let operation = match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                let body = Self::response_text(response, &url).await?;
                ArmUpdateOperation::Completed(Some(NamedValueContract::from_json(&body)?))
            }
            StatusCode::ACCEPTED => {
                if let Some(status_url) =
                    Self::header_as_string(&response, Self::HEADER_AZURE_ASYNC_OPERATION)
                {
                    ArmUpdateOperation::AzureAsyncOperation {
                        client: Arc::clone(self),
                        status_url,
                        resource_url: url,
                    }
                } else if let Some(location_url) =
                    Self::header_as_string(&response, Self::HEADER_LOCATION)
                {
                    ArmUpdateOperation::Location {
                        client: Arc::clone(self),
                        location_url,
                        resource_url: url,
                    }
                } else {
                    Err(PolicyErrorKind::BackendCommunication.error_with_msg(format!(
                        "Request to '{url}' was accepted without any way to track the operation."
                    )))?
                }
            }
            status => Err(Self::unexpected_status(&url, status))?,
        };
        Ok(Some(
            Box::new(operation) as Box<dyn LongRunningOperation<NamedValueContract>>
        ))
    }

    /// GET any URL with authorization and return the status and body.
    pub(super) async fn get_text(&self, url: &str) -> Result<(StatusCode, String), PolicyError> {
        let response = self.send(self.client.get(url), url).await?;
        let status = response.status();
        Ok((status, Self::response_text(response, url).await?))
    }

    /// Add authorization and send the request.
    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, PolicyError> {
        let authorization = self.token_cache.current_as_header_value(&self.client).await?;
        request
            .header(&AUTHORIZATION, authorization)
            .send()
            .await
            .map_err(|e| {
                PolicyErrorKind::BackendCommunication.error_with_msg(format!(
                    "Failed request to '{url}': {:?}",
                    e.without_url()
                ))
            })
    }

    async fn response_text(response: Response, url: &str) -> Result<String, PolicyError> {
        response.text().await.map_err(|e| {
            PolicyErrorKind::BackendCommunication.error_with_msg(format!(
                "Failed request to '{url}': Failed to parse response body as text: {:?}",
                e.without_url()
            ))
        })
    }

    fn header_as_string(response: &Response, header_key: &str) -> Option<String> {
        response
            .headers()
            .get(header_key)
            .and_then(|header_value| header_value.to_str().ok())
            .filter(|header_value| !header_value.is_empty())
            .map(str::to_owned)
    }

    fn unexpected_status(url: &str, status: StatusCode) -> PolicyError {
        PolicyErrorKind::BackendCommunication
            .error_with_msg(format!("Failed request to '{url}': status_code {status}."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_urls() {
        let credentials = AzureCredentials::from_json(
            r#"{"appId":"a","secret":"s","tenant":"t","subscription":"sub"}"#,
        )
        .unwrap();
        let client = ArmClient::new(credentials, Duration::from_secs(10)).unwrap();
        let url = client.named_values_url("rg", "apim");
        assert_eq!(
            url,
            "https://management.azure.com/subscriptions/sub/resourceGroups/rg/providers/Microsoft.ApiManagement/service/apim/namedValues"
        );
        assert_eq!(
            ArmClient::with_api_version(&url),
            format!("{url}?api-version=2022-08-01")
        );
    }
}
