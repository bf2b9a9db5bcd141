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

//! Service principal credentials and access token cache.

use crossbeam_skiplist::SkipMap;
use idqlsync_pp::policy::PolicyError;
use idqlsync_pp::policy::PolicyErrorKind;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

/** Service principal credentials.

```json
{
    "appId": "...",
    "secret": "...",
    "tenant": "...",
    "subscription": "..."
}
```

`password`, as in the output of `az ad sp create-for-rbac`, is accepted as an
alias of `secret`.
*/
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureCredentials {
    app_id: String,
    #[serde(alias = "password")]
    secret: String,
    tenant: String,
    subscription: String,
}

impl fmt::Debug for AzureCredentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("AzureCredentials")
            .field("app_id", &self.app_id)
            .field("secret", &"*redacted*")
            .field("tenant", &self.tenant)
            .field("subscription", &self.subscription)
            .finish()
    }
}

impl AzureCredentials {
    /// Parse credentials from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        let credentials: Self = serde_json::from_str(json).map_err(|e| {
            PolicyErrorKind::MalformedInput
                .error_with_msg(format!("Unable to parse Azure credentials: {e}"))
        })?;
        for (name, value) in [
            ("appId", &credentials.app_id),
            ("secret", &credentials.secret),
            ("tenant", &credentials.tenant),
            ("subscription", &credentials.subscription),
        ] {
            if value.trim().is_empty() {
                Err(PolicyErrorKind::MalformedInput
                    .error_with_msg(format!("Azure credentials have an empty '{name}'.")))?;
            }
        }
        Ok(credentials)
    }

    /// Application (client) identifier.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Directory (tenant) identifier.
    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    /// Subscription identifier.
    pub fn subscription(&self) -> &str {
        &self.subscription
    }
}

/// Access token response from the identity platform.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct AccessToken {
    token: String,
    expires: Instant,
}

/// Acquires and caches access tokens for Azure Resource Manager using the
/// client credentials grant.
pub struct AccessTokenCache {
    credentials: AzureCredentials,
    authority_host: String,
    access_token: SkipMap<(), Arc<AccessToken>>,
}

impl AccessTokenCache {
    const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
    const SCOPE: &str = "https://management.azure.com/.default";
    /// Tokens are renewed this long before they expire.
    const RENEWAL_MARGIN: Duration = Duration::from_secs(60);
    const DEFAULT_LIFETIME: Duration = Duration::from_secs(300);

    /// Return a new instance.
    pub fn new(credentials: AzureCredentials) -> Arc<Self> {
        Self::with_authority_host(credentials, Self::DEFAULT_AUTHORITY_HOST)
    }

    /// Return a new instance using a non-default identity platform.
    pub fn with_authority_host(credentials: AzureCredentials, authority_host: &str) -> Arc<Self> {
        Arc::new(Self {
            credentials,
            authority_host: authority_host.trim_end_matches('/').to_owned(),
            access_token: SkipMap::default(),
        })
    }

    /// The credentials tokens are acquired for.
    pub fn credentials(&self) -> &AzureCredentials {
        &self.credentials
    }

    /// Return the `Bearer {access_token}` value used to populate the HTTP
    /// `Authorization` header, acquiring a new token when needed.
    pub async fn current_as_header_value(&self, client: &Client) -> Result<String, PolicyError> {
        let now = Instant::now();
        if let Some(entry) = self.access_token.get(&())
            && entry.value().expires > now + Self::RENEWAL_MARGIN
        {
            return Ok(format!("Bearer {}", entry.value().token));
        }
        let access_token = self.acquire(client).await?;
        let header_value = format!("Bearer {}", access_token.token);
        self.access_token.insert((), Arc::new(access_token));
        Ok(header_value)
    }

    async fn acquire(&self, client: &Client) -> Result<AccessToken, PolicyError> {
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host, self.credentials.tenant
        );
        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "Acquiring access token for app '{}' from '{url}'.",
                self.credentials.app_id
            );
        }
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.app_id.as_str()),
            ("client_secret", self.credentials.secret.as_str()),
            ("scope", Self::SCOPE),
        ];
        let response = client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                PolicyErrorKind::BackendCommunication.error_with_msg(format!(
                    "Token request to '{url}' failed: {:?}",
                    e.without_url()
                ))
            })?;
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            PolicyErrorKind::BackendCommunication.error_with_msg(format!(
                "Token response from '{url}' could not be read: {:?}",
                e.without_url()
            ))
        })?;
        if !status.is_success() {
            // Don't leak the response body into the error!
            Err(PolicyErrorKind::BackendCommunication
                .error_with_msg(format!("Token request to '{url}' failed: status {status}.")))?;
        }
        Self::parse_token_response(&body, Instant::now())
    }

    fn parse_token_response(body: &str, now: Instant) -> Result<AccessToken, PolicyError> {
        let response: TokenResponse = serde_json::from_str(body)?;
        let lifetime = response
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(Self::DEFAULT_LIFETIME);
        Ok(AccessToken {
            token: response.access_token,
            expires: now + lifetime,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREDENTIALS: &str = r#"{
        "appId": "00000000-0000-0000-0000-000000000001",
        "displayName": "idqlsync",
        "secret": "very-secret",
        "tenant": "00000000-0000-0000-0000-000000000002",
        "subscription": "00000000-0000-0000-0000-000000000003"
    }"#;

    #[test]
    fn parse_credentials() {
        let credentials = AzureCredentials::from_json(CREDENTIALS).unwrap();
        assert_eq!(credentials.app_id(), "00000000-0000-0000-0000-000000000001");
        assert_eq!(
            credentials.subscription(),
            "00000000-0000-0000-0000-000000000003"
        );
        assert!(!format!("{credentials:?}").contains("very-secret"));
    }

    #[test]
    fn password_alias() {
        let credentials = AzureCredentials::from_json(
            r#"{"appId":"a","password":"s","tenant":"t","subscription":"x"}"#,
        )
        .unwrap();
        assert_eq!(credentials.tenant(), "t");
    }

    #[test]
    fn reject_incomplete_credentials() {
        let e = AzureCredentials::from_json(
            r#"{"appId":"a","secret":"","tenant":"t","subscription":"x"}"#,
        )
        .unwrap_err();
        assert_eq!(e.kind(), &PolicyErrorKind::MalformedInput);
        assert!(AzureCredentials::from_json(r#"{"appId":"a"}"#).is_err());
    }

    #[test]
    fn token_lifetime() {
        let now = Instant::now();
        let token = AccessTokenCache::parse_token_response(
            r#"{"token_type":"Bearer","expires_in":3599,"access_token":"abc"}"#,
            now,
        )
        .unwrap();
        assert_eq!(token.token, "abc");
        assert_eq!(token.expires, now + Duration::from_secs(3599));
    }
}
