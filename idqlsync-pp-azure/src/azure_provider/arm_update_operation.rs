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

//! Tracking of an asynchronous Azure Resource Manager update.

use super::ArmClient;
use super::NamedValueContract;
use idqlsync_pp::policy::PolicyError;
use idqlsync_pp::policy::PolicyErrorKind;
use idqlsync_pp::util::LongRunningOperation;
use idqlsync_pp::util::OperationStatus;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;

/// Body of an `Azure-AsyncOperation` status response.
#[derive(Deserialize)]
struct AsyncOperationStatus {
    #[serde(default)]
    status: String,
}

/// A started Named Value update.
pub(super) enum ArmUpdateOperation {
    /// The update completed synchronously.
    Completed(Option<NamedValueContract>),
    /// Status is reported by the `Azure-AsyncOperation` URL and the result is
    /// the updated resource.
    AzureAsyncOperation {
        client: Arc<ArmClient>,
        status_url: String,
        resource_url: String,
    },
    /// The `Location` URL returns `202` while in progress. When done it
    /// returns `204`, or `200`/`201` with or without the resource.
    Location {
        client: Arc<ArmClient>,
        location_url: String,
        resource_url: String,
    },
}

impl ArmUpdateOperation {
    /// Map the `status` of an `Azure-AsyncOperation` response.
    fn async_operation_status(body: &str) -> Result<AsyncStatus, PolicyError> {
        let status: AsyncOperationStatus = serde_json::from_str(body)?;
        Ok(match status.status.to_ascii_lowercase().as_str() {
            "succeeded" => AsyncStatus::Succeeded,
            "failed" | "canceled" | "cancelled" => AsyncStatus::Failed,
            _ => AsyncStatus::InProgress,
        })
    }
}

#[derive(Debug, PartialEq)]
enum AsyncStatus {
    InProgress,
    Succeeded,
    Failed,
}

#[async_trait::async_trait]
impl LongRunningOperation<NamedValueContract> for ArmUpdateOperation {
    async fn poll(&mut self) -> Result<OperationStatus<NamedValueContract>, PolicyError> {
        match self {
            Self::Completed(contract) => contract
                .take()
                .map(OperationStatus::Succeeded)
                .ok_or_else(|| {
                    PolicyErrorKind::Unspecified.error_with_msg("Result was already consumed.")
                }),
            Self::AzureAsyncOperation {
                client,
                status_url,
                resource_url,
            } => {
                let (status, body) = client.get_text(status_url).await?;
                if !status.is_success() {
                    return Ok(OperationStatus::Failed {
                        http_status: Some(status.as_u16()),
                    });
                }
                match Self::async_operation_status(&body)? {
                    AsyncStatus::InProgress => Ok(OperationStatus::InProgress),
                    AsyncStatus::Failed => Ok(OperationStatus::Failed {
                        http_status: Some(status.as_u16()),
                    }),
                    AsyncStatus::Succeeded => client
                        .get_named_value(resource_url)
                        .await
                        .map(OperationStatus::Succeeded),
                }
            }
            Self::Location {
                client,
                location_url,
                resource_url,
            } => {
                let (status, body) = client.get_text(location_url).await?;
                match status {
                    StatusCode::ACCEPTED => Ok(OperationStatus::InProgress),
                    StatusCode::OK | StatusCode::CREATED if !body.trim().is_empty() => {
                        NamedValueContract::from_json(&body).map(OperationStatus::Succeeded)
                    }
                    StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT => client
                        .get_named_value(resource_url)
                        .await
                        .map(OperationStatus::Succeeded),
                    status => Ok(OperationStatus::Failed {
                        http_status: Some(status.as_u16()),
                    }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn async_operation_status() {
        assert_eq!(
            ArmUpdateOperation::async_operation_status(r#"{"status":"InProgress"}"#).unwrap(),
            AsyncStatus::InProgress
        );
        assert_eq!(
            ArmUpdateOperation::async_operation_status(r#"{"status":"Succeeded"}"#).unwrap(),
            AsyncStatus::Succeeded
        );
        assert_eq!(
            ArmUpdateOperation::async_operation_status(
                r#"{"status":"Failed","error":{"code":"x"}}"#
            )
            .unwrap(),
            AsyncStatus::Failed
        );
        assert_eq!(
            ArmUpdateOperation::async_operation_status(r#"{"status":"Canceled"}"#).unwrap(),
            AsyncStatus::Failed
        );
    }

    #[tokio::test]
    async fn completed_update_succeeds_once() {
        let mut operation =
            ArmUpdateOperation::Completed(Some(NamedValueContract::new("n", "[]")));
        assert!(matches!(
            operation.poll().await,
            Ok(OperationStatus::Succeeded(_))
        ));
        assert!(operation.poll().await.is_err());
    }
}
