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

//! Policy provider errors.

use std::error::Error;
use std::fmt;

/// Cause of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyErrorKind {
    /// General failure. See message for details.
    Unspecified,
    /// Malformed policy input. E.g. empty resource or unknown HTTP method.
    MalformedInput,
    /// The declared backend table layout is unusable.
    InvalidTableDefinition,
    /// Failed to communicate with the policy backend.
    BackendCommunication,
    /// A backend item could not be turned into a canonical policy.
    DecodeFailure,
    /// A remote long-running operation did not succeed.
    OperationFailed,
    /// The operation was cancelled by the caller.
    Cancelled,
}

impl PolicyErrorKind {
    /// Create a new instance with an error message.
    pub fn error_with_msg<S: AsRef<str>>(self, msg: S) -> PolicyError {
        PolicyError {
            kind: self,
            msg: Some(msg.as_ref().to_string()),
        }
    }

    /// Create a new instance without an error message.
    pub fn error(self) -> PolicyError {
        PolicyError {
            kind: self,
            msg: None,
        }
    }
}

impl fmt::Display for PolicyErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/** Policy provider error.

Create a new instance via [PolicyErrorKind].
*/
#[derive(Debug, Clone)]
pub struct PolicyError {
    kind: PolicyErrorKind,
    msg: Option<String>,
}

impl PolicyError {
    /// Return the type of error.
    pub fn kind(&self) -> &PolicyErrorKind {
        &self.kind
    }

    /// Return the error message if any.
    pub fn msg(&self) -> Option<&str> {
        self.msg.as_deref()
    }

    /// Prefix the message with the name of the failing operation.
    ///
    /// The result reads `in {operation}: {previous message}`.
    pub fn in_operation(self, operation: &str) -> Self {
        let cause = self.msg.unwrap_or_else(|| self.kind.to_string());
        Self {
            kind: self.kind,
            msg: Some(format!("in {operation}: {cause}")),
        }
    }
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(msg) = &self.msg {
            write!(f, "{} {}", self.kind, msg)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

impl AsRef<PolicyError> for PolicyError {
    fn as_ref(&self) -> &PolicyError {
        self
    }
}

impl Error for PolicyError {}

impl From<serde_json::Error> for PolicyError {
    fn from(e: serde_json::Error) -> Self {
        PolicyErrorKind::DecodeFailure.error_with_msg(format!("Invalid JSON: {e}"))
    }
}
