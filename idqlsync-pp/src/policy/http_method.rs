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

//! HTTP methods allowed as policy actions.

use super::PolicyError;
use super::PolicyErrorKind;
use std::fmt;
use std::str::FromStr;

/// HTTP method used as the action of a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HttpMethod {
    /// `CONNECT`
    Connect,
    /// `DELETE`
    Delete,
    /// `GET`
    Get,
    /// `HEAD`
    Head,
    /// `OPTIONS`
    Options,
    /// `PATCH`
    Patch,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `TRACE`
    Trace,
}

impl HttpMethod {
    /// Prefix of IDQL action URIs that refer to HTTP methods.
    pub const ACTION_URI_PREFIX: &'static str = "http:";

    /// All supported methods.
    pub const ALL: [HttpMethod; 9] = [
        Self::Connect,
        Self::Delete,
        Self::Get,
        Self::Head,
        Self::Options,
        Self::Patch,
        Self::Post,
        Self::Put,
        Self::Trace,
    ];

    /// Canonical upper case name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Delete => "DELETE",
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Trace => "TRACE",
        }
    }

    /// Strip an optional `http:` prefix and surrounding whitespace from an
    /// action.
    ///
    /// The result might still be empty or an unknown method.
    pub fn strip_action_prefix(action: &str) -> &str {
        let action = action.trim();
        action
            .strip_prefix(Self::ACTION_URI_PREFIX)
            .unwrap_or(action)
            .trim()
    }

    /// Parse an action like `http:GET`, ` get ` or `POST`.
    pub fn from_action(action: &str) -> Result<Self, PolicyError> {
        Self::from_str(Self::strip_action_prefix(action))
    }

    /// Return the IDQL action URI form, e.g. `http:GET`.
    pub fn as_action_uri(&self) -> String {
        Self::ACTION_URI_PREFIX.to_string() + self.as_str()
    }
}

impl FromStr for HttpMethod {
    type Err = PolicyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let upper = value.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == upper)
            .ok_or_else(|| {
                PolicyErrorKind::MalformedInput
                    .error_with_msg(format!("Invalid http method: '{value}'."))
            })
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_actions() {
        assert_eq!(HttpMethod::from_action("http:GET").unwrap(), HttpMethod::Get);
        assert_eq!(HttpMethod::from_action("  http:put ").unwrap(), HttpMethod::Put);
        assert_eq!(HttpMethod::from_action("Options").unwrap(), HttpMethod::Options);
        let e = HttpMethod::from_action("http:SOMETHING").unwrap_err();
        assert_eq!(e.kind(), &PolicyErrorKind::MalformedInput);
        assert!(e.to_string().contains("Invalid http method"));
        assert!(HttpMethod::from_action("http:").is_err());
    }

    #[test]
    fn action_uri() {
        for method in HttpMethod::ALL {
            assert_eq!(HttpMethod::from_action(&method.as_action_uri()).unwrap(), method);
        }
    }
}
