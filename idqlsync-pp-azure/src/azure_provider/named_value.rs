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

//! API Management Named Value resource representation.

use super::NamedValueKey;
use idqlsync_pp::policy::PolicyErrorKind;
use idqlsync_pp::policy::PolicyError;
use idqlsync_pp::policy::ResourceActionRoles;
use idqlsync_pp::pp::RarMapper;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

/// API Management Named Value as returned by Azure Resource Manager.
///
/// Only the fields needed to express a policy are decoded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamedValueContract {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    properties: NamedValueProperties,
}

/// Properties of a [NamedValueContract].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedValueProperties {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    value: Option<String>,
}

impl NamedValueContract {
    /// Return a new instance with the display name and value set.
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: Some(name.to_owned()),
            properties: NamedValueProperties {
                display_name: Some(name.to_owned()),
                value: Some(value.to_owned()),
            },
        }
    }

    /// Parse from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Request body of a value only update.
    pub fn value_update_json(value: &str) -> String {
        serde_json::json!({ "properties": { "value": value } }).to_string()
    }

    /// Members encoded as a Named Value value.
    pub fn encode_members(members: &[String]) -> String {
        Value::from(members).to_string()
    }

    /// The Named Value name. Falls back to the display name.
    pub fn name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or(self.properties.display_name.as_deref())
    }

    /// The Named Value value.
    pub fn value(&self) -> Option<&str> {
        self.properties.value.as_deref()
    }
}

impl RarMapper for NamedValueContract {
    fn map_to(&self) -> Result<ResourceActionRoles, PolicyError> {
        let name = self.name().ok_or_else(|| {
            PolicyErrorKind::DecodeFailure.error_with_msg("Named Value without name.")
        })?;
        let key = NamedValueKey::from_str(name).map_err(|e| {
            PolicyErrorKind::DecodeFailure
                .error_with_msg(format!("Named Value '{name}' is not a policy: {e}"))
        })?;
        let members: Vec<String> = match self.value() {
            Some(value) if !value.trim().is_empty() => {
                serde_json::from_str(value).map_err(|e| {
                    PolicyErrorKind::DecodeFailure.error_with_msg(format!(
                        "Named Value '{name}' has a value that is not a JSON array of strings: {e}"
                    ))
                })?
            }
            _ => vec![],
        };
        ResourceActionRoles::with_method(key.resource(), key.method(), &members)
    }
}

/// Page of Named Values.
///
/// Items are kept as raw JSON so that a single odd item can't spoil the page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedValueCollection {
    #[serde(default)]
    value: Option<Vec<Value>>,
    #[serde(default)]
    next_link: Option<String>,
}

impl NamedValueCollection {
    /// Parse from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Link to the next page if any.
    pub fn next_link(&self) -> Option<&str> {
        self.next_link.as_deref().filter(|link| !link.is_empty())
    }

    /// Consume the page and decode every item on its own.
    pub fn into_contracts(self) -> Vec<Result<NamedValueContract, PolicyError>> {
        self.value
            .unwrap_or_default()
            .into_iter()
            .map(|item| Ok(serde_json::from_value::<NamedValueContract>(item)?))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_page() {
        let page = NamedValueCollection::from_json(
            r#"{
                "value": [
                    {
                        "id": "/subscriptions/s/resourceGroups/g/providers/Microsoft.ApiManagement/service/a/namedValues/resrol-httpget--hr-us",
                        "type": "Microsoft.ApiManagement/service/namedValues",
                        "name": "resrol-httpget--hr-us",
                        "properties": { "displayName": "resrol-httpget--hr-us", "value": "[\"b\",\"a\"]", "secret": false, "tags": null }
                    }
                ],
                "nextLink": "https://management.azure.com/next"
            }"#,
        )
        .unwrap();
        assert_eq!(page.next_link(), Some("https://management.azure.com/next"));
        let contracts = page.into_contracts();
        let rar = contracts[0].as_ref().unwrap().map_to().unwrap();
        assert_eq!(rar.resource(), "/hr/us");
        assert_eq!(rar.actions(), ["GET"]);
        assert_eq!(rar.members(), ["a", "b"]);
    }

    #[test]
    fn odd_item_does_not_spoil_page() {
        let page = NamedValueCollection::from_json(
            r#"{"value":[
                {"name":"resrol-httpget--a","properties":{"value":"[\"x\"]","tags":null}},
                {"name":"resrol-httpget--b","properties":"unexpected"},
                {"name":"resrol-httpput--c","properties":{"value":42}},
                {"name":"resrol-httppost--d","properties":{"value":"[]","tags":["t"]}}
            ]}"#,
        )
        .unwrap();
        assert!(page.next_link().is_none());
        let contracts = page.into_contracts();
        assert_eq!(contracts.len(), 4);
        assert!(contracts[0].is_ok());
        assert_eq!(
            contracts[1].as_ref().unwrap_err().kind(),
            &PolicyErrorKind::DecodeFailure
        );
        assert!(contracts[2].is_err());
        assert!(contracts[3].is_ok());
    }

    #[test]
    fn last_page_has_no_next_link() {
        let page = NamedValueCollection::from_json(r#"{"value":null,"nextLink":""}"#).unwrap();
        assert!(page.next_link().is_none());
        assert!(page.into_contracts().is_empty());
    }

    #[test]
    fn decode_failures() {
        let not_policy = NamedValueContract::new("unrelated-setting", "x");
        assert_eq!(
            not_policy.map_to().unwrap_err().kind(),
            &PolicyErrorKind::DecodeFailure
        );
        let not_array = NamedValueContract::new("resrol-httpget--hr", "Read.HR");
        assert_eq!(
            not_array.map_to().unwrap_err().kind(),
            &PolicyErrorKind::DecodeFailure
        );
    }

    #[test]
    fn update_body() {
        let value = NamedValueContract::encode_members(&["a".to_string(), "b".to_string()]);
        assert_eq!(value, r#"["a","b"]"#);
        let body: serde_json::Value =
            serde_json::from_str(&NamedValueContract::value_update_json(&value)).unwrap();
        assert_eq!(body["properties"]["value"], r#"["a","b"]"#);
    }
}
