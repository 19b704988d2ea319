// Copyright 2024 SAP SE
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::util::from_object;

/// Body of a registry push notification. Every level may be absent or `null`,
/// but a present level must be a JSON object.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Default, Deserialize)]
pub struct PushEvent {
    #[serde(default, deserialize_with = "object")]
    pub push_data: Option<PushData>,
    #[serde(default, deserialize_with = "object")]
    pub repository: Option<Repository>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PushData {
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl PushEvent {
    /// Decodes the first JSON value of `body`, anything after it is ignored.
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        let value = serde_json::Deserializer::from_slice(body)
            .into_iter::<Value>()
            .next()
            .unwrap_or_else(|| Err(serde_json::Error::custom("EOF")))?;
        Ok(from_object(value)?.unwrap_or_default())
    }

    /// `namespace/name`, or `None` if either part is missing or empty.
    pub fn image(&self) -> Option<String> {
        let repository = self.repository.as_ref()?;
        let namespace = repository.namespace.as_deref().filter(|s| !s.is_empty())?;
        let name = repository.name.as_deref().filter(|s| !s.is_empty())?;
        Some(format!("{namespace}/{name}"))
    }

    pub fn tag(&self) -> &str {
        self.push_data
            .as_ref()
            .and_then(|push_data| push_data.tag.as_deref())
            .unwrap_or_default()
    }
}

fn object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    from_object(Value::deserialize(deserializer)?).map_err(D::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::PushEvent;

    #[test]
    fn complete_event() {
        let event = PushEvent::parse(
            br#"{"push_data":{"tag":"latest","pusher":"me"},"repository":{"namespace":"a","name":"b","status":"Active"}}"#,
        )
        .unwrap();
        assert_eq!(event.image().as_deref(), Some("a/b"));
        assert_eq!(event.tag(), "latest");
    }

    #[test]
    fn missing_details() {
        for body in [
            r#"{"push_data":{"tag":"latest"},"repository":{"namespace":"a"}}"#,
            r#"{"push_data":{"tag":"latest"},"repository":{"name":"b"}}"#,
            r#"{"push_data":{"tag":"latest"},"repository":{"namespace":"","name":"b"}}"#,
            r#"{"push_data":{"tag":"latest"},"repository":null}"#,
            r#"{"push_data":{"tag":"latest"}}"#,
            "{}",
            "null",
        ] {
            let event = PushEvent::parse(body.as_bytes()).unwrap();
            assert!(event.image().is_none(), "{body} should lack details");
        }
    }

    #[test]
    fn tag_may_be_empty() {
        let event = PushEvent::parse(br#"{"repository":{"namespace":"a","name":"b"}}"#).unwrap();
        assert_eq!(event.image().as_deref(), Some("a/b"));
        assert_eq!(event.tag(), "");
    }

    #[test]
    fn invalid_json() {
        assert!(PushEvent::parse(b"").is_err());
        assert!(PushEvent::parse(b"{\"repository\":").is_err());
        assert!(PushEvent::parse(br#"{"repository":{"namespace":1,"name":"b"}}"#).is_err());
        assert!(PushEvent::parse(b"   ").is_err());
    }

    #[test]
    fn arrays_are_not_objects() {
        for body in [
            "[]",
            r#"[{"tag":"latest"},{"namespace":"a","name":"b"}]"#,
            r#"{"push_data":{"tag":"latest"},"repository":["a","b"]}"#,
            r#"{"push_data":["latest"],"repository":{"namespace":"a","name":"b"}}"#,
            r#"{"push_data":{"tag":"latest"},"repository":"a/b"}"#,
        ] {
            let err = PushEvent::parse(body.as_bytes()).unwrap_err();
            assert!(err.to_string().contains("expected a JSON object"), "{body}: {err}");
        }
    }

    #[test]
    fn trailing_data_is_ignored() {
        let event =
            PushEvent::parse(br#"{"push_data":{"tag":"latest"},"repository":{"namespace":"a","name":"b"}} x"#).unwrap();
        assert_eq!(event.image().as_deref(), Some("a/b"));
        assert_eq!(event.tag(), "latest");
    }
}
