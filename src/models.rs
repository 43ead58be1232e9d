//! Fragment models
//!
//! This module contains the data types exchanged with the fragments service.
//! The client passes response bodies through as `serde_json::Value`; the typed
//! views here are optional helpers for callers that want them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fragment metadata as stored by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    pub id: String,
    pub owner_id: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
}

/// The fragments owned by a user, either as bare ids or expanded metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FragmentList {
    Ids(Vec<String>),
    Expanded(Vec<Fragment>),
}

impl FragmentList {
    /// Decodes a list response body.
    ///
    /// Accepts the service wrapper (`{"status": "ok", "fragments": [...]}`)
    /// or a bare array.
    pub fn from_body(body: &Value) -> Result<Self, serde_json::Error> {
        let list = body.get("fragments").unwrap_or(body);
        Self::deserialize(list)
    }

    /// Returns the fragment ids in service order
    pub fn ids(&self) -> Vec<&str> {
        match self {
            FragmentList::Ids(ids) => ids.iter().map(String::as_str).collect(),
            FragmentList::Expanded(fragments) => {
                fragments.iter().map(|f| f.id.as_str()).collect()
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FragmentList::Ids(ids) => ids.len(),
            FragmentList::Expanded(fragments) => fragments.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A response body after content negotiation
#[derive(Debug, Clone, PartialEq)]
pub enum FragmentBody {
    /// The response declared `application/json`
    Json(Value),
    /// Any other content type, valid UTF-8
    Text(String),
    /// Any other content type, not valid UTF-8
    Binary(Vec<u8>),
}

impl FragmentBody {
    /// Picks the representation from the response `content-type`.
    ///
    /// JSON bodies are decoded; everything else is kept byte-for-byte.
    pub fn negotiate(content_type: Option<&str>, body: Vec<u8>) -> Result<Self, serde_json::Error> {
        if is_json(content_type) {
            return serde_json::from_slice(&body).map(FragmentBody::Json);
        }

        Ok(match String::from_utf8(body) {
            Ok(text) => FragmentBody::Text(text),
            Err(err) => FragmentBody::Binary(err.into_bytes()),
        })
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            FragmentBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FragmentBody::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The raw bytes of a non-JSON body, or the serialized JSON
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            FragmentBody::Json(value) => value.to_string().into_bytes(),
            FragmentBody::Text(text) => text.clone().into_bytes(),
            FragmentBody::Binary(bytes) => bytes.clone(),
        }
    }
}

/// Result of a successful create
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedFragment {
    pub data: Value,
    pub location: Option<String>,
}

impl CreatedFragment {
    /// Decodes the `fragment` member of the response body, if present
    pub fn fragment(&self) -> Option<Fragment> {
        self.data
            .get("fragment")
            .and_then(|f| Fragment::deserialize(f).ok())
    }
}

pub(crate) fn is_json(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.contains("application/json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fragment_json(id: &str) -> Value {
        json!({
            "id": id,
            "ownerId": "11d4c22e42c8f61feaba154683dea407b101cfd90987dda9e342843263ca420a",
            "created": "2021-11-02T15:09:50.403Z",
            "updated": "2021-11-02T15:09:50.403Z",
            "type": "text/plain",
            "size": 256
        })
    }

    #[test]
    fn test_fragment_list_ids_from_wrapper() {
        let body = json!({ "status": "ok", "fragments": ["a", "b"] });
        let list = FragmentList::from_body(&body).unwrap();

        assert_eq!(list, FragmentList::Ids(vec!["a".into(), "b".into()]));
        assert_eq!(list.ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_fragment_list_expanded() {
        let body = json!({
            "status": "ok",
            "fragments": [fragment_json("a"), fragment_json("b")]
        });
        let list = FragmentList::from_body(&body).unwrap();

        let FragmentList::Expanded(fragments) = &list else {
            panic!("expected expanded list, got {:?}", list);
        };
        assert_eq!(fragments[0].mime_type, "text/plain");
        assert_eq!(fragments[1].size, 256);
        assert_eq!(list.ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_fragment_list_bare_array_and_empty() {
        let list = FragmentList::from_body(&json!(["x"])).unwrap();
        assert_eq!(list.len(), 1);

        let empty = FragmentList::from_body(&json!({ "fragments": [] })).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_fragment_list_rejects_non_list() {
        assert!(FragmentList::from_body(&json!({ "fragments": 3 })).is_err());
    }

    #[test]
    fn test_negotiate_json() {
        let body = FragmentBody::negotiate(
            Some("application/json; charset=utf-8"),
            br#"{"status":"ok"}"#.to_vec(),
        )
        .unwrap();
        assert_eq!(body, FragmentBody::Json(json!({ "status": "ok" })));
    }

    #[test]
    fn test_negotiate_text_is_unchanged() {
        let raw = "# heading\n\n  spaced  \n";
        let body = FragmentBody::negotiate(Some("text/markdown"), raw.as_bytes().to_vec()).unwrap();
        assert_eq!(body.as_text(), Some(raw));
    }

    #[test]
    fn test_negotiate_json_looking_text_stays_text() {
        let body = FragmentBody::negotiate(Some("text/plain"), b"{\"a\":1}".to_vec()).unwrap();
        assert_eq!(body, FragmentBody::Text("{\"a\":1}".into()));
    }

    #[test]
    fn test_negotiate_binary_and_missing_content_type() {
        let png = vec![0x89, b'P', b'N', b'G', 0xff, 0x00];
        let body = FragmentBody::negotiate(Some("image/png"), png.clone()).unwrap();
        assert_eq!(body, FragmentBody::Binary(png.clone()));
        assert_eq!(body.to_bytes(), png);

        let body = FragmentBody::negotiate(None, b"hello".to_vec()).unwrap();
        assert_eq!(body.as_text(), Some("hello"));
    }

    #[test]
    fn test_negotiate_bad_json_fails() {
        assert!(FragmentBody::negotiate(Some("application/json"), b"not json".to_vec()).is_err());
    }

    #[test]
    fn test_created_fragment_decodes_fragment() {
        let created = CreatedFragment {
            data: json!({ "status": "ok", "fragment": fragment_json("abc") }),
            location: None,
        };
        assert_eq!(created.fragment().map(|f| f.id), Some("abc".to_string()));

        let bare = CreatedFragment {
            data: json!({ "status": "ok" }),
            location: None,
        };
        assert!(bare.fragment().is_none());
    }
}
