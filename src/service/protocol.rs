use serde::{Deserialize, Serialize};

pub const MESSAGE_SUCCESS: &str = "Success";
pub const MESSAGE_NOT_FOUND: &str = "Person Not Found";

/// JSON body returned by the matching service, on success and on handled errors.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchPayload {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub signed_url: Option<String>,
    // Directory fields (rekognitionid, objectKey, error...) kept for diagnostics
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Tri-state result of one authentication attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    Success {
        first_name: String,
        last_name: String,
        signed_url: Option<String>,
    },
    NotFound {
        signed_url: Option<String>,
    },
    Error {
        message: String,
    },
}

impl From<MatchPayload> for AuthOutcome {
    fn from(payload: MatchPayload) -> Self {
        match payload.message.as_str() {
            MESSAGE_SUCCESS => AuthOutcome::Success {
                first_name: payload.first_name.unwrap_or_default(),
                last_name: payload.last_name.unwrap_or_default(),
                signed_url: payload.signed_url,
            },
            MESSAGE_NOT_FOUND => AuthOutcome::NotFound {
                signed_url: payload.signed_url,
            },
            _ => AuthOutcome::Error {
                message: payload.message,
            },
        }
    }
}

impl AuthOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthOutcome::Success { .. })
    }

    pub fn signed_url(&self) -> Option<&str> {
        match self {
            AuthOutcome::Success { signed_url, .. } | AuthOutcome::NotFound { signed_url } => {
                signed_url.as_deref()
            }
            AuthOutcome::Error { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_payload_carries_directory_fields() {
        let payload: MatchPayload = serde_json::from_str(
            r#"{"message":"Success","firstName":"Jane","lastName":"Doe",
                "signedUrl":"https://x/y.jpg","rekognitionid":"face-1"}"#,
        )
        .unwrap();

        assert_eq!(payload.extra.get("rekognitionid").and_then(|v| v.as_str()), Some("face-1"));
        assert_eq!(
            AuthOutcome::from(payload),
            AuthOutcome::Success {
                first_name: "Jane".into(),
                last_name: "Doe".into(),
                signed_url: Some("https://x/y.jpg".into()),
            }
        );
    }

    #[test]
    fn not_found_keeps_signed_url() {
        let payload: MatchPayload =
            serde_json::from_str(r#"{"message":"Person Not Found","signedUrl":"https://x/y.jpg"}"#).unwrap();
        let outcome = AuthOutcome::from(payload);
        assert!(!outcome.is_authenticated());
        assert_eq!(outcome.signed_url(), Some("https://x/y.jpg"));
    }

    #[test]
    fn anything_else_is_an_error() {
        let payload: MatchPayload =
            serde_json::from_str(r#"{"message":"Internal Server Error","error":"boom"}"#).unwrap();
        assert_eq!(
            AuthOutcome::from(payload),
            AuthOutcome::Error { message: "Internal Server Error".into() }
        );

        let empty: MatchPayload = serde_json::from_str("{}").unwrap();
        assert!(matches!(AuthOutcome::from(empty), AuthOutcome::Error { .. }));
    }

    #[test]
    fn null_signed_url_is_accepted() {
        let payload: MatchPayload =
            serde_json::from_str(r#"{"message":"Person Not Found","signedUrl":null}"#).unwrap();
        assert_eq!(AuthOutcome::from(payload).signed_url(), None);
    }
}
