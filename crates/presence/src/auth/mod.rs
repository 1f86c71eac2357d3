// Credential verification against the workspace identity service.
//
// Each connection presents a bearer credential scoped to one room; the
// server confirms it with `POST {base}/collaboration/verify` before
// any room bookkeeping happens.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use url::Url;

use tessera_common::types::UserIdentity;

/// Success body from the verification endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponse {
    user_id: String,
    #[serde(default)]
    user_name: Option<String>,
    #[serde(default)]
    user_image: Option<String>,
}

#[derive(Debug, Error)]
pub enum VerifyError {
    /// The identity service rejected the credential.
    #[error("credential rejected by identity service")]
    Rejected,

    /// No verification endpoint is configured.
    #[error("verification endpoint is not configured")]
    Unconfigured,

    /// The identity service could not be reached or returned an
    /// unreadable response.
    #[error("identity service call failed: {0}")]
    Unavailable(#[from] anyhow::Error),
}

/// Verifies room-scoped collaboration credentials.
#[derive(Debug, Clone)]
pub enum CollabVerifier {
    /// Production path: call out to the identity service.
    Http { client: reqwest::Client, base_url: Url },

    /// No endpoint configured; every handshake fails with a config error.
    Unconfigured,

    /// In-memory credential table for tests.
    #[cfg_attr(not(test), allow(dead_code))]
    Memory(Arc<RwLock<HashMap<String, UserIdentity>>>),
}

impl CollabVerifier {
    pub fn from_config(auth_base_url: Option<Url>) -> Self {
        match auth_base_url {
            Some(base_url) => Self::Http { client: reqwest::Client::new(), base_url },
            None => Self::Unconfigured,
        }
    }

    /// Verify a credential for a specific room. The room id rides in
    /// the request body so a credential cannot be replayed against an
    /// unrelated room.
    pub async fn verify(&self, token: &str, room_id: &str) -> Result<UserIdentity, VerifyError> {
        match self {
            Self::Unconfigured => Err(VerifyError::Unconfigured),
            Self::Http { client, base_url } => {
                let verify_url =
                    format!("{}/collaboration/verify", base_url.as_str().trim_end_matches('/'));
                let response = client
                    .post(&verify_url)
                    .bearer_auth(token)
                    .json(&serde_json::json!({ "roomId": room_id }))
                    .send()
                    .await
                    .context("verification request failed")?;

                if !response.status().is_success() {
                    return Err(VerifyError::Rejected);
                }

                let body: VerifyResponse = response
                    .json()
                    .await
                    .context("verification response was not valid JSON")?;

                Ok(identity_from_response(body))
            }
            Self::Memory(store) => {
                store.read().await.get(token).cloned().ok_or(VerifyError::Rejected)
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self::Memory(Arc::new(RwLock::new(HashMap::new())))
    }

    #[cfg(test)]
    pub(crate) async fn grant_for_tests(&self, token: &str, identity: UserIdentity) {
        if let Self::Memory(store) = self {
            store.write().await.insert(token.to_string(), identity);
        }
    }
}

fn identity_from_response(body: VerifyResponse) -> UserIdentity {
    // Display name falls back to the user id when the identity service
    // omits it.
    let user_name = body.user_name.unwrap_or_else(|| body.user_id.clone());
    UserIdentity { user_id: body.user_id, user_name, user_image: body.user_image }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(user_id: &str) -> UserIdentity {
        UserIdentity { user_id: user_id.into(), user_name: "Ada".into(), user_image: None }
    }

    #[tokio::test]
    async fn unconfigured_verifier_reports_missing_config() {
        let verifier = CollabVerifier::from_config(None);
        let result = verifier.verify("any-token", "room-1").await;
        assert!(matches!(result, Err(VerifyError::Unconfigured)));
    }

    #[tokio::test]
    async fn memory_verifier_accepts_granted_tokens() {
        let verifier = CollabVerifier::for_tests();
        verifier.grant_for_tests("good-token", identity("user-1")).await;

        let verified = verifier.verify("good-token", "room-1").await.unwrap();
        assert_eq!(verified.user_id, "user-1");
    }

    #[tokio::test]
    async fn memory_verifier_rejects_unknown_tokens() {
        let verifier = CollabVerifier::for_tests();
        let result = verifier.verify("bad-token", "room-1").await;
        assert!(matches!(result, Err(VerifyError::Rejected)));
    }

    #[test]
    fn display_name_falls_back_to_user_id() {
        let verified = identity_from_response(VerifyResponse {
            user_id: "user-9".into(),
            user_name: None,
            user_image: None,
        });
        assert_eq!(verified.user_name, "user-9");
    }

    #[test]
    fn verify_response_decodes_camel_case_body() {
        let body: VerifyResponse = serde_json::from_str(
            r#"{"userId":"user-3","userName":"Lin","userImage":"https://cdn.tessera.dev/a/lin.png"}"#,
        )
        .unwrap();
        assert_eq!(body.user_id, "user-3");
        assert_eq!(body.user_name.as_deref(), Some("Lin"));
        assert!(body.user_image.is_some());
    }
}
