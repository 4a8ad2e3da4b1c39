use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Login used by the worker against the remote service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub identity: String,
    pub secret: String,
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("identity", &self.identity)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Connection settings supplied by the credential source, passed through
/// verbatim to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub endpoint: String,
    pub principal: Principal,
}

impl Credentials {
    pub fn new(
        endpoint: impl Into<String>,
        identity: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            principal: Principal {
                identity: identity.into(),
                secret: secret.into(),
            },
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.trim().is_empty() {
            return Err("credentials: endpoint url is empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    pub endpoint: String,
    pub principal: Principal,
    /// `Resource.verb`, never empty.
    pub operation: String,
    pub parameters: Value,
}

/// Document shape the worker reads from its stdin.
#[derive(Serialize)]
struct WireRequest<'a> {
    url: &'a str,
    username: &'a str,
    password: &'a str,
    action: &'a str,
    params: &'a Value,
}

impl RequestEnvelope {
    pub fn new(credentials: &Credentials, operation: impl Into<String>, parameters: Value) -> Self {
        Self {
            endpoint: credentials.endpoint.clone(),
            principal: credentials.principal.clone(),
            operation: operation.into(),
            parameters,
        }
    }

    pub fn empty_parameters() -> Value {
        Value::Object(Map::new())
    }

    /// Serialize to the single JSON text block written to the worker.
    pub fn to_wire(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&WireRequest {
            url: &self.endpoint,
            username: &self.principal.identity,
            password: &self.principal.secret,
            action: &self.operation,
            params: &self.parameters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn creds() -> Credentials {
        Credentials::new("https://tcms.example/xml-rpc/", "alice", "s3cret")
    }

    #[test]
    fn wire_form_uses_worker_field_names() {
        let env = RequestEnvelope::new(&creds(), "TestCase.filter", json!({ "pk": 7 }));
        let wire: Value = serde_json::from_slice(&env.to_wire().unwrap()).unwrap();
        assert_eq!(
            wire,
            json!({
                "url": "https://tcms.example/xml-rpc/",
                "username": "alice",
                "password": "s3cret",
                "action": "TestCase.filter",
                "params": { "pk": 7 },
            })
        );
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let env = RequestEnvelope::new(&creds(), "Tag.filter", RequestEnvelope::empty_parameters());
        let dbg = format!("{env:?}");
        assert!(!dbg.contains("s3cret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn empty_endpoint_is_rejected() {
        let c = Credentials::new("  ", "u", "p");
        assert!(c.validate().is_err());
        assert!(creds().validate().is_ok());
    }
}
