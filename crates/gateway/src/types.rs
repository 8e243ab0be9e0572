//! Public types for the gateway client.

use std::fmt;

use imagine_protocol::messages::ConnectRequest;

/// Credentials the gateway uses to act on the remote service.
#[derive(Clone, Default)]
pub struct Credentials {
    pub server_id: String,
    pub channel_id: String,
    pub token: String,
}

impl Credentials {
    /// Returns the names of required fields that are empty.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.server_id.is_empty() {
            missing.push("server id");
        }
        if self.channel_id.is_empty() {
            missing.push("channel id");
        }
        if self.token.is_empty() {
            missing.push("token");
        }
        missing
    }
}

// Keeps the token out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("server_id", &self.server_id)
            .field("channel_id", &self.channel_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Everything needed to open a gateway session.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// WebSocket URL, e.g. `ws://127.0.0.1:8062/ws`.
    pub url: String,
    pub credentials: Credentials,
    /// Name reported to the gateway in the handshake.
    pub client_name: String,
}

impl GatewayConfig {
    pub(crate) fn connect_request(&self) -> ConnectRequest {
        ConnectRequest {
            server_id: self.credentials.server_id.clone(),
            channel_id: self.credentials.channel_id.clone(),
            token: self.credentials.token.clone(),
            client_name: self.client_name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let creds = Credentials {
            server_id: "srv".into(),
            channel_id: "chan".into(),
            token: "super-secret".into(),
        };
        let out = format!("{creds:?}");
        assert!(out.contains("srv"));
        assert!(!out.contains("super-secret"));
    }

    #[test]
    fn missing_lists_empty_fields() {
        let creds = Credentials {
            server_id: "srv".into(),
            ..Credentials::default()
        };
        assert_eq!(creds.missing(), ["channel id", "token"]);
        assert!(
            Credentials {
                server_id: "a".into(),
                channel_id: "b".into(),
                token: "c".into(),
            }
            .missing()
            .is_empty()
        );
    }

    #[test]
    fn connect_request_carries_credentials() {
        let config = GatewayConfig {
            url: "ws://localhost/ws".into(),
            credentials: Credentials {
                server_id: "srv".into(),
                channel_id: "chan".into(),
                token: "tok".into(),
            },
            client_name: "workstation".into(),
        };
        let req = config.connect_request();
        assert_eq!(req.server_id, "srv");
        assert_eq!(req.channel_id, "chan");
        assert_eq!(req.token, "tok");
        assert_eq!(req.client_name, "workstation");
        assert!(!req.version.is_empty());
    }
}
