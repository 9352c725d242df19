//! Client configuration.

use std::time::Duration;

use crate::{
    domain::{AttendeeId, ConnectionPolicy, ConnectionTarget},
    error::ClientError,
    usecase::ClientSettings,
};

/// Everything needed to join one meeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base WebSocket address, e.g. `ws://127.0.0.1:8080/ws`
    pub url: String,
    pub meeting: String,
    pub key: String,
    pub user_id: i64,
    pub admin: bool,
    pub reconnect_delay: Duration,
    pub fatal_close_floor: u16,
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), ClientError> {
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(ClientError::InvalidUrl(self.url.clone()));
        }
        if self.meeting.trim().is_empty() {
            return Err(ClientError::MissingSetting("meeting id"));
        }
        if self.key.trim().is_empty() {
            return Err(ClientError::MissingSetting("access key"));
        }
        path_segment("meeting id", &self.meeting)?;
        path_segment("access key", &self.key)?;
        Ok(())
    }

    pub fn target(&self) -> ConnectionTarget {
        ConnectionTarget::new(&self.url, self.meeting.trim(), self.key.trim())
    }

    pub fn policy(&self) -> ConnectionPolicy {
        ConnectionPolicy {
            reconnect_delay: self.reconnect_delay,
            fatal_close_floor: self.fatal_close_floor,
        }
    }

    pub fn settings(&self) -> ClientSettings {
        ClientSettings {
            is_admin: self.admin,
            self_id: AttendeeId::new(self.user_id),
        }
    }
}

/// Meeting id and key are joined into the connection path as they are.
fn path_segment(name: &'static str, value: &str) -> Result<(), ClientError> {
    let reserved = |c: char| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace();
    if value.trim().contains(reserved) {
        return Err(ClientError::InvalidPathSegment {
            name,
            value: value.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageId;

    fn config() -> ClientConfig {
        ClientConfig {
            url: "ws://127.0.0.1:8080/ws".to_string(),
            meeting: "7".to_string(),
            key: "abc".to_string(),
            user_id: 3,
            admin: true,
            reconnect_delay: Duration::from_millis(500),
            fatal_close_floor: 4000,
        }
    }

    #[test]
    fn test_valid_config_builds_target_and_policy() {
        // テスト項目: 有効な設定から接続先と再接続方針が作られる
        // given (前提条件):
        let config = config();

        // when (操作):
        let result = config.validate();

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(
            config.target().url(MessageId::new(0)),
            "ws://127.0.0.1:8080/ws/7/abc/0"
        );
        assert_eq!(config.policy().reconnect_delay, Duration::from_millis(500));
        assert!(config.settings().is_admin);
    }

    #[test]
    fn test_empty_key_is_rejected() {
        // テスト項目: アクセスキーが空の設定は拒否される
        // given (前提条件):
        let config = ClientConfig {
            key: "  ".to_string(),
            ..config()
        };

        // when (操作):
        let result = config.validate();

        // then (期待する結果):
        assert!(matches!(result, Err(ClientError::MissingSetting("access key"))));
    }

    #[test]
    fn test_http_url_is_rejected() {
        // テスト項目: WebSocket 以外の URL は拒否される
        // given (前提条件):
        let config = ClientConfig {
            url: "http://127.0.0.1:8080/ws".to_string(),
            ..config()
        };

        // when (操作):
        let result = config.validate();

        // then (期待する結果):
        assert!(matches!(result, Err(ClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_reserved_characters_in_path_settings_are_rejected() {
        // テスト項目: 接続パスを壊す文字を含む会議 ID やキーは拒否される
        // given (前提条件):
        let keys = ["a/b", "key?x=1", "k#1", "50%", "two words"];

        for key in keys {
            let config = ClientConfig {
                key: key.to_string(),
                ..config()
            };

            // when (操作):
            let result = config.validate();

            // then (期待する結果):
            assert!(
                matches!(
                    result,
                    Err(ClientError::InvalidPathSegment { name: "access key", .. })
                ),
                "{} should be rejected",
                key
            );
        }
        let config = ClientConfig {
            meeting: "1/2".to_string(),
            ..config()
        };
        assert!(matches!(
            config.validate(),
            Err(ClientError::InvalidPathSegment { name: "meeting id", .. })
        ));
    }
}
