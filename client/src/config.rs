use serde::Deserialize;

/// Client configuration, loaded from a TOML file. Every field has a
/// default, so the file is optional and CLI flags override it.
#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    /// IP address to bind the UDP socket on.
    #[serde(default = "default_host")]
    pub host: String,

    /// UDP port. 0 picks an ephemeral port, printed at startup.
    #[serde(default)]
    pub port: u16,

    /// Capture device name; host default when unset.
    #[serde(default)]
    pub input_device: Option<String>,

    /// Playback device name; host default when unset.
    #[serde(default)]
    pub output_device: Option<String>,

    /// Give up on an unanswered dial after this many seconds.
    /// Unset means wait until the user hangs up.
    #[serde(default)]
    pub dial_timeout_secs: Option<u64>,
}

fn default_host() -> String {
    "0.0.0.0".into()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: 0,
            input_device: None,
            output_device: None,
            dial_timeout_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 0);
        assert!(config.input_device.is_none());
        assert!(config.dial_timeout_secs.is_none());
    }

    #[test]
    fn config_toml_deserialization() {
        let toml = r#"
            host = "192.168.1.10"
            port = 5005
            input_device = "USB Microphone"
            dial_timeout_secs = 30
        "#;
        let config: ClientConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.host, "192.168.1.10");
        assert_eq!(config.port, 5005);
        assert_eq!(config.input_device.as_deref(), Some("USB Microphone"));
        assert_eq!(config.dial_timeout_secs, Some(30));
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 0);
    }
}
