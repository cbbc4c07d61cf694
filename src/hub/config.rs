//! Camera server configuration

/// Default port for the first auto-assigned stream server
pub const DEFAULT_BASE_PORT: u16 = 1181;

/// Default root path for published camera tables
pub const DEFAULT_PUBLISH_ROOT: &str = "/CameraPublisher";

/// Camera server configuration options
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// First port handed out by the stream-server port allocator
    pub base_port: u16,

    /// Root path of the telemetry tree camera tables are published under
    pub publish_root: String,

    /// Local addresses advertised in published stream URLs
    pub addresses: Vec<String>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            base_port: DEFAULT_BASE_PORT,
            publish_root: DEFAULT_PUBLISH_ROOT.to_string(),
            addresses: vec!["localhost".to_string()],
        }
    }
}

impl HubConfig {
    /// Create a config with a custom base port
    pub fn with_base_port(port: u16) -> Self {
        Self {
            base_port: port,
            ..Default::default()
        }
    }

    /// Set the base port for auto-assigned servers
    pub fn base_port(mut self, port: u16) -> Self {
        self.base_port = port;
        self
    }

    /// Set the publish root path
    pub fn publish_root(mut self, root: impl Into<String>) -> Self {
        self.publish_root = root.into();
        self
    }

    /// Replace the advertised address list
    pub fn addresses(mut self, addresses: Vec<String>) -> Self {
        self.addresses = addresses;
        self
    }

    /// Add one advertised address
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.addresses.push(address.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HubConfig::default();

        assert_eq!(config.base_port, 1181);
        assert_eq!(config.publish_root, "/CameraPublisher");
        assert_eq!(config.addresses, vec!["localhost".to_string()]);
    }

    #[test]
    fn test_with_base_port() {
        let config = HubConfig::with_base_port(1200);
        assert_eq!(config.base_port, 1200);
    }

    #[test]
    fn test_builder_chaining() {
        let config = HubConfig::default()
            .base_port(1190)
            .publish_root("/Cameras")
            .addresses(vec!["10.0.0.2".to_string()])
            .address("robot.local");

        assert_eq!(config.base_port, 1190);
        assert_eq!(config.publish_root, "/Cameras");
        assert_eq!(
            config.addresses,
            vec!["10.0.0.2".to_string(), "robot.local".to_string()]
        );
    }
}
