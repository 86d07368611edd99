use serde::Deserialize;
use std::net::IpAddr;

/// Process configuration, read from the environment (and an optional `.env` file).
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct Env {
    pub server_address: IpAddr,
    pub server_port: u16,
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,
    /// Serve from a process-local store instead of PostgreSQL.
    #[serde(default)]
    pub in_memory: bool,
}

fn default_max_connections() -> u32 {
    5
}

#[cfg(test)]
mod tests {
    use crate::config::Env;
    use std::net::{IpAddr, Ipv4Addr};

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test]
    fn defaults() {
        let env: Env = envy::from_iter(vars(&[
            ("SERVER_ADDRESS", "127.0.0.1"),
            ("SERVER_PORT", "8000"),
        ]))
        .unwrap();

        assert_eq!(env.server_address, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(env.server_port, 8000);
        assert_eq!(env.database_url, None);
        assert_eq!(env.database_max_connections, 5);
        assert!(!env.in_memory);
    }

    #[test]
    fn database_settings() {
        let env: Env = envy::from_iter(vars(&[
            ("SERVER_ADDRESS", "0.0.0.0"),
            ("SERVER_PORT", "80"),
            ("DATABASE_URL", "postgres://yatube@localhost/yatube"),
            ("DATABASE_MAX_CONNECTIONS", "20"),
            ("IN_MEMORY", "true"),
        ]))
        .unwrap();

        assert_eq!(
            env.database_url.as_deref(),
            Some("postgres://yatube@localhost/yatube")
        );
        assert_eq!(env.database_max_connections, 20);
        assert!(env.in_memory);
    }

    #[test]
    fn missing_port() {
        let result = envy::from_iter::<_, Env>(vars(&[("SERVER_ADDRESS", "127.0.0.1")]));
        assert!(result.is_err());
    }
}
