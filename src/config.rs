use std::env;
use std::net::SocketAddr;

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            bind_addr: load_or("GATEWAY_BIND_ADDR", "0.0.0.0:8080"),
            jwt_secret: env::var("GATEWAY_JWT_SECRET").unwrap_or_else(|_| {
                tracing::warn!("GATEWAY_JWT_SECRET not set, using development default");
                "dev-secret".to_string()
            }),
        }
    }
}

fn load_or<T: std::str::FromStr>(key: &str, default: &str) -> T
where
    T::Err: std::fmt::Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        tracing::info!("{} not set, using default: {}", key, default);
        default.to_string()
    });
    match raw.parse() {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("Invalid {} value {:?}: {}", key, raw, e);
            default.parse().unwrap_or_else(|_| panic!("bad default for {}", key))
        }
    }
}
