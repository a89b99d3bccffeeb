use std::env;

use thiserror::Error;
use url::Url;

pub const HUGGINGFACE_API_ROOT: &str = "https://api-inference.huggingface.co";
pub const IMAGE_MODEL: &str = "runwayml/stable-diffusion-v1-5";
pub const VIDEO_MODEL: &str = "stabilityai/stable-video-diffusion-img2vid-xt";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_HOST: &str = "0.0.0.0";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not a valid port: {value}")]
    InvalidPort { name: &'static str, value: String },

    #[error("{name} is not a valid http(s) url: {value}")]
    InvalidUrl { name: &'static str, value: String },
}

/// Runtime settings, read once at startup and shared read-only.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub public_base_url: String,
    pub image_endpoint: String,
    pub video_endpoint: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source. Blank values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match read("PORT") {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::InvalidPort {
                name: "PORT",
                value: value.clone(),
            })?,
            None => DEFAULT_PORT,
        };
        let host = read("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let public_base_url = match read("PUBLIC_BASE_URL") {
            Some(value) => validate_http_url("PUBLIC_BASE_URL", &value)?,
            None => format!("http://localhost:{port}"),
        };
        let image_endpoint = match read("HF_IMAGE_ENDPOINT") {
            Some(value) => validate_http_url("HF_IMAGE_ENDPOINT", &value)?,
            None => model_endpoint(IMAGE_MODEL),
        };
        let video_endpoint = match read("HF_VIDEO_ENDPOINT") {
            Some(value) => validate_http_url("HF_VIDEO_ENDPOINT", &value)?,
            None => model_endpoint(VIDEO_MODEL),
        };

        Ok(Self {
            host,
            port,
            public_base_url,
            image_endpoint,
            video_endpoint,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            public_base_url: format!("http://localhost:{DEFAULT_PORT}"),
            image_endpoint: model_endpoint(IMAGE_MODEL),
            video_endpoint: model_endpoint(VIDEO_MODEL),
        }
    }
}

fn model_endpoint(model: &str) -> String {
    format!("{HUGGINGFACE_API_ROOT}/models/{model}")
}

fn validate_http_url(name: &'static str, raw: &str) -> Result<String, ConfigError> {
    let invalid = || ConfigError::InvalidUrl {
        name,
        value: raw.to_string(),
    };
    let parsed = Url::parse(raw).map_err(|_| invalid())?;
    match parsed.scheme() {
        "http" | "https" => Ok(raw.trim_end_matches('/').to_string()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_point_at_huggingface() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.public_base_url, "http://localhost:3000");
        assert_eq!(
            config.image_endpoint,
            "https://api-inference.huggingface.co/models/runwayml/stable-diffusion-v1-5"
        );
        assert!(config.video_endpoint.ends_with("stable-video-diffusion-img2vid-xt"));
    }

    #[test]
    fn overrides_are_trimmed() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", " 8080 "),
            ("PUBLIC_BASE_URL", "https://demo.example.com/"),
            ("HF_IMAGE_ENDPOINT", "http://127.0.0.1:9000/image"),
            ("HF_VIDEO_ENDPOINT", "  "),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.public_base_url, "https://demo.example.com");
        assert_eq!(config.image_endpoint, "http://127.0.0.1:9000/image");
        assert_eq!(config.video_endpoint, model_endpoint(VIDEO_MODEL));
    }

    #[test]
    fn rejects_bad_port_and_scheme() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "abc")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { .. }));

        let err =
            AppConfig::from_lookup(lookup(&[("HF_IMAGE_ENDPOINT", "ftp://x/y")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { name: "HF_IMAGE_ENDPOINT", .. }));
    }
}
