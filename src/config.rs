use serde::Serialize;

const DEFAULT_BASE_URL: &str = "http://20.244.56.144/evaluation-service";

/// Service-identity fields sent to the upstream auth endpoint. Field names
/// must match the upstream wire format exactly.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub name: String,
    #[serde(rename = "rollNo")]
    pub roll_no: String,
    #[serde(rename = "accessCode")]
    pub access_code: String,
    #[serde(rename = "clientID")]
    pub client_id: String,
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub port: u16,
    pub credentials: Credentials,
}

impl Config {
    /// Read configuration from the environment once at startup.
    pub fn from_env() -> Self {
        let base_url = std::env::var("TEST_SERVER_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(3000);

        Self {
            base_url,
            port,
            credentials: Credentials {
                email: env_or_empty("EMAIL"),
                name: env_or_empty("NAME"),
                roll_no: env_or_empty("ROLL_NO"),
                access_code: env_or_empty("ACCESS_CODE"),
                client_id: env_or_empty("CLIENT_ID"),
                client_secret: env_or_empty("CLIENT_SECRET"),
            },
        }
    }
}

fn env_or_empty(key: &str) -> String {
    std::env::var(key).unwrap_or_default()
}
