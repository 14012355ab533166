use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_FINNHUB_BASE_URL: &str = "https://finnhub.io/api/v1";
pub const DEFAULT_NEWS_BASE_URL: &str = "https://newsapi.org/v2";
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 465;
pub const DEFAULT_NEWS_ARTICLES: usize = 3;

/// Symbols tracked by the dashboard when no explicit list is given.
pub const DEFAULT_SYMBOLS: &[&str] = &["AAPL", "GOOGL", "TSLA", "MSFT", "NVDA", "AMZN", "META", "NFLX"];

/// Quote provider settings resolved from environment variables.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    pub use_mock_data: bool,
    pub mock_seed: Option<u64>,
}

/// SMTP delivery settings. Present only when sender, password and recipient are all set.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub address: String,
    pub password: String,
    pub recipient: String,
}

/// Headline lookup appended to alert emails.
#[derive(Debug, Clone)]
pub struct NewsConfig {
    pub api_key: String,
    pub base_url: String,
    pub articles: usize,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderConfig,
    pub email: Option<EmailConfig>,
    pub news: Option<NewsConfig>,
    pub alerts_file: PathBuf,
    pub portfolio_symbols: Vec<String>,
    pub alert_check_interval: Option<Duration>,
    pub server_host: String,
    pub server_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv::dotenv().ok();

        let api_key = Self::optional_var("FINNHUB_API_KEY");

        let base_url = env::var("FINNHUB_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_FINNHUB_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let use_mock_data = match env::var("USE_MOCK_DATA") {
            Ok(val) => Self::parse_flag(&val)?,
            Err(_) => false,
        };

        let timeout_secs: u64 = env::var("PROVIDER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()?;
        if timeout_secs == 0 {
            return Err("PROVIDER_TIMEOUT_SECS must be greater than zero".into());
        }

        let mock_seed = match env::var("MOCK_SEED") {
            Ok(val) => Some(val.parse()?),
            Err(_) => None,
        };

        let alerts_file = PathBuf::from(
            env::var("ALERTS_FILE").unwrap_or_else(|_| "alerts.json".to_string())
        );

        let portfolio_symbols = match env::var("PORTFOLIO_SYMBOLS") {
            Ok(val) => Self::parse_symbols(&val),
            Err(_) => Self::default_symbols(),
        };

        let interval_secs: u64 = env::var("ALERT_CHECK_INTERVAL_SECS")
            .unwrap_or_else(|_| "0".to_string())
            .parse()?;
        let alert_check_interval = (interval_secs > 0).then(|| Duration::from_secs(interval_secs));

        let mut email = EmailConfig::from_parts(
            Self::optional_var("EMAIL_ADDRESS"),
            Self::optional_var("EMAIL_PASSWORD"),
            Self::optional_var("RECIPIENT_EMAIL")
        )?;
        if let Some(email) = email.as_mut() {
            if let Some(host) = Self::optional_var("SMTP_HOST") {
                email.smtp_host = host;
            }
            if let Some(port) = Self::optional_var("SMTP_PORT") {
                email.smtp_port = port.parse()?;
            }
        }

        let news = match Self::optional_var("NEWS_API_KEY") {
            Some(api_key) => Some(NewsConfig {
                api_key,
                base_url: env::var("NEWS_API_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_NEWS_BASE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                articles: env::var("NEWS_ARTICLES")
                    .unwrap_or_else(|_| DEFAULT_NEWS_ARTICLES.to_string())
                    .parse()?,
                timeout: Duration::from_secs(timeout_secs),
            }),
            None => None,
        };

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()?;

        Ok(Config {
            provider: ProviderConfig {
                api_key,
                base_url,
                timeout: Duration::from_secs(timeout_secs),
                use_mock_data,
                mock_seed,
            },
            email,
            news,
            alerts_file,
            portfolio_symbols,
            alert_check_interval,
            server_host,
            server_port,
        })
    }

    /// Trimmed variable value, `None` when unset or blank.
    fn optional_var(name: &str) -> Option<String> {
        env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_flag(val: &str) -> Result<bool, Box<dyn std::error::Error>> {
        match val.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            other => Err(format!("USE_MOCK_DATA must be a boolean, got '{}'", other).into()),
        }
    }

    /// Split a comma-separated symbol list, upper-casing and dropping blanks.
    pub fn parse_symbols(val: &str) -> Vec<String> {
        val.split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn default_symbols() -> Vec<String> {
        DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect()
    }

    /// Whether quotes are synthesized instead of fetched.
    pub fn is_mock_mode(&self) -> bool {
        self.provider.use_mock_data
    }
}

impl EmailConfig {
    /// Build from the three credentials. Setting only some of them is an error.
    pub fn from_parts(
        address: Option<String>,
        password: Option<String>,
        recipient: Option<String>
    ) -> Result<Option<Self>, Box<dyn std::error::Error>> {
        match (address, password, recipient) {
            (Some(address), Some(password), Some(recipient)) =>
                Ok(
                    Some(Self {
                        smtp_host: DEFAULT_SMTP_HOST.to_string(),
                        smtp_port: DEFAULT_SMTP_PORT,
                        address,
                        password,
                        recipient,
                    })
                ),
            (None, None, None) => Ok(None),
            _ => Err("EMAIL_ADDRESS, EMAIL_PASSWORD and RECIPIENT_EMAIL must be set together".into()),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_FINNHUB_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            use_mock_data: false,
            mock_seed: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            email: None,
            news: None,
            alerts_file: PathBuf::from("alerts.json"),
            portfolio_symbols: Self::default_symbols(),
            alert_check_interval: None,
            server_host: "0.0.0.0".to_string(),
            server_port: 5000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbols() {
        assert_eq!(Config::parse_symbols(" aapl, msft ,,tsla"), vec!["AAPL", "MSFT", "TSLA"]);
        assert!(Config::parse_symbols("").is_empty());
    }

    #[test]
    fn test_parse_flag() {
        assert!(Config::parse_flag("TRUE").unwrap());
        assert!(Config::parse_flag("1").unwrap());
        assert!(!Config::parse_flag("off").unwrap());
        assert!(Config::parse_flag("maybe").is_err());
    }

    #[test]
    fn test_email_credentials_all_or_nothing() {
        assert!(EmailConfig::from_parts(None, None, None).unwrap().is_none());

        let email = EmailConfig::from_parts(
            Some("alerts@example.com".into()),
            Some("app-password".into()),
            Some("me@example.com".into())
        ).unwrap().unwrap();
        assert_eq!(email.smtp_host, "smtp.gmail.com");
        assert_eq!(email.smtp_port, 465);
        assert_eq!(email.recipient, "me@example.com");

        assert!(EmailConfig::from_parts(Some("alerts@example.com".into()), None, None).is_err());
    }

    #[test]
    fn test_default_universe() {
        let config = Config::default();
        assert_eq!(config.portfolio_symbols.len(), 8);
        assert!(!config.is_mock_mode());
        assert_eq!(config.server_port, 5000);
    }
}
