use crate::utils::error::{MonitorError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_url, Validate,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "slotwatch")]
#[command(about = "Watches a grocery API for delivery slots and emails when availability changes")]
pub struct CliArgs {
    #[arg(long, default_value = "slotwatch.toml")]
    pub config: String,

    #[arg(long, help = "Run a single monitoring cycle and exit")]
    pub once: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit JSON logs (service mode)")]
    pub json_logs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub monitor: MonitorSection,
    pub templates: TemplateSection,
    pub state: StateSection,
    pub mail: MailSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSection {
    pub base_url: String,
    /// 字串旗標，沿用上游設定慣例："false"（不分大小寫）才會關閉全滿通知
    pub notify_unavailability: Option<String>,
    pub poll_interval_minutes: Option<u64>,
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSection {
    pub dir: String,
    pub header_file: Option<String>,
    pub body_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSection {
    pub dir: String,
    pub horizon_file: Option<String>,
    pub history_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailSection {
    pub smtp_host: String,
    pub smtp_port: Option<u16>,
    pub username: String,
    pub password: String,
    pub from: String,
    pub recipients: Vec<String>,
}

impl MonitorConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MonitorError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| MonitorError::ConfigError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MAIL_PASSWORD})
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    pub fn base_url(&self) -> &str {
        &self.monitor.base_url
    }

    /// 只有明確設成 "false"（不分大小寫）才停用全滿通知
    pub fn notify_unavailability(&self) -> bool {
        !self
            .monitor
            .notify_unavailability
            .as_deref()
            .unwrap_or("true")
            .eq_ignore_ascii_case("false")
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.monitor.poll_interval_minutes.unwrap_or(30) * 60)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.monitor.request_timeout_seconds.unwrap_or(30))
    }

    pub fn header_file(&self) -> &str {
        self.templates
            .header_file
            .as_deref()
            .unwrap_or("request-headers.txt")
    }

    pub fn body_file(&self) -> &str {
        self.templates
            .body_file
            .as_deref()
            .unwrap_or("request-body.json")
    }

    pub fn horizon_file(&self) -> &str {
        self.state
            .horizon_file
            .as_deref()
            .unwrap_or("last-horizon.txt")
    }

    pub fn history_file(&self) -> &str {
        self.state
            .history_file
            .as_deref()
            .unwrap_or("slot-history.txt")
    }

    pub fn smtp_port(&self) -> u16 {
        self.mail.smtp_port.unwrap_or(587)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_url("monitor.base_url", &self.monitor.base_url)?;
        validate_non_empty_string("templates.dir", &self.templates.dir)?;
        validate_non_empty_string("state.dir", &self.state.dir)?;
        validate_non_empty_string("mail.smtp_host", &self.mail.smtp_host)?;
        validate_non_empty_string("mail.from", &self.mail.from)?;

        if let Some(interval) = self.monitor.poll_interval_minutes {
            validate_positive_number("monitor.poll_interval_minutes", interval, 1)?;
        }
        if let Some(timeout) = self.monitor.request_timeout_seconds {
            validate_positive_number("monitor.request_timeout_seconds", timeout, 1)?;
        }

        if let Some(flag) = &self.monitor.notify_unavailability {
            if !flag.eq_ignore_ascii_case("true") && !flag.eq_ignore_ascii_case("false") {
                return Err(MonitorError::ConfigError {
                    field: "monitor.notify_unavailability".to_string(),
                    message: format!("Expected \"true\" or \"false\", got \"{}\"", flag),
                });
            }
        }

        if self.mail.recipients.is_empty() {
            return Err(MonitorError::ConfigError {
                field: "mail.recipients".to_string(),
                message: "At least one recipient is required".to_string(),
            });
        }
        for recipient in &self.mail.recipients {
            validate_non_empty_string("mail.recipients", recipient)?;
        }

        Ok(())
    }
}

impl Validate for MonitorConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
