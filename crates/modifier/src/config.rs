/// 配置管理

use anyhow::Context;
use pve_client::ClientOptions;
use serde::Deserialize;
use std::time::Duration;

use crate::orchestrator::ModifyOptions;
use crate::poller::PollSettings;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub pve_endpoint: String,
    pub pve_api_token: Option<String>,
    pub pve_insecure: bool,
    /// 单次请求超时（秒）
    pub request_timeout: u64,
    /// 等待类操作的超时与间隔（秒）
    pub wait_timeout: u64,
    pub wait_interval: u64,
    /// 任务等待上限（秒），0 表示不设上限
    pub task_timeout: u64,
    pub log_level: String,
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let pve_endpoint = lookup("PVE_ENDPOINT").context("缺少环境变量 PVE_ENDPOINT")?;

        let pve_api_token = lookup("PVE_API_TOKEN").filter(|token| !token.is_empty());

        let pve_insecure = matches!(
            lookup("PVE_INSECURE").as_deref().map(str::to_lowercase).as_deref(),
            Some("1" | "true" | "yes")
        );

        let request_timeout = lookup("PVE_REQUEST_TIMEOUT")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .context("PVE_REQUEST_TIMEOUT 必须是整数秒")?;

        let wait_timeout = lookup("WAIT_TIMEOUT")
            .unwrap_or_else(|| "300".to_string())
            .parse()
            .context("WAIT_TIMEOUT 必须是整数秒")?;

        let wait_interval: u64 = lookup("WAIT_INTERVAL")
            .unwrap_or_else(|| "1".to_string())
            .parse()
            .context("WAIT_INTERVAL 必须是整数秒")?;
        anyhow::ensure!(wait_interval > 0, "WAIT_INTERVAL 必须大于 0");

        let task_timeout = lookup("TASK_TIMEOUT")
            .unwrap_or_else(|| "0".to_string())
            .parse()
            .context("TASK_TIMEOUT 必须是整数秒")?;

        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            pve_endpoint,
            pve_api_token,
            pve_insecure,
            request_timeout,
            wait_timeout,
            wait_interval,
            task_timeout,
            log_level,
        })
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            endpoint: self.pve_endpoint.clone(),
            api_token: self.pve_api_token.clone(),
            insecure: self.pve_insecure,
            timeout: Duration::from_secs(self.request_timeout),
        }
    }

    pub fn wait_settings(&self) -> PollSettings {
        PollSettings::new(
            Duration::from_secs(self.wait_timeout),
            Duration::from_secs(self.wait_interval),
        )
    }

    pub fn task_timeout(&self) -> Option<Duration> {
        (self.task_timeout > 0).then(|| Duration::from_secs(self.task_timeout))
    }

    /// 编排选项，等待开关由命令行决定
    pub fn modify_options(&self, wait_for_unlock: bool, wait_for_agent: bool) -> ModifyOptions {
        ModifyOptions {
            wait_for_unlock: wait_for_unlock.then(|| self.wait_settings()),
            agent_network: wait_for_agent.then(|| self.wait_settings()),
            task_timeout: self.task_timeout(),
        }
    }
}
