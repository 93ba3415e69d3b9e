//! 服务端配置
//!
//! 从 JSON 文件加载，所有字段都有默认值；命令行参数可以覆盖地址。

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use protocol::{NetworkConfig, HEARTBEAT_TIMEOUT_SECS, OUTBOUND_QUEUE_CAPACITY};

/// 配置来源
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    /// 未指定配置文件
    Defaults,
    /// 指定的文件不存在，使用默认值
    Missing(PathBuf),
    /// 从文件加载
    File(PathBuf),
}

/// 服务端配置
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub network: NetworkConfig,
    /// 发送过 ping 的连接超过该时间没有收到任何帧则视为断线（秒）
    pub heartbeat_timeout_secs: u64,
    /// 每个连接的发送队列容量
    pub outbound_queue_capacity: usize,
    /// 日志过滤指令，RUST_LOG 优先
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            heartbeat_timeout_secs: HEARTBEAT_TIMEOUT_SECS,
            outbound_queue_capacity: OUTBOUND_QUEUE_CAPACITY,
            log_filter: "caro_server=info".to_string(),
        }
    }
}

impl ServerConfig {
    /// 加载配置文件；未指定或文件不存在时使用默认值
    ///
    /// 在日志初始化之前调用，所以这里不打日志，由调用方根据 [`ConfigSource`] 报告。
    pub fn load(path: Option<&Path>) -> Result<(Self, ConfigSource)> {
        let Some(path) = path else {
            return Ok((Self::default(), ConfigSource::Defaults));
        };
        if !path.exists() {
            return Ok((Self::default(), ConfigSource::Missing(path.to_path_buf())));
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件 {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("配置文件格式错误 {}", path.display()))?;
        Ok((config, ConfigSource::File(path.to_path_buf())))
    }

    /// 应用命令行覆盖
    pub fn with_overrides(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.network.host = host;
        }
        if let Some(port) = port {
            self.network.port = port;
        }
        self
    }

    /// 心跳超时 Duration
    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_timeout_secs.max(1))
    }
}
