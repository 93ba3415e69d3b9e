use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use caro_server::{ConfigSource, Server, ServerConfig};

/// 五子棋对战服务端
#[derive(Parser, Debug)]
#[command(name = "caro-server", version, about)]
struct Args {
    /// 配置文件路径（JSON）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 监听主机，覆盖配置文件
    #[arg(long)]
    host: Option<String>,

    /// 监听端口，覆盖配置文件
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (config, source) = ServerConfig::load(args.config.as_deref())?;
    let config = config.with_overrides(args.host, args.port);

    // 初始化日志，RUST_LOG 优先
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_filter)?,
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    info!("五子棋服务端启动中...");
    match source {
        ConfigSource::Defaults => info!("未指定配置文件，使用默认配置"),
        ConfigSource::Missing(path) => info!("配置文件 {} 不存在，使用默认配置", path.display()),
        ConfigSource::File(path) => info!("已加载配置文件 {}", path.display()),
    }

    Server::bind(config).await?.run().await
}
