use reqwest::Client;

use crate::config::FetchConfig;
use crate::error::StartupError;

/// 构建抓取远程图片用的 HTTP Client（进程内复用连接池/Keep-Alive）。
///
/// 注意：`accept_invalid_certs` 默认开启，与旧服务的宽松信任策略一致。
pub fn build_fetch_client(cfg: &FetchConfig) -> Result<Client, StartupError> {
    if cfg.accept_invalid_certs {
        tracing::warn!("图片抓取已关闭 TLS 证书校验（fetch.accept_invalid_certs = true）");
    }
    Client::builder()
        .timeout(cfg.timeout_duration())
        .user_agent(cfg.user_agent.clone())
        .danger_accept_invalid_certs(cfg.accept_invalid_certs)
        .build()
        .map_err(|e| StartupError::HttpClient(e.to_string()))
}
