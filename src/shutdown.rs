//! 优雅退出信号
//!
//! Linux/macOS 监听 SIGINT、SIGTERM，Windows 监听 Ctrl+C。

use tracing::{error, info};

/// 退出原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// 用户中断信号 (Ctrl+C)
    Interrupt,
    /// 终止信号 (SIGTERM)
    Terminate,
}

/// 等待退出信号，返回触发原因。供 `axum::serve(..).with_graceful_shutdown` 使用。
pub async fn wait_for_signal() -> ShutdownReason {
    let reason = platform_signal().await;
    info!("接收到退出信号: {:?}，开始优雅退出...", reason);
    reason
}

#[cfg(unix)]
async fn platform_signal() -> ShutdownReason {
    use tokio::signal::unix::{SignalKind, signal};

    let sigterm = signal(SignalKind::terminate());
    let mut sigterm = match sigterm {
        Ok(s) => s,
        Err(e) => {
            error!("SIGTERM 处理器注册失败: {}，仅监听 Ctrl+C", e);
            return ctrl_c().await;
        }
    };

    tokio::select! {
        reason = ctrl_c() => reason,
        _ = sigterm.recv() => ShutdownReason::Terminate,
    }
}

#[cfg(not(unix))]
async fn platform_signal() -> ShutdownReason {
    ctrl_c().await
}

async fn ctrl_c() -> ShutdownReason {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("监听Ctrl+C信号失败: {}", e);
        // 无法监听时永不触发，服务继续运行
        std::future::pending::<()>().await;
    }
    ShutdownReason::Interrupt
}
