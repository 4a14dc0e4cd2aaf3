use tracing_subscriber::{fmt, EnvFilter};

/// 初始化控制台日志 (默认 info, 可通过 RUST_LOG 覆盖)
pub fn init(profile: bool) {
    let default_level = if profile { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 重复初始化时忽略 (测试中可能多次调用)
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
