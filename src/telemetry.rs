use tracing_subscriber::EnvFilter;

/// 安装全局 tracing subscriber（输出到 stderr）
///
/// 未设置 `RUST_LOG` 时使用 `fallback_filter`。重复调用不会报错。
pub fn init_tracing(fallback_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
