pub mod cmd;
pub mod error;

/// 记录错误链, 出错时返回`None`
pub fn log_error<T>(x: Result<T, anyhow::Error>) -> Option<T> {
    x.map_err(|e| {
        log::error!("{e:#}");
    })
    .ok()
}
