/// Returns the cached value for a key, or computes, caches and returns it.
///
/// A failed cache read is logged and handled as a miss.
///
/// # Arguments
/// * `$cache`: a [`Cache`](crate::db::Cache) (anything with `get_from_cache` and
///   `set_in_background`).
/// * `$key`: the [`CacheKey`](crate::db::CacheKey) to read and write.
/// * `$ttl`: time-to-live of a freshly computed value, in seconds.
/// * `$block`: future computing the value on a miss; its error type must
///   accept `AppError` through `?`.
///
/// # Example
/// ```rust,ignore
/// let poster: Option<String> = cached!(self.cache, key, POSTER_CACHE_TTL, async move {
///     self.request_poster(title, year).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let cached = match $cache.get_from_cache(&$key).await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!(key = %$key, error = %e, "Cache read failed, treating as miss");
                None
            }
        };
        if let Some(cached) = cached {
            tracing::debug!(key = %$key, "Cache hit");
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&$key, &value, $ttl);
            Ok(value)
        }
    }};
}
