/// Returns a cached value, or computes, stores and returns it on a miss.
///
/// # Arguments
/// * `$cache`: a [`Cache`](crate::db::Cache), providing `get_from_cache` and
///   `set_in_background`.
/// * `$key`: the [`CacheKey`](crate::db::CacheKey) to look up.
/// * `$ttl`: time-to-live of a freshly computed value, in seconds.
/// * `$block`: future computing the value on a miss.
///
/// Expands to an `AppResult`, so it must be used inside a function returning one.
///
/// # Example
/// ```ignore
/// let recommendations: Recommendations = cached!(cache, key, 300, async {
///     compute_recommendations().await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        if let Some(cached) = $cache.get_from_cache(&$key).await? {
            tracing::debug!(key = %$key, "Cache hit");
            Ok(cached)
        } else {
            tracing::debug!(key = %$key, "Cache miss");
            let value = $block.await?;
            $cache.set_in_background(&$key, &value, $ttl);
            Ok(value)
        }
    }};
}
