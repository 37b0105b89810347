/// Returns the cached value for a key, or computes, stores and returns it.
///
/// A cache hit short-circuits the block. On a miss the block's result is
/// queued for a background write with the given TTL and returned.
///
/// # Arguments
/// * `$cache`: a `Cache` (must offer `get_from_cache` and `set_in_background`).
/// * `$key`: the `CacheKey` to read and write.
/// * `$ttl`: time-to-live of the stored value, in seconds.
/// * `$block`: future producing an `AppResult` of the value on a miss.
///
/// # Example
/// ```rust,ignore
/// let movies: Vec<CatalogMovie> = cached!(cache, CacheKey::MovieSearch(q), 3600, async move {
///     fetch_from_tmdb(&q).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        if let Some(cached) = $cache.get_from_cache(&key).await? {
            tracing::debug!(key = %key, "Cache hit");
            Ok(cached)
        } else {
            tracing::debug!(key = %key, "Cache miss");
            let value = $block.await?;
            $cache.set_in_background(&key, &value, $ttl);
            Ok(value)
        }
    }};
}
