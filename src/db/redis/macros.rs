/// Returns the cached value for `$key`, or computes it with `$block`,
/// queues it for caching with `$ttl` seconds and returns it.
///
/// `$cache` must provide `get_from_cache` and `set_in_background`; errors from
/// either the lookup or the block are propagated with `?`. Use it as the tail
/// expression of a function returning `AppResult` so the error type is known.
///
/// ```rust,ignore
/// async fn categories(&self, cache: &Cache) -> AppResult<Vec<CategoryDetails>> {
///     cached!(cache, CacheKey::Categories, 3600, self.load_categories())
/// }
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        if let Some(cached) = $cache.get_from_cache(&$key).await? {
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&$key, &value, $ttl);
            Ok(value)
        }
    }};
}
