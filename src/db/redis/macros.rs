/// Read-through caching around an async computation.
///
/// Returns the cached value for `$key` when present. Otherwise awaits `$block`,
/// queues the result for a background write with `$ttl` seconds, and returns it.
/// A failed cache read is logged and treated as a miss, so an unreachable Redis
/// only costs the upstream call. Errors from the block propagate with `?`.
///
/// ```rust,ignore
/// let catalog: Vec<CatalogEntry> = cached!(
///     self.cache,
///     CacheKey::Catalog(username.to_string()),
///     CATALOG_CACHE_TTL,
///     async move { self.fetch_all_pages(username).await }
/// )?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        let hit = match $cache.get_from_cache(&key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, fetching upstream");
                None
            }
        };
        if let Some(hit) = hit {
            Ok(hit)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&key, &value, $ttl);
            Ok(value)
        }
    }};
}
