//! Live checks of the Redis cache backend.
//!
//! - Marked `#[ignore]`; needs a reachable Redis at `CARTE_REDIS_URL`
//!   (defaults to `redis://127.0.0.1:6379/15`).
//! - Uses menu ids far above anything seeded so a shared instance is safe.

use carte::cache::{Cache, CacheKey, KeyPrefix, RedisCache};

type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

const MENU: i64 = 990_001;
const NEIGHBOUR: i64 = 990_002;

fn redis_url() -> String {
    std::env::var("CARTE_REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/15".to_string())
}

fn keys_under(menu_id: i64) -> Vec<CacheKey> {
    vec![
        CacheKey::Menu { menu_id },
        CacheKey::SubmenuList { menu_id },
        CacheKey::Submenu {
            menu_id,
            submenu_id: 1,
        },
        CacheKey::DishList {
            menu_id,
            submenu_id: 1,
        },
        CacheKey::Dish {
            menu_id,
            submenu_id: 1,
            dish_id: 7,
        },
    ]
}

async fn seed(cache: &RedisCache, keys: &[CacheKey]) -> TestResult<()> {
    for key in keys {
        cache.set(&key.to_string(), "{}".to_string()).await?;
    }
    Ok(())
}

async fn present(cache: &RedisCache, key: &CacheKey) -> TestResult<bool> {
    Ok(cache.get(&key.to_string()).await?.is_some())
}

#[tokio::test]
#[ignore]
async fn live_redis_prefix_purge_removes_only_descendants() -> TestResult<()> {
    let cache = RedisCache::connect(&redis_url()).await?;
    let ours = keys_under(MENU);
    let theirs = keys_under(NEIGHBOUR);
    seed(&cache, &ours).await?;
    seed(&cache, &theirs).await?;

    cache
        .delete_prefix(&KeyPrefix::SubmenusOf { menu_id: MENU })
        .await?;
    cache
        .delete_prefix(&KeyPrefix::DishesOfMenu { menu_id: MENU })
        .await?;

    assert!(present(&cache, &CacheKey::Menu { menu_id: MENU }).await?);
    for key in &ours[1..] {
        assert!(!present(&cache, key).await?, "{key} should be purged");
    }
    for key in &theirs {
        assert!(present(&cache, key).await?, "{key} should survive");
    }

    cache.delete_exact(&ours).await?;
    cache.delete_exact(&theirs).await?;
    assert!(!present(&cache, &CacheKey::Menu { menu_id: NEIGHBOUR }).await?);
    Ok(())
}

#[tokio::test]
#[ignore]
async fn live_redis_submenu_prefix_spares_sibling_dishes() -> TestResult<()> {
    let cache = RedisCache::connect(&redis_url()).await?;
    let doomed = CacheKey::Dish {
        menu_id: MENU,
        submenu_id: 3,
        dish_id: 1,
    };
    let sibling = CacheKey::DishList {
        menu_id: MENU,
        submenu_id: 4,
    };
    seed(&cache, &[doomed, sibling]).await?;

    cache
        .delete_prefix(&KeyPrefix::DishesOfSubmenu {
            menu_id: MENU,
            submenu_id: 3,
        })
        .await?;

    assert!(!present(&cache, &doomed).await?);
    assert!(present(&cache, &sibling).await?);
    cache.delete_exact(&[sibling]).await?;
    Ok(())
}
