use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use staybook_core::{BookingError, BookingResult, LockStore};

// GET-compare-write runs as one script so no other client can interleave.
const REPLACE_IF_EQUALS: &str = r"
if redis.call('GET', KEYS[1]) == ARGV[1] then
  redis.call('SET', KEYS[1], ARGV[2], 'EX', ARGV[3])
  return 1
end
return 0
";

const RELEASE_IF_EQUALS: &str = r"
if redis.call('GET', KEYS[1]) == ARGV[1] then
  return redis.call('DEL', KEYS[1])
end
return 0
";

/// Redis-backed [`LockStore`]. Acquire is a single `SET NX`; compare-and-set
/// writes run as Lua scripts, so atomicity comes from Redis itself.
#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

fn redis_err(err: redis::RedisError) -> BookingError {
    BookingError::upstream(format!("lock store: {}", err))
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    async fn conn(&self) -> BookingResult<redis::aio::MultiplexedConnection> {
        self.client.get_multiplexed_async_connection().await.map_err(redis_err)
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl_seconds: u64) -> BookingResult<bool> {
        let mut conn = self.conn().await?;

        // SET ... NX EX: replies OK when written, nil otherwise
        let result: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await
            .map_err(redis_err)?;

        debug!(key, written = result.is_some(), "set if absent");
        Ok(result.is_some())
    }

    pub async fn ping(&self) -> BookingResult<()> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await.map_err(redis_err)?;
        Ok(())
    }
}

#[async_trait]
impl LockStore for RedisClient {
    async fn acquire_if_absent(&self, key: &str, value: &str, ttl_seconds: u64) -> BookingResult<bool> {
        self.set_if_absent(key, value, ttl_seconds).await
    }

    async fn replace_if_equals(&self, key: &str, expected: &str, value: &str, ttl_seconds: u64) -> BookingResult<bool> {
        let mut conn = self.conn().await?;
        let written: i64 = redis::Script::new(REPLACE_IF_EQUALS)
            .key(key)
            .arg(expected)
            .arg(value)
            .arg(ttl_seconds)
            .invoke_async(&mut conn)
            .await
            .map_err(redis_err)?;
        debug!(key, written = written == 1, "replace if equals");
        Ok(written == 1)
    }

    async fn release(&self, key: &str) -> BookingResult<()> {
        let mut conn = self.conn().await?;
        conn.del::<_, ()>(key).await.map_err(redis_err)
    }

    async fn release_if_equals(&self, key: &str, expected: &str) -> BookingResult<bool> {
        let mut conn = self.conn().await?;
        let deleted: i64 = redis::Script::new(RELEASE_IF_EQUALS)
            .key(key)
            .arg(expected)
            .invoke_async(&mut conn)
            .await
            .map_err(redis_err)?;
        Ok(deleted == 1)
    }

    async fn get(&self, key: &str) -> BookingResult<Option<String>> {
        let mut conn = self.conn().await?;
        conn.get(key).await.map_err(redis_err)
    }

    async fn ttl(&self, key: &str) -> BookingResult<Option<u64>> {
        let mut conn = self.conn().await?;
        // -2 missing, -1 no expiry
        let secs: i64 = conn.ttl(key).await.map_err(redis_err)?;
        Ok(u64::try_from(secs).ok())
    }
}
