use crate::store::{
    parse_counter,
    ResqueStore,
    StoreError,
    StoreFuture,
};
use redis::{
    aio::{
        ConnectionLike,
        MultiplexedConnection,
    },
    AsyncCommands,
    Client,
    ConnectionAddr,
    ConnectionInfo,
    RedisConnectionInfo,
};
use resque_plugin_config::Config;
use tracing::{
    debug,
    instrument,
};

/// `ResqueStore` backed by a single Redis connection, a multiplexed one unless built with
/// [`RedisStore::from_connection`].
pub struct RedisStore<C = MultiplexedConnection> {
    connection: C,
}

impl RedisStore {
    /// Open a connection to the configured server. Does not check reachability, see [`ResqueStore::ping`].
    #[instrument(level = "debug", skip_all, fields(address = %config.redacted_address()))]
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(config.host.clone(), config.port),
            redis: RedisConnectionInfo {
                db: config.db,
                password: config.password().map(str::to_string),
                ..Default::default()
            },
        };
        let client = Client::open(info).map_err(StoreError::Connection)?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(StoreError::Connection)?;
        debug!("Connected to redis");

        Ok(Self { connection })
    }
}

impl<C> RedisStore<C> {
    pub fn from_connection(connection: C) -> Self {
        Self { connection }
    }
}

impl<C: ConnectionLike + Send> ResqueStore for RedisStore<C> {
    fn ping(&mut self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let pong = redis::cmd("PING")
                .query_async::<_, String>(&mut self.connection)
                .await
                .map_err(StoreError::Connection)?;
            debug!(%pong, "Redis is reachable");
            Ok(())
        })
    }

    fn set_members<'a>(&'a mut self, key: &'a str) -> StoreFuture<'a, Vec<String>> {
        Box::pin(async move {
            // SMEMBERS answers an empty set for absent keys, TYPE tells them apart.
            let kind = redis::cmd("TYPE")
                .arg(key)
                .query_async::<_, String>(&mut self.connection)
                .await
                .map_err(|e| StoreError::command(key, e))?;
            match kind.as_str() {
                "set" => {}
                "none" => return Err(StoreError::MissingKey(key.to_string())),
                found => {
                    return Err(StoreError::WrongType {
                        key: key.to_string(),
                        found: found.to_string(),
                        expected: "set",
                    })
                }
            }

            self.connection
                .smembers::<_, Vec<String>>(key)
                .await
                .map_err(|e| StoreError::command(key, e))
        })
    }

    fn list_len<'a>(&'a mut self, key: &'a str) -> StoreFuture<'a, u64> {
        Box::pin(async move {
            self.connection
                .llen::<_, u64>(key)
                .await
                .map_err(|e| StoreError::command(key, e))
        })
    }

    fn set_card<'a>(&'a mut self, key: &'a str) -> StoreFuture<'a, u64> {
        Box::pin(async move {
            self.connection
                .scard::<_, u64>(key)
                .await
                .map_err(|e| StoreError::command(key, e))
        })
    }

    fn counter<'a>(&'a mut self, key: &'a str) -> StoreFuture<'a, f64> {
        Box::pin(async move {
            let value = self
                .connection
                .get::<_, Option<String>>(key)
                .await
                .map_err(|e| StoreError::command(key, e))?;
            parse_counter(key, value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use redis::Value;
    use redis_test::{
        MockCmd,
        MockRedisConnection,
    };

    fn store(commands: Vec<MockCmd>) -> RedisStore<MockRedisConnection> {
        RedisStore::from_connection(MockRedisConnection::new(commands))
    }

    fn status(reply: &str) -> Value {
        Value::Status(reply.to_string())
    }

    fn data(reply: &str) -> Value {
        Value::Data(reply.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn ping() {
        let mut store = store(vec![MockCmd::new(redis::cmd("PING"), Ok(status("PONG")))]);
        store.ping().await.unwrap();
    }

    #[tokio::test]
    async fn absent_set_is_missing() {
        let mut store = store(vec![MockCmd::new(redis::cmd("TYPE").arg("resque:queues"), Ok(status("none")))]);
        let err = store.set_members("resque:queues").await.unwrap_err();
        assert!(matches!(err, StoreError::MissingKey(key) if key == "resque:queues"));
    }

    #[tokio::test]
    async fn set_of_wrong_type() {
        let mut store = store(vec![MockCmd::new(redis::cmd("TYPE").arg("resque:queues"), Ok(status("list")))]);
        let err = store.set_members("resque:queues").await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::WrongType { key, found, expected: "set" } if key == "resque:queues" && found == "list"
        ));
    }

    #[tokio::test]
    async fn set_members() {
        let mut store = store(vec![
            MockCmd::new(redis::cmd("TYPE").arg("resque:queues"), Ok(status("set"))),
            MockCmd::new(redis::cmd("SMEMBERS").arg("resque:queues"), Ok(Value::Bulk(vec![data("default"), data("mailer")]))),
        ]);
        let mut members = store.set_members("resque:queues").await.unwrap();
        members.sort();
        assert_eq!(members, ["default", "mailer"]);
    }

    #[tokio::test]
    async fn lengths_and_cardinalities() {
        let mut store = store(vec![
            MockCmd::new(redis::cmd("LLEN").arg("resque:queue:default"), Ok(Value::Int(3))),
            MockCmd::new(redis::cmd("SCARD").arg("resque:workers"), Ok(Value::Int(4))),
        ]);
        assert_eq!(store.list_len("resque:queue:default").await.unwrap(), 3);
        assert_eq!(store.set_card("resque:workers").await.unwrap(), 4);
    }

    #[tokio::test]
    async fn counters() {
        let mut store = store(vec![
            MockCmd::new(redis::cmd("GET").arg("resque:stat:processed"), Ok(data("12"))),
            MockCmd::new(redis::cmd("GET").arg("resque:stat:failed"), Ok(Value::Nil)),
        ]);
        assert_eq!(store.counter("resque:stat:processed").await.unwrap(), 12.0);

        let err = store.counter("resque:stat:failed").await.unwrap_err();
        assert!(matches!(err, StoreError::MissingKey(key) if key == "resque:stat:failed"));
    }
}
