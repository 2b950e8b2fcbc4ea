use super::retry::{Backoff, with_retry};
use crate::core::config::CacheConfig;
use crate::core::store::{KeyValueStore, WriteBatch, WriteOp};
use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{
    AsyncCommands, ConnectionAddr, ConnectionInfo, RedisConnectionInfo, RedisError, RedisResult,
};
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

fn is_transient(err: &RedisError) -> bool {
    err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() || err.is_timeout()
}

fn connection_info(config: &CacheConfig) -> ConnectionInfo {
    ConnectionInfo {
        addr: ConnectionAddr::Tcp(config.host.clone(), config.port),
        redis: RedisConnectionInfo {
            password: config.password.clone(),
            ..Default::default()
        },
    }
}

fn pipeline(batch: &WriteBatch) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic();
    for op in batch.ops() {
        match op {
            WriteOp::Delete(keys) => {
                pipe.del(keys).ignore();
            }
            WriteOp::Set { key, value } => {
                pipe.set(key, value).ignore();
            }
            WriteOp::HashSet { key, fields } => {
                pipe.hset_multiple(key, fields.as_slice()).ignore();
            }
        }
    }
    pipe
}

/// Redis/Dragonfly backed store.
///
/// The connection is opened on first use and shared by every request;
/// it is dropped after a transport error and reopened by the next attempt.
pub struct RedisStore {
    client: redis::Client,
    addr: String,
    connection: Mutex<Option<MultiplexedConnection>>,
    backoff: Backoff,
}

impl RedisStore {
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let client = redis::Client::open(connection_info(config))
            .context("Invalid cache connection settings")?;
        Ok(Self {
            client,
            addr: format!("{}:{}", config.host, config.port),
            connection: Mutex::new(None),
            backoff: Backoff::default(),
        })
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    async fn connection(&self) -> RedisResult<MultiplexedConnection> {
        let mut guard = self.connection.lock().await;
        if let Some(con) = guard.as_ref() {
            return Ok(con.clone());
        }
        let con = self.client.get_multiplexed_async_connection().await?;
        info!("Connected to cache at {}", self.addr);
        *guard = Some(con.clone());
        Ok(con)
    }

    async fn run<F, Fut, T>(&self, op_name: &str, op: F) -> Result<T>
    where
        F: Fn(MultiplexedConnection) -> Fut + Send + Sync,
        Fut: Future<Output = RedisResult<T>> + Send,
        T: Send,
    {
        let this = self;
        let op = &op;
        with_retry(
            move || async move {
                let con = this.connection().await?;
                let result = op(con).await;
                if let Err(err) = &result {
                    if is_transient(err) {
                        *this.connection.lock().await = None;
                    }
                }
                result
            },
            self.backoff,
            is_transient,
        )
        .await
        .with_context(|| format!("Cache {} failed on {}", op_name, self.addr))
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    #[instrument(name = "CacheGet", skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.run("GET", |mut con| async move {
            let value: RedisResult<Option<String>> = con.get(key).await;
            value
        })
        .await
    }

    #[instrument(name = "CacheHashGetAll", skip(self))]
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        self.run("HGETALL", |mut con| async move {
            let value: RedisResult<HashMap<String, String>> = con.hgetall(key).await;
            value
        })
        .await
    }

    #[instrument(name = "CacheCommit", skip_all, fields(ops = batch.ops().len()))]
    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let pipe = pipeline(&batch);
        let pipe = &pipe;
        self.run("MULTI/EXEC", |mut con| async move {
            let reply: RedisResult<()> = pipe.query_async(&mut con).await;
            reply
        })
        .await?;
        debug!("Committed batch to cache");
        Ok(())
    }
}
