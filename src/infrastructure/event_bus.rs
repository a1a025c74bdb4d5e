// Event Bus 框架
// 钱包领域事件的发布/订阅，支持事件持久化
//
// publish 由调用方 await：持久化或入队失败会直接返回给调用方，
// 此时存储侧的修改已经生效，不做补偿。

use std::{collections::VecDeque, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::infrastructure::db::PgPool;

/// 内存中保留的事件历史条数
const HISTORY_CAPACITY: usize = 1000;

// ============ 事件类型定义 ============

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum DomainEvent {
    WalletCreated {
        address: String,
        asset_id: String,
        blockchain_type: String,
    },
    WalletDeleted {
        address: String,
        asset_id: String,
        blockchain_type: String,
    },
}

impl DomainEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::WalletCreated { .. } => "WalletCreated",
            DomainEvent::WalletDeleted { .. } => "WalletDeleted",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: Uuid,
    pub event: DomainEvent,
    pub published_at: chrono::DateTime<chrono::Utc>,
    pub retry_count: u32,
}

// ============ Event Handler Trait ============

#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent) -> Result<()>;
    fn event_types(&self) -> Vec<&'static str>;
}

// ============ Event Bus 接口 ============

#[async_trait]
pub trait EventBus: Send + Sync {
    /// 发布事件
    async fn publish(&self, event: DomainEvent) -> Result<()>;

    /// 订阅事件
    async fn subscribe(&self, handler: Arc<dyn EventHandler>);

    /// 获取事件历史（最新的在前）
    async fn get_event_history(&self, limit: i64, offset: i64) -> Result<Vec<EventEnvelope>>;
}

// ============ 内存 Event Bus 实现（支持持久化） ============

pub struct InMemoryEventBus {
    handlers: Arc<RwLock<Vec<Arc<dyn EventHandler>>>>,
    pool: Option<PgPool>,
    sender: mpsc::UnboundedSender<EventEnvelope>,
    history: RwLock<VecDeque<EventEnvelope>>,
}

impl InMemoryEventBus {
    /// 需要在 tokio 运行时内调用
    pub fn new(pool: Option<PgPool>) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<EventEnvelope>();
        let handlers: Arc<RwLock<Vec<Arc<dyn EventHandler>>>> = Arc::new(RwLock::new(Vec::new()));

        let handlers_clone = handlers.clone();

        // 后台任务：处理事件分发
        tokio::spawn(async move {
            while let Some(envelope) = receiver.recv().await {
                let handlers_read = handlers_clone.read().await;
                let event_type = envelope.event.event_type();

                for handler in handlers_read.iter() {
                    if handler.event_types().contains(&event_type) {
                        if let Err(e) = handler.handle(&envelope.event).await {
                            tracing::error!(
                                event_id = %envelope.event_id,
                                event_type,
                                error = ?e,
                                "Event handler error"
                            );
                        }
                    }
                }
            }
        });

        Self {
            handlers,
            pool,
            sender,
            history: RwLock::new(VecDeque::with_capacity(HISTORY_CAPACITY)),
        }
    }

    /// 持久化事件到数据库
    async fn persist_event(&self, envelope: &EventEnvelope) -> Result<()> {
        if let Some(pool) = &self.pool {
            let event_json = serde_json::to_value(&envelope.event)?;

            sqlx::query(
                "INSERT INTO wallet_events (id, event_type, event_data, published_at, retry_count)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(envelope.event_id)
            .bind(envelope.event.event_type())
            .bind(event_json)
            .bind(envelope.published_at)
            .bind(envelope.retry_count as i32)
            .execute(pool)
            .await?;
        }
        Ok(())
    }

    async fn remember(&self, envelope: EventEnvelope) {
        let mut history = self.history.write().await;
        if history.len() == HISTORY_CAPACITY {
            history.pop_back();
        }
        history.push_front(envelope);
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, event: DomainEvent) -> Result<()> {
        let envelope = EventEnvelope {
            event_id: Uuid::new_v4(),
            event,
            published_at: chrono::Utc::now(),
            retry_count: 0,
        };

        // 持久化事件
        self.persist_event(&envelope).await?;
        self.remember(envelope.clone()).await;

        tracing::debug!(
            event_id = %envelope.event_id,
            event_type = envelope.event.event_type(),
            "Domain event published"
        );

        // 发送到处理队列
        self.sender
            .send(envelope)
            .map_err(|e| anyhow::anyhow!("Failed to send event: {}", e))?;

        Ok(())
    }

    async fn subscribe(&self, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write().await;
        handlers.push(handler);
    }

    async fn get_event_history(&self, limit: i64, offset: i64) -> Result<Vec<EventEnvelope>> {
        if let Some(pool) = &self.pool {
            let rows = sqlx::query_as::<
                _,
                (
                    Uuid,
                    sqlx::types::JsonValue,
                    chrono::DateTime<chrono::Utc>,
                    i32,
                ),
            >(
                "SELECT id, event_data, published_at, retry_count
                 FROM wallet_events
                 ORDER BY published_at DESC
                 LIMIT $1 OFFSET $2",
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

            let mut envelopes = Vec::with_capacity(rows.len());
            for (id, event_data, published_at, retry_count) in rows {
                let event: DomainEvent = serde_json::from_value(event_data)?;
                envelopes.push(EventEnvelope {
                    event_id: id,
                    event,
                    published_at,
                    retry_count: retry_count as u32,
                });
            }

            Ok(envelopes)
        } else {
            let history = self.history.read().await;
            Ok(history
                .iter()
                .skip(offset.max(0) as usize)
                .take(limit.max(0) as usize)
                .cloned()
                .collect())
        }
    }
}
