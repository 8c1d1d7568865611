use serde::Serialize;
use tokio::sync::broadcast;

/// 读侧查询键; 写操作完成后按键通知订阅者重新拉取
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Invalidation {
    Orders,
    OrdersWithItems,
    Returns,
    Sellers,
    Categories,
    Settings,
    Dashboard,
}

pub const ORDER_MUTATION: &[Invalidation] = &[
    Invalidation::Orders,
    Invalidation::OrdersWithItems,
    Invalidation::Dashboard,
];
pub const RETURN_MUTATION: &[Invalidation] = &[Invalidation::Returns, Invalidation::Dashboard];
pub const SELLER_MUTATION: &[Invalidation] = &[Invalidation::Sellers];
pub const CATEGORY_MUTATION: &[Invalidation] = &[Invalidation::Categories];
pub const SETTINGS_MUTATION: &[Invalidation] = &[Invalidation::Settings];

/// 失效消息总线 (tokio broadcast)
#[derive(Debug, Clone)]
pub struct InvalidationBus {
    tx: broadcast::Sender<Invalidation>,
}

impl Default for InvalidationBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl InvalidationBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Invalidation> {
        self.tx.subscribe()
    }

    /// 发布一组失效键; 没有订阅者时直接丢弃
    pub fn publish(&self, keys: &[Invalidation]) {
        for key in keys {
            match self.tx.send(*key) {
                Ok(n) => tracing::debug!("Invalidated {:?} ({} subscribers)", key, n),
                Err(_) => tracing::debug!("Invalidated {:?} (no subscribers)", key),
            }
        }
    }
}
