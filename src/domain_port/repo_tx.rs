use std::any::Any;

#[async_trait::async_trait]
pub trait TxManager: Send + Sync {
    async fn begin(&self) -> anyhow::Result<Box<dyn StorageTx>>;
}

/// A unit of work. Writes made through `*_in_tx` store methods become
/// visible together on `commit`; `rollback` or drop discards them.
#[async_trait::async_trait]
pub trait StorageTx: Send {
    async fn commit(self: Box<Self>) -> anyhow::Result<()>;
    async fn rollback(self: Box<Self>) -> anyhow::Result<()>;
    /// Lets a store adapter recover its own concrete transaction type.
    fn as_any_mut(&mut self) -> &mut (dyn Any + Send);
}
