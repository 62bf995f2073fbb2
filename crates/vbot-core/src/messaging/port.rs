use async_trait::async_trait;

use crate::{messaging::types::Reply, Result};

/// Response channel of a single interaction.
///
/// An interaction gets exactly one initial response (`defer` or `respond`);
/// after that only `edit_original` and `followup` are valid. Implementations
/// track which phase they are in.
#[async_trait]
pub trait InteractionPort: Send + Sync {
    /// Whether an initial response (deferral included) has been delivered.
    fn is_acknowledged(&self) -> bool;

    async fn defer(&self, ephemeral: bool) -> Result<()>;
    async fn respond(&self, reply: &Reply, ephemeral: bool) -> Result<()>;
    async fn edit_original(&self, reply: &Reply) -> Result<()>;
    async fn followup(&self, reply: &Reply, ephemeral: bool) -> Result<()>;
}
