use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Channel, Contact, Flows};

/// Contact records keyed by sender URN. Absence is a valid state, not an
/// error; callers branch on it.
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn find_by_urn(&self, urn: &str) -> Result<Option<Contact>>;
    async fn insert(&self, contact: &Contact) -> Result<()>;
    async fn update_channel(&self, urn: &str, channel_id: &str) -> Result<()>;
}

#[async_trait]
pub trait ChannelStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Channel>>;
    /// Exact full-string match against the stored activation token.
    async fn find_by_token(&self, token: &str) -> Result<Option<Channel>>;
    async fn insert(&self, channel: &Channel) -> Result<()>;
}

#[async_trait]
pub trait FlowStore: Send + Sync {
    async fn find_by_channel(&self, channel_uuid: &str) -> Result<Option<Flows>>;
    /// Create-or-replace the single flows document for a channel.
    async fn upsert(&self, flows: &Flows) -> Result<()>;
}
