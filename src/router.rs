use std::sync::Arc;

use tracing::{debug, error};

use crate::courier::CourierClient;
use crate::error::Result;
use crate::event::{self, EventPayload, InboundEvent};
use crate::menu;
use crate::metrics::MetricSink;
use crate::store::{ChannelStore, ContactStore, FlowStore};
use crate::types::{Channel, Contact};
use crate::whatsapp::WhatsappClient;

/// Terminal outcome of one webhook delivery. Every outcome ends in a 200
/// acknowledgment to the provider; only the side effects differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// House-keeping callback with no messages.
    Empty,
    /// New contact created and bound by a valid activation token.
    Activated,
    /// Known contact re-bound to a (possibly identical) channel.
    Rebound,
    /// Raw payload relayed to courier.
    Forwarded,
    /// Menu selection translated to its keyword before relaying.
    ForwardedTranslated,
    /// Unknown contact, unbound contact or unresolvable channel.
    DeadEnd,
}

/// The inbound routing core: normalizes one webhook body, resolves the
/// contact and channel, and picks among activation, rebinding, keyword
/// translation, plain forwarding or no-op.
pub struct InboundRouter {
    contacts: Arc<dyn ContactStore>,
    channels: Arc<dyn ChannelStore>,
    flows: Arc<dyn FlowStore>,
    whatsapp: Arc<dyn WhatsappClient>,
    courier: Arc<dyn CourierClient>,
    metrics: Arc<dyn MetricSink>,
    token_prefix: String,
}

impl InboundRouter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        contacts: Arc<dyn ContactStore>,
        channels: Arc<dyn ChannelStore>,
        flows: Arc<dyn FlowStore>,
        whatsapp: Arc<dyn WhatsappClient>,
        courier: Arc<dyn CourierClient>,
        metrics: Arc<dyn MetricSink>,
        token_prefix: String,
    ) -> Self {
        Self {
            contacts,
            channels,
            flows,
            whatsapp,
            courier,
            metrics,
            token_prefix,
        }
    }

    pub async fn route(&self, raw: &[u8]) -> Result<Outcome> {
        let payload = event::parse(raw)?;
        let Some(inbound) = event::normalize(&payload) else {
            return Ok(Outcome::Empty);
        };

        let contact = self.contacts.find_by_urn(&inbound.urn).await?;

        // The prefix check only avoids a token lookup on every message;
        // the lookup itself is the authoritative exact match.
        if !inbound.text.is_empty() && inbound.text.contains(&self.token_prefix) {
            if let Some(channel) = self.channels.find_by_token(&inbound.text).await? {
                return self.activate(&inbound, contact, channel).await;
            }
            debug!("token-looking message matched no channel, treating as ordinary traffic");
        }

        self.dispatch(&inbound, contact, &payload, raw).await
    }

    async fn activate(
        &self,
        inbound: &InboundEvent,
        contact: Option<Contact>,
        channel: Channel,
    ) -> Result<Outcome> {
        match contact {
            Some(contact) => {
                let previous = match contact.channel_id.as_deref() {
                    Some(id) => self.channels.find_by_id(id).await?,
                    None => None,
                };

                self.contacts
                    .update_channel(&contact.urn, &channel.id)
                    .await?;
                self.send_activation_reply(&contact.urn, &channel).await?;

                // Decrement before increment so a same-channel
                // re-activation nets to no gauge change.
                if let Some(previous) = previous {
                    self.metrics.dec_contact_activated(&previous.uuid);
                }
                self.metrics.inc_contact_activated(&channel.uuid);
                self.metrics.contact_activation(&channel.uuid);

                Ok(Outcome::Rebound)
            }
            None => {
                let created =
                    Contact::new(&inbound.urn, &inbound.sender_name, Some(channel.id.clone()));
                self.contacts.insert(&created).await?;
                self.send_activation_reply(&created.urn, &channel).await?;

                self.metrics.contact_activation(&channel.uuid);
                self.metrics.inc_contact_activated(&channel.uuid);

                Ok(Outcome::Activated)
            }
        }
    }

    /// Flow menu when the channel has configured flows, plain confirmation
    /// otherwise. Metrics stay untouched if the send fails.
    async fn send_activation_reply(&self, urn: &str, channel: &Channel) -> Result<()> {
        let flows = self.flows.find_by_channel(&channel.uuid).await?;
        let body = match flows {
            Some(ref flows) if !flows.flows.is_empty() => menu::flow_menu_payload(urn, flows),
            _ => menu::confirmation_payload(urn),
        };
        self.whatsapp.send_message(&body).await
    }

    async fn dispatch(
        &self,
        inbound: &InboundEvent,
        contact: Option<Contact>,
        payload: &EventPayload,
        raw: &[u8],
    ) -> Result<Outcome> {
        let Some(contact) = contact else {
            return Ok(Outcome::DeadEnd);
        };
        let Some(channel_id) = contact.channel_id.as_deref() else {
            debug!("contact {} has no bound channel", contact.urn);
            return Ok(Outcome::DeadEnd);
        };
        let channel = match self.channels.find_by_id(channel_id).await {
            Ok(Some(channel)) => channel,
            Ok(None) => return Ok(Outcome::DeadEnd),
            Err(err) => {
                debug!("channel lookup failed for {channel_id}: {err}");
                return Ok(Outcome::DeadEnd);
            }
        };

        let flows = match self.flows.find_by_channel(&channel.uuid).await {
            Ok(flows) => flows,
            Err(err) => {
                debug!("flow lookup failed for channel {}: {err}", channel.uuid);
                None
            }
        };

        let matched = flows
            .as_ref()
            .and_then(|f| menu::match_keyword(f, &inbound.text));
        let (body, translated) = match matched {
            Some(entry) => (menu::rewrite_with_keyword(payload, &entry.keyword)?, true),
            None => (raw.to_vec(), false),
        };

        match self.courier.forward(&channel.uuid, &body).await {
            Ok(status) if status < 400 => self.metrics.contact_message(&channel.uuid),
            Ok(status) => {
                error!("courier returned {status} for channel {}", channel.uuid);
            }
            Err(err) => error!("courier forward failed: {err}"),
        }

        Ok(if translated {
            Outcome::ForwardedTranslated
        } else {
            Outcome::Forwarded
        })
    }
}
