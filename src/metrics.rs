use metrics::{counter, gauge};

/// Side-effect bookkeeping for routing outcomes. Counters and the
/// activated gauge are labeled by channel uuid; callers only record after
/// the matching send was confirmed.
pub trait MetricSink: Send + Sync {
    fn channel_created(&self, channel_uuid: &str);
    fn contact_message(&self, channel_uuid: &str);
    fn contact_activation(&self, channel_uuid: &str);
    fn inc_contact_activated(&self, channel_uuid: &str);
    fn dec_contact_activated(&self, channel_uuid: &str);
}

/// Production sink on the `metrics` facade; the prometheus exporter is
/// installed by the binary.
pub struct PrometheusSink;

impl MetricSink for PrometheusSink {
    fn channel_created(&self, channel_uuid: &str) {
        counter!("channel_creations_total", "channel" => channel_uuid.to_string()).increment(1);
    }

    fn contact_message(&self, channel_uuid: &str) {
        counter!("contact_messages_total", "channel" => channel_uuid.to_string()).increment(1);
    }

    fn contact_activation(&self, channel_uuid: &str) {
        counter!("contact_activations_total", "channel" => channel_uuid.to_string()).increment(1);
    }

    fn inc_contact_activated(&self, channel_uuid: &str) {
        gauge!("contacts_activated", "channel" => channel_uuid.to_string()).increment(1.0);
    }

    fn dec_contact_activated(&self, channel_uuid: &str) {
        gauge!("contacts_activated", "channel" => channel_uuid.to_string()).decrement(1.0);
    }
}
