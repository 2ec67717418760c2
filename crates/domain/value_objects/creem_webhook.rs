use serde::Deserialize;
use serde_json::Value;

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const CHECKOUT_FAILED: &str = "checkout.session.failed";
pub const SUBSCRIPTION_CANCELLED: &str = "subscription.cancelled";

/// Outer shape of every Creem webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct CreemWebhookEnvelope {
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CheckoutMetadata {
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub plan_name: Option<String>,
    #[serde(default)]
    pub interval: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CheckoutCompletedData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub metadata: Option<CheckoutMetadata>,
}

impl CheckoutCompletedData {
    pub fn plan_id(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.plan_id.as_deref())
            .filter(|value| !value.is_empty())
    }

    pub fn customer_email(&self) -> Option<&str> {
        self.customer_email
            .as_deref()
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SubscriptionCancelledData {
    #[serde(default)]
    pub payment_session_id: Option<String>,
}

impl SubscriptionCancelledData {
    pub fn payment_session_id(&self) -> Option<&str> {
        self.payment_session_id
            .as_deref()
            .filter(|value| !value.is_empty())
    }
}

/// Webhook events the reconciler understands, plus explicit fallbacks for
/// payloads it cannot act on.
#[derive(Debug, Clone, PartialEq)]
pub enum CreemEvent {
    CheckoutCompleted(CheckoutCompletedData),
    CheckoutFailed(Value),
    SubscriptionCancelled(SubscriptionCancelledData),
    /// A known event type whose `data` did not decode.
    Malformed { event_type: String, reason: String },
    Unknown { event_type: String },
}

impl From<CreemWebhookEnvelope> for CreemEvent {
    fn from(envelope: CreemWebhookEnvelope) -> Self {
        let CreemWebhookEnvelope { event_type, data } = envelope;

        let malformed = |err: serde_json::Error| CreemEvent::Malformed {
            event_type: event_type.clone(),
            reason: err.to_string(),
        };

        match event_type.as_str() {
            CHECKOUT_COMPLETED => serde_json::from_value(data)
                .map(CreemEvent::CheckoutCompleted)
                .unwrap_or_else(malformed),
            CHECKOUT_FAILED => CreemEvent::CheckoutFailed(data),
            SUBSCRIPTION_CANCELLED => serde_json::from_value(data)
                .map(CreemEvent::SubscriptionCancelled)
                .unwrap_or_else(malformed),
            _ => CreemEvent::Unknown {
                event_type: event_type.clone(),
            },
        }
    }
}

impl CreemEvent {
    pub fn event_type(&self) -> &str {
        match self {
            CreemEvent::CheckoutCompleted(_) => CHECKOUT_COMPLETED,
            CreemEvent::CheckoutFailed(_) => CHECKOUT_FAILED,
            CreemEvent::SubscriptionCancelled(_) => SUBSCRIPTION_CANCELLED,
            CreemEvent::Malformed { event_type, .. } | CreemEvent::Unknown { event_type } => {
                event_type
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(payload: Value) -> CreemEvent {
        let envelope: CreemWebhookEnvelope = serde_json::from_value(payload).unwrap();
        CreemEvent::from(envelope)
    }

    #[test]
    fn decodes_checkout_completed() {
        let event = event(json!({
            "event_type": "checkout.session.completed",
            "data": {
                "id": "ch_123",
                "customer_email": "buyer@example.com",
                "metadata": { "plan_id": "pro", "plan_name": "Pro", "interval": "month" }
            }
        }));

        let CreemEvent::CheckoutCompleted(data) = event else {
            panic!("expected checkout completed, got {event:?}");
        };
        assert_eq!(data.id.as_deref(), Some("ch_123"));
        assert_eq!(data.plan_id(), Some("pro"));
        assert_eq!(data.customer_email(), Some("buyer@example.com"));
    }

    #[test]
    fn empty_fields_read_as_missing() {
        let event = event(json!({
            "event_type": "checkout.session.completed",
            "data": { "customer_email": "", "metadata": { "plan_id": "" } }
        }));

        let CreemEvent::CheckoutCompleted(data) = event else {
            panic!("expected checkout completed");
        };
        assert_eq!(data.plan_id(), None);
        assert_eq!(data.customer_email(), None);
    }

    #[test]
    fn known_type_with_bad_data_is_malformed() {
        let event = event(json!({
            "event_type": "subscription.cancelled",
            "data": "not an object"
        }));

        assert!(matches!(event, CreemEvent::Malformed { .. }));
        assert_eq!(event.event_type(), "subscription.cancelled");
    }

    #[test]
    fn missing_data_on_completed_is_malformed() {
        let event = event(json!({ "event_type": "checkout.session.completed" }));

        assert!(matches!(event, CreemEvent::Malformed { .. }));
    }

    #[test]
    fn unrecognised_type_is_unknown() {
        let event = event(json!({ "event_type": "refund.created", "data": {} }));

        assert_eq!(
            event,
            CreemEvent::Unknown {
                event_type: "refund.created".to_string()
            }
        );
    }

    #[test]
    fn failed_checkout_keeps_raw_payload() {
        let event = event(json!({
            "event_type": "checkout.session.failed",
            "data": { "id": "ch_9", "reason": "card_declined" }
        }));

        assert_eq!(
            event,
            CreemEvent::CheckoutFailed(json!({ "id": "ch_9", "reason": "card_declined" }))
        );
    }
}
