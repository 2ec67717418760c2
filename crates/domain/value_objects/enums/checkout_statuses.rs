use std::fmt::Display;

/// Lifecycle status of a checkout session as reported by the payment provider.
/// Values this service does not know about are carried verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutStatus {
    Pending,
    Processing,
    Completed,
    Expired,
    Failed,
    Other(String),
}

impl Display for CheckoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            CheckoutStatus::Pending => "pending",
            CheckoutStatus::Processing => "processing",
            CheckoutStatus::Completed => "completed",
            CheckoutStatus::Expired => "expired",
            CheckoutStatus::Failed => "failed",
            CheckoutStatus::Other(value) => value.as_str(),
        };
        write!(f, "{}", status)
    }
}

impl CheckoutStatus {
    pub fn from_str(value: &str) -> Self {
        match value {
            "pending" => CheckoutStatus::Pending,
            "processing" => CheckoutStatus::Processing,
            "completed" => CheckoutStatus::Completed,
            "expired" => CheckoutStatus::Expired,
            "failed" => CheckoutStatus::Failed,
            other => CheckoutStatus::Other(other.to_string()),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, CheckoutStatus::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_is_kept_verbatim() {
        let status = CheckoutStatus::from_str("refunded");

        assert_eq!(status, CheckoutStatus::Other("refunded".to_string()));
        assert_eq!(status.to_string(), "refunded");
        assert!(!status.is_completed());
    }

    #[test]
    fn only_completed_counts_as_paid() {
        assert!(CheckoutStatus::from_str("completed").is_completed());
        assert!(!CheckoutStatus::from_str("pending").is_completed());
        assert!(!CheckoutStatus::from_str("").is_completed());
    }
}
