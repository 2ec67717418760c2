pub mod generate;
pub mod identity;
pub mod payments;
pub mod webhooks;
