//! Payment provider (Stripe compatible) checkout callbacks.

use serde::Deserialize;

use crate::services::{ServiceError, ServiceResult};

pub static CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub static SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Deserialize)]
pub struct PaymentEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: PaymentEventData,
}

#[derive(Debug, Deserialize)]
pub struct PaymentEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct CheckoutSession {
    #[serde(default)]
    customer_details: Option<CustomerDetails>,
    #[serde(default)]
    customer_email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CustomerDetails {
    #[serde(default)]
    email: Option<String>,
}

impl PaymentEvent {
    pub fn parse(payload: &[u8]) -> ServiceResult<Self> {
        Ok(serde_json::from_slice(payload)?)
    }

    pub fn is_checkout_completed(&self) -> bool {
        self.event_type == CHECKOUT_COMPLETED
    }

    /// Buyer email of a completed checkout session.
    pub fn customer_email(&self) -> ServiceResult<String> {
        let session: CheckoutSession = serde_json::from_value(self.data.object.clone())?;
        session
            .customer_details
            .and_then(|d| d.email)
            .or(session.customer_email)
            .map(|e| e.trim().to_lowercase())
            .filter(|e| e.parse::<lettre::Address>().is_ok())
            .ok_or_else(|| {
                ServiceError::MalformedPayload(String::from(
                    "no valid customer email found in session",
                ))
            })
    }
}
