//! Inbound client events.
//!
//! Required fields are enforced by serde; an envelope that fails to decode
//! into a variant here is dropped by the relay with a logged warning, never
//! propagated; the protocol is fire-and-forget, so there is no caller to
//! receive an error.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::Value;

use crate::error::{RelayError, Result};
use crate::protocol::envelope::Envelope;

/// `authenticate` payload. `role` stays a string at this layer: an unknown
/// role is not a decode failure, it is "registered nowhere" (the relay logs
/// and skips it).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authenticate {
    pub user_id: String,
    pub role: String,
}

/// `driver:location` payload. `location` is carried opaquely; the relay
/// never inspects coordinates.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverLocation {
    pub driver_id: String,
    pub location: Value,
    #[serde(default)]
    pub booking_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingStatus {
    pub booking_id: String,
    pub booking_number: String,
    pub status: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub driver_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingNew {
    pub booking_number: String,
    pub customer_name: String,
    pub pickup_location: String,
    pub booking_type: String,
    pub total_price: f64,
    #[serde(default)]
    pub customer_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverAssigned {
    pub booking_id: String,
    pub booking_number: String,
    pub driver_id: String,
    pub customer_id: String,
    pub driver_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceived {
    pub booking_number: String,
    pub amount: f64,
    #[serde(default)]
    pub customer_id: Option<String>,
}

/// Closed set of client-originated events.
#[derive(Debug, Clone)]
pub enum Inbound {
    Authenticate(Authenticate),
    DriverLocation(DriverLocation),
    BookingStatus(BookingStatus),
    BookingNew(BookingNew),
    DriverAssigned(DriverAssigned),
    PaymentReceived(PaymentReceived),
}

impl Inbound {
    /// Decode a typed event out of an envelope. Unknown event names and
    /// missing required fields are `BadEvent`.
    pub fn from_envelope(env: &Envelope) -> Result<Inbound> {
        let data = env.data.as_deref();
        match env.event.as_str() {
            "authenticate" => Ok(Inbound::Authenticate(parse(&env.event, data)?)),
            "driver:location" => Ok(Inbound::DriverLocation(parse(&env.event, data)?)),
            "booking:status" => Ok(Inbound::BookingStatus(parse(&env.event, data)?)),
            "booking:new" => Ok(Inbound::BookingNew(parse(&env.event, data)?)),
            "driver:assigned" => Ok(Inbound::DriverAssigned(parse(&env.event, data)?)),
            "payment:received" => Ok(Inbound::PaymentReceived(parse(&env.event, data)?)),
            other => Err(RelayError::BadEvent(format!("unknown event: {other}"))),
        }
    }

    /// Wire name of this event.
    pub fn event_name(&self) -> &'static str {
        match self {
            Inbound::Authenticate(_) => "authenticate",
            Inbound::DriverLocation(_) => "driver:location",
            Inbound::BookingStatus(_) => "booking:status",
            Inbound::BookingNew(_) => "booking:new",
            Inbound::DriverAssigned(_) => "driver:assigned",
            Inbound::PaymentReceived(_) => "payment:received",
        }
    }
}

fn parse<T: DeserializeOwned>(event: &str, data: Option<&RawValue>) -> Result<T> {
    let raw = data.ok_or_else(|| RelayError::BadEvent(format!("{event} requires data")))?;
    serde_json::from_str(raw.get())
        .map_err(|e| RelayError::BadEvent(format!("{event} invalid data: {e}")))
}
