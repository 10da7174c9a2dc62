//! Outbound server events.
//!
//! One conceptual event can take different payload shapes per audience
//! (e.g. `driver:assigned:notification` to admins vs. the customer), so each
//! shape is its own variant. Payloads are timestamped at construction time,
//! which is send time: the relay serializes an outbound event once and then
//! delivers the same frame to every recipient in the fan-out.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::error::{RelayError, Result};

/// RFC 3339 timestamp stamped into outbound payloads at send time.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Ack for a successful `authenticate`.
#[derive(Debug, Clone, Serialize)]
pub struct Authenticated {
    pub success: bool,
}

/// `driver:location:update` (admin audience).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverLocationUpdate {
    pub driver_id: String,
    pub location: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
    pub timestamp: String,
}

/// `chauffeur:location`, sent to the one customer the ping is about.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChauffeurLocation {
    pub location: Value,
    pub timestamp: String,
}

/// `booking:status:update`: same event name to admins, driver, and
/// customer; only the customer copy carries the human-readable `message`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingStatusUpdate {
    pub booking_number: String,
    pub status: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `booking:new:notification` (admin audience).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingNewNotification {
    pub booking_number: String,
    pub customer_name: String,
    pub pickup_location: String,
    pub booking_type: String,
    pub total_price: f64,
    pub timestamp: String,
}

/// `booking:confirmed`, sent to the booking customer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmed {
    pub booking_number: String,
    pub message: String,
    pub timestamp: String,
}

/// `booking:new:assignment`, sent to the assigned driver.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingNewAssignment {
    pub booking_number: String,
    pub booking_id: String,
    pub message: String,
    pub timestamp: String,
}

/// `driver:assigned:notification`, customer shape.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverAssignedCustomer {
    pub booking_number: String,
    pub driver_name: String,
    pub message: String,
    pub timestamp: String,
}

/// `driver:assigned:notification`, admin shape.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverAssignedAdmin {
    pub booking_id: String,
    pub booking_number: String,
    pub driver_id: String,
    pub driver_name: String,
    pub timestamp: String,
}

/// `payment:received:notification` (admin audience).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceivedNotification {
    pub booking_number: String,
    pub amount: f64,
    pub timestamp: String,
}

/// `payment:confirmed`, sent to the paying customer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmed {
    pub booking_number: String,
    pub amount: f64,
    pub message: String,
    pub timestamp: String,
}

/// Closed set of server-originated events.
#[derive(Debug, Clone)]
pub enum Outbound {
    Authenticated(Authenticated),
    DriverLocationUpdate(DriverLocationUpdate),
    ChauffeurLocation(ChauffeurLocation),
    BookingStatusUpdate(BookingStatusUpdate),
    BookingNewNotification(BookingNewNotification),
    BookingConfirmed(BookingConfirmed),
    BookingNewAssignment(BookingNewAssignment),
    DriverAssignedCustomer(DriverAssignedCustomer),
    DriverAssignedAdmin(DriverAssignedAdmin),
    PaymentReceivedNotification(PaymentReceivedNotification),
    PaymentConfirmed(PaymentConfirmed),
}

impl Outbound {
    /// Wire name of this event.
    pub fn event_name(&self) -> &'static str {
        match self {
            Outbound::Authenticated(_) => "authenticated",
            Outbound::DriverLocationUpdate(_) => "driver:location:update",
            Outbound::ChauffeurLocation(_) => "chauffeur:location",
            Outbound::BookingStatusUpdate(_) => "booking:status:update",
            Outbound::BookingNewNotification(_) => "booking:new:notification",
            Outbound::BookingConfirmed(_) => "booking:confirmed",
            Outbound::BookingNewAssignment(_) => "booking:new:assignment",
            Outbound::DriverAssignedCustomer(_) => "driver:assigned:notification",
            Outbound::DriverAssignedAdmin(_) => "driver:assigned:notification",
            Outbound::PaymentReceivedNotification(_) => "payment:received:notification",
            Outbound::PaymentConfirmed(_) => "payment:confirmed",
        }
    }

    /// Serialize to one wire frame (serialize once, deliver N times).
    pub fn encode(&self) -> Result<String> {
        let data = match self {
            Outbound::Authenticated(p) => to_value(p),
            Outbound::DriverLocationUpdate(p) => to_value(p),
            Outbound::ChauffeurLocation(p) => to_value(p),
            Outbound::BookingStatusUpdate(p) => to_value(p),
            Outbound::BookingNewNotification(p) => to_value(p),
            Outbound::BookingConfirmed(p) => to_value(p),
            Outbound::BookingNewAssignment(p) => to_value(p),
            Outbound::DriverAssignedCustomer(p) => to_value(p),
            Outbound::DriverAssignedAdmin(p) => to_value(p),
            Outbound::PaymentReceivedNotification(p) => to_value(p),
            Outbound::PaymentConfirmed(p) => to_value(p),
        }?;
        let frame = serde_json::json!({ "event": self.event_name(), "data": data });
        serde_json::to_string(&frame)
            .map_err(|e| RelayError::Internal(format!("frame encode failed: {e}")))
    }
}

fn to_value<T: Serialize>(payload: &T) -> Result<Value> {
    serde_json::to_value(payload)
        .map_err(|e| RelayError::Internal(format!("payload encode failed: {e}")))
}
