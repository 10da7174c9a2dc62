//! Event fan-out.
//!
//! Maps one inbound event to zero or more deliveries per the routing policy:
//! every booking-related event is broadcast to the full admin audience, and
//! additionally unicast to the specific driver/customer the event is about,
//! resolved strictly by identity lookup at send time. Identities persist
//! across reconnects; connection ids do not.
//!
//! Delivery is fire-and-forget: each frame is serialized once, then
//! `try_send` per recipient. A full or closed queue drops that one delivery
//! without aborting the rest of the fan-out, and an offline recipient is a
//! silent skip.

use axum::extract::ws::Message;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use limopulse_core::identity::Role;
use limopulse_core::protocol::inbound::{
    BookingNew, BookingStatus, DriverAssigned, DriverLocation, PaymentReceived,
};
use limopulse_core::protocol::outbound::{
    now_rfc3339, Authenticated, BookingConfirmed, BookingNewAssignment,
    BookingNewNotification, BookingStatusUpdate, ChauffeurLocation, DriverAssignedAdmin,
    DriverAssignedCustomer, DriverLocationUpdate, PaymentConfirmed, PaymentReceivedNotification,
};
use limopulse_core::protocol::{Inbound, Outbound};

use crate::registry::{ConnId, ConnectionRegistry};

/// Route one inbound event from `sender` to its audiences.
pub fn handle_event(registry: &ConnectionRegistry, sender: ConnId, event: Inbound) {
    match event {
        Inbound::Authenticate(p) => {
            let Some(role) = Role::parse(&p.role) else {
                warn!(conn_id = sender, user_id = %p.user_id, role = %p.role,
                    "unknown role, not registered");
                return;
            };
            match role {
                Role::Admin => registry.register_admin(&p.user_id, sender),
                Role::Driver => registry.register_driver(&p.user_id, sender),
                Role::Customer => registry.register_customer(&p.user_id, sender),
            }
            info!(conn_id = sender, user_id = %p.user_id, role = role.as_str(), "authenticated");
            unicast(
                registry,
                sender,
                &Outbound::Authenticated(Authenticated { success: true }),
            );
        }

        Inbound::DriverLocation(p) => route_driver_location(registry, p),
        Inbound::BookingStatus(p) => route_booking_status(registry, p),
        Inbound::BookingNew(p) => route_booking_new(registry, p),
        Inbound::DriverAssigned(p) => route_driver_assigned(registry, p),
        Inbound::PaymentReceived(p) => route_payment_received(registry, p),
    }
}

fn route_driver_location(registry: &ConnectionRegistry, p: DriverLocation) {
    broadcast_admins(
        registry,
        &Outbound::DriverLocationUpdate(DriverLocationUpdate {
            driver_id: p.driver_id,
            location: p.location.clone(),
            booking_id: p.booking_id.clone(),
            timestamp: now_rfc3339(),
        }),
    );

    // The customer copy only goes out for a ping tied to a booking.
    if p.booking_id.is_some() {
        if let Some(customer_id) = p.customer_id.as_deref() {
            unicast_customer(
                registry,
                customer_id,
                &Outbound::ChauffeurLocation(ChauffeurLocation {
                    location: p.location,
                    timestamp: now_rfc3339(),
                }),
            );
        }
    }
}

fn route_booking_status(registry: &ConnectionRegistry, p: BookingStatus) {
    broadcast_admins(
        registry,
        &Outbound::BookingStatusUpdate(BookingStatusUpdate {
            booking_number: p.booking_number.clone(),
            status: p.status.clone(),
            timestamp: now_rfc3339(),
            message: None,
        }),
    );

    if let Some(customer_id) = p.customer_id.as_deref() {
        unicast_customer(
            registry,
            customer_id,
            &Outbound::BookingStatusUpdate(BookingStatusUpdate {
                booking_number: p.booking_number.clone(),
                status: p.status.clone(),
                timestamp: now_rfc3339(),
                message: Some(status_message(&p.booking_number, &p.status)),
            }),
        );
    }

    if let Some(driver_id) = p.driver_id.as_deref() {
        unicast_driver(
            registry,
            driver_id,
            &Outbound::BookingStatusUpdate(BookingStatusUpdate {
                booking_number: p.booking_number,
                status: p.status,
                timestamp: now_rfc3339(),
                message: None,
            }),
        );
    }
}

fn route_booking_new(registry: &ConnectionRegistry, p: BookingNew) {
    broadcast_admins(
        registry,
        &Outbound::BookingNewNotification(BookingNewNotification {
            booking_number: p.booking_number.clone(),
            customer_name: p.customer_name,
            pickup_location: p.pickup_location,
            booking_type: p.booking_type,
            total_price: p.total_price,
            timestamp: now_rfc3339(),
        }),
    );

    if let Some(customer_id) = p.customer_id.as_deref() {
        unicast_customer(
            registry,
            customer_id,
            &Outbound::BookingConfirmed(BookingConfirmed {
                message: format!("Your booking {} has been received", p.booking_number),
                booking_number: p.booking_number,
                timestamp: now_rfc3339(),
            }),
        );
    }
}

fn route_driver_assigned(registry: &ConnectionRegistry, p: DriverAssigned) {
    unicast_driver(
        registry,
        &p.driver_id,
        &Outbound::BookingNewAssignment(BookingNewAssignment {
            booking_number: p.booking_number.clone(),
            booking_id: p.booking_id.clone(),
            message: format!("You have been assigned booking {}", p.booking_number),
            timestamp: now_rfc3339(),
        }),
    );

    unicast_customer(
        registry,
        &p.customer_id,
        &Outbound::DriverAssignedCustomer(DriverAssignedCustomer {
            booking_number: p.booking_number.clone(),
            driver_name: p.driver_name.clone(),
            message: format!("{} has been assigned to your booking", p.driver_name),
            timestamp: now_rfc3339(),
        }),
    );

    broadcast_admins(
        registry,
        &Outbound::DriverAssignedAdmin(DriverAssignedAdmin {
            booking_id: p.booking_id,
            booking_number: p.booking_number,
            driver_id: p.driver_id,
            driver_name: p.driver_name,
            timestamp: now_rfc3339(),
        }),
    );
}

fn route_payment_received(registry: &ConnectionRegistry, p: PaymentReceived) {
    broadcast_admins(
        registry,
        &Outbound::PaymentReceivedNotification(PaymentReceivedNotification {
            booking_number: p.booking_number.clone(),
            amount: p.amount,
            timestamp: now_rfc3339(),
        }),
    );

    if let Some(customer_id) = p.customer_id.as_deref() {
        unicast_customer(
            registry,
            customer_id,
            &Outbound::PaymentConfirmed(PaymentConfirmed {
                message: format!(
                    "Payment of {} received for booking {}",
                    p.amount, p.booking_number
                ),
                booking_number: p.booking_number,
                amount: p.amount,
                timestamp: now_rfc3339(),
            }),
        );
    }
}

fn status_message(booking_number: &str, status: &str) -> String {
    format!("Your booking {booking_number} is now {status}")
}

// --------------------
// Webhook path
// --------------------

/// Loose payload for server-to-server injections. External callers send
/// whatever subset of fields they have; missing fields default instead of
/// rejecting the whole event.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WebhookData {
    booking_id: String,
    booking_number: String,
    customer_name: String,
    pickup_location: String,
    booking_type: String,
    total_price: f64,
    status: String,
    driver_id: String,
    driver_name: String,
    customer_id: Option<String>,
}

/// Route one externally injected event. Unrecognized event names are a
/// silent no-op; the webhook response is success either way.
pub fn handle_webhook(registry: &ConnectionRegistry, event: &str, data: &Value) {
    match event {
        "new_booking" => {
            let p = webhook_data(event, data);
            route_booking_new(
                registry,
                BookingNew {
                    booking_number: p.booking_number,
                    customer_name: p.customer_name,
                    pickup_location: p.pickup_location,
                    booking_type: p.booking_type,
                    total_price: p.total_price,
                    customer_id: p.customer_id,
                },
            );
        }
        // Webhook payloads carry no ids to route by, so this one goes to
        // every live connection rather than through identity resolution.
        "status_update" => {
            let p = webhook_data(event, data);
            broadcast_all(
                registry,
                &Outbound::BookingStatusUpdate(BookingStatusUpdate {
                    booking_number: p.booking_number,
                    status: p.status,
                    timestamp: now_rfc3339(),
                    message: None,
                }),
            );
        }
        "driver_assigned" => {
            let p = webhook_data(event, data);
            route_driver_assigned(
                registry,
                DriverAssigned {
                    booking_id: p.booking_id,
                    booking_number: p.booking_number,
                    driver_id: p.driver_id,
                    customer_id: p.customer_id.unwrap_or_default(),
                    driver_name: p.driver_name,
                },
            );
        }
        other => debug!(event = other, "unrecognized webhook event, ignoring"),
    }
}

fn webhook_data(event: &str, data: &Value) -> WebhookData {
    match serde_json::from_value(data.clone()) {
        Ok(p) => p,
        Err(e) => {
            warn!(event, error = %e, "webhook data malformed, using defaults");
            WebhookData::default()
        }
    }
}

// --------------------
// Delivery primitives (serialize once, try_send per recipient)
// --------------------

fn prepare(out: &Outbound) -> Option<String> {
    match out.encode() {
        Ok(frame) => Some(frame),
        Err(e) => {
            warn!(event = out.event_name(), error = %e, "encode failed, dropping");
            None
        }
    }
}

fn deliver(registry: &ConnectionRegistry, conn_id: ConnId, frame: &str) {
    let Some(conn) = registry.sender(conn_id) else {
        return;
    };
    if conn.tx.try_send(Message::Text(frame.to_owned())).is_err() {
        debug!(conn_id, "outbound queue full or closed, dropping");
    }
}

fn unicast(registry: &ConnectionRegistry, conn_id: ConnId, out: &Outbound) {
    if let Some(frame) = prepare(out) {
        deliver(registry, conn_id, &frame);
    }
}

fn unicast_driver(registry: &ConnectionRegistry, driver_id: &str, out: &Outbound) {
    // Offline driver: silently drop, the admin copies still go out.
    if let Some(conn_id) = registry.resolve_driver(driver_id) {
        unicast(registry, conn_id, out);
    }
}

fn unicast_customer(registry: &ConnectionRegistry, customer_id: &str, out: &Outbound) {
    if let Some(conn_id) = registry.resolve_customer(customer_id) {
        unicast(registry, conn_id, out);
    }
}

fn broadcast_admins(registry: &ConnectionRegistry, out: &Outbound) {
    let Some(frame) = prepare(out) else { return };
    for conn_id in registry.all_admin_conns() {
        deliver(registry, conn_id, &frame);
    }
}

fn broadcast_all(registry: &ConnectionRegistry, out: &Outbound) {
    let Some(frame) = prepare(out) else { return };
    for conn_id in registry.all_conns() {
        deliver(registry, conn_id, &frame);
    }
}
