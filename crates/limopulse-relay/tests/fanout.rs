//! Fan-out tests over a real registry with channel-backed connections:
//! broadcast-plus-unicast routing, silent drops for offline recipients, and
//! the webhook injection path.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use axum::extract::ws::Message;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use limopulse_core::protocol::{envelope, Inbound};
use limopulse_relay::registry::{ConnId, Connection, ConnectionRegistry};
use limopulse_relay::routing;

fn connect(reg: &ConnectionRegistry) -> (ConnId, mpsc::Receiver<Message>) {
    let (tx, rx) = mpsc::channel(8);
    (reg.add_conn(Connection { tx }), rx)
}

/// Feed one wire frame through the same decode path the transport uses.
fn send(reg: &ConnectionRegistry, from: ConnId, frame: &str) {
    let env = envelope::decode(frame).unwrap();
    let event = Inbound::from_envelope(&env).unwrap();
    routing::handle_event(reg, from, event);
}

/// Pop one delivered frame as (event, data).
fn recv(rx: &mut mpsc::Receiver<Message>) -> (String, Value) {
    let Ok(Message::Text(text)) = rx.try_recv() else {
        panic!("expected a delivered text frame");
    };
    let v: Value = serde_json::from_str(&text).unwrap();
    (v["event"].as_str().unwrap().to_owned(), v["data"].clone())
}

fn assert_empty(rx: &mut mpsc::Receiver<Message>) {
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

fn authenticate(reg: &ConnectionRegistry, conn: ConnId, user_id: &str, role: &str) {
    send(
        reg,
        conn,
        &format!(r#"{{"event":"authenticate","data":{{"userId":"{user_id}","role":"{role}"}}}}"#),
    );
}

#[test]
fn authenticate_acks_and_registers() {
    let reg = ConnectionRegistry::new();
    let (admin, mut rx) = connect(&reg);

    authenticate(&reg, admin, "a1", "ADMIN");

    let (event, data) = recv(&mut rx);
    assert_eq!(event, "authenticated");
    assert_eq!(data["success"], true);
    assert_eq!(reg.all_admin_conns(), vec![admin]);
}

#[test]
fn unknown_role_gets_no_ack_and_no_bucket() {
    let reg = ConnectionRegistry::new();
    let (conn, mut rx) = connect(&reg);

    authenticate(&reg, conn, "x1", "DISPATCHER");

    assert_empty(&mut rx);
    let counts = reg.counts();
    assert_eq!(counts.admins + counts.drivers + counts.customers, 0);
    assert_eq!(counts.connected, 1);
}

// Scenario: new booking reaches every admin and the booking's customer.
#[test]
fn booking_new_fans_out_to_admins_and_customer() {
    let reg = ConnectionRegistry::new();
    let (admin, mut admin_rx) = connect(&reg);
    let (customer, mut customer_rx) = connect(&reg);
    authenticate(&reg, admin, "a1", "ADMIN");
    authenticate(&reg, customer, "c1", "CUSTOMER");
    recv(&mut admin_rx); // drain acks
    recv(&mut customer_rx);

    send(
        &reg,
        customer,
        r#"{"event":"booking:new","data":{"bookingNumber":"BK1","customerName":"Jane","pickupLocation":"LAX","bookingType":"AIRPORT","totalPrice":120,"customerId":"c1"}}"#,
    );

    let (event, data) = recv(&mut admin_rx);
    assert_eq!(event, "booking:new:notification");
    assert_eq!(data["bookingNumber"], "BK1");
    assert_eq!(data["customerName"], "Jane");
    assert!(data["timestamp"].is_string());

    let (event, data) = recv(&mut customer_rx);
    assert_eq!(event, "booking:confirmed");
    assert_eq!(data["bookingNumber"], "BK1");
    assert!(data["message"].is_string());

    assert_empty(&mut admin_rx);
    assert_empty(&mut customer_rx);
}

// Both parties resolvable: exactly three deliveries, one per audience.
#[test]
fn booking_status_three_way_fanout() {
    let reg = ConnectionRegistry::new();
    let (admin, mut admin_rx) = connect(&reg);
    let (driver, mut driver_rx) = connect(&reg);
    let (customer, mut customer_rx) = connect(&reg);
    authenticate(&reg, admin, "a1", "ADMIN");
    authenticate(&reg, driver, "d1", "DRIVER");
    authenticate(&reg, customer, "c1", "CUSTOMER");
    recv(&mut admin_rx);
    recv(&mut driver_rx);
    recv(&mut customer_rx);

    send(
        &reg,
        driver,
        r#"{"event":"booking:status","data":{"bookingId":"7","bookingNumber":"BK7","status":"EN_ROUTE","customerId":"c1","driverId":"d1"}}"#,
    );

    let (event, data) = recv(&mut admin_rx);
    assert_eq!(event, "booking:status:update");
    assert_eq!(data["status"], "EN_ROUTE");
    assert!(data.get("message").is_none());

    let (event, data) = recv(&mut customer_rx);
    assert_eq!(event, "booking:status:update");
    assert_eq!(data["bookingNumber"], "BK7");
    assert!(data["message"].as_str().unwrap().contains("BK7"));

    let (event, _) = recv(&mut driver_rx);
    assert_eq!(event, "booking:status:update");

    assert_empty(&mut admin_rx);
    assert_empty(&mut driver_rx);
    assert_empty(&mut customer_rx);
}

// Scenario: a driver who disconnected is simply not delivered to; the admin
// copies still go out.
#[test]
fn assignment_to_offline_driver_drops_silently() {
    let reg = ConnectionRegistry::new();
    let (admin, mut admin_rx) = connect(&reg);
    let (driver, mut driver_rx) = connect(&reg);
    authenticate(&reg, admin, "a1", "ADMIN");
    authenticate(&reg, driver, "d1", "DRIVER");
    recv(&mut admin_rx);
    recv(&mut driver_rx);

    reg.unregister(driver);

    send(
        &reg,
        admin,
        r#"{"event":"driver:assigned","data":{"bookingId":"9","bookingNumber":"BK9","driverId":"d1","customerId":"c9","driverName":"Max"}}"#,
    );

    let (event, data) = recv(&mut admin_rx);
    assert_eq!(event, "driver:assigned:notification");
    assert_eq!(data["driverId"], "d1");
    assert_eq!(data["driverName"], "Max");

    // nothing reached the gone driver connection, nothing crashed
    assert_empty(&mut driver_rx);
    assert_empty(&mut admin_rx);
}

#[test]
fn driver_location_routes_to_admins_and_booked_customer() {
    let reg = ConnectionRegistry::new();
    let (admin, mut admin_rx) = connect(&reg);
    let (customer, mut customer_rx) = connect(&reg);
    authenticate(&reg, admin, "a1", "ADMIN");
    authenticate(&reg, customer, "c1", "CUSTOMER");
    recv(&mut admin_rx);
    recv(&mut customer_rx);

    send(
        &reg,
        admin,
        r#"{"event":"driver:location","data":{"driverId":"d1","location":{"lat":34.0,"lng":-118.2},"bookingId":"5","customerId":"c1"}}"#,
    );

    let (event, data) = recv(&mut admin_rx);
    assert_eq!(event, "driver:location:update");
    assert_eq!(data["driverId"], "d1");
    assert_eq!(data["location"]["lat"], 34.0);

    let (event, data) = recv(&mut customer_rx);
    assert_eq!(event, "chauffeur:location");
    assert_eq!(data["location"]["lng"], -118.2);
    assert!(data["timestamp"].is_string());
}

#[test]
fn driver_location_without_booking_skips_customer() {
    let reg = ConnectionRegistry::new();
    let (customer, mut customer_rx) = connect(&reg);
    authenticate(&reg, customer, "c1", "CUSTOMER");
    recv(&mut customer_rx);

    // customerId present but no bookingId: admins only (and none are online)
    send(
        &reg,
        customer,
        r#"{"event":"driver:location","data":{"driverId":"d1","location":{"lat":1.0,"lng":2.0},"customerId":"c1"}}"#,
    );

    assert_empty(&mut customer_rx);
}

#[test]
fn payment_received_fans_out() {
    let reg = ConnectionRegistry::new();
    let (admin, mut admin_rx) = connect(&reg);
    let (customer, mut customer_rx) = connect(&reg);
    authenticate(&reg, admin, "a1", "ADMIN");
    authenticate(&reg, customer, "c1", "CUSTOMER");
    recv(&mut admin_rx);
    recv(&mut customer_rx);

    send(
        &reg,
        admin,
        r#"{"event":"payment:received","data":{"bookingNumber":"BK3","amount":250.5,"customerId":"c1"}}"#,
    );

    let (event, data) = recv(&mut admin_rx);
    assert_eq!(event, "payment:received:notification");
    assert_eq!(data["amount"], 250.5);

    let (event, data) = recv(&mut customer_rx);
    assert_eq!(event, "payment:confirmed");
    assert_eq!(data["bookingNumber"], "BK3");
    assert_eq!(data["amount"], 250.5);
}

// Webhook injection drives the same fan-out as the socket path.
#[test]
fn webhook_new_booking_reaches_admins() {
    let reg = ConnectionRegistry::new();
    let (a1, mut rx1) = connect(&reg);
    let (a2, mut rx2) = connect(&reg);
    authenticate(&reg, a1, "a1", "ADMIN");
    authenticate(&reg, a2, "a2", "ADMIN");
    recv(&mut rx1);
    recv(&mut rx2);

    routing::handle_webhook(
        &reg,
        "new_booking",
        &serde_json::json!({ "bookingNumber": "BK2" }),
    );

    for rx in [&mut rx1, &mut rx2] {
        let (event, data) = recv(rx);
        assert_eq!(event, "booking:new:notification");
        assert_eq!(data["bookingNumber"], "BK2");
    }
}

#[test]
fn webhook_status_update_broadcasts_to_everyone() {
    let reg = ConnectionRegistry::new();
    let (admin, mut admin_rx) = connect(&reg);
    let (customer, mut customer_rx) = connect(&reg);
    let (_unauth, mut unauth_rx) = connect(&reg);
    authenticate(&reg, admin, "a1", "ADMIN");
    authenticate(&reg, customer, "c1", "CUSTOMER");
    recv(&mut admin_rx);
    recv(&mut customer_rx);

    routing::handle_webhook(
        &reg,
        "status_update",
        &serde_json::json!({ "bookingNumber": "BK4", "status": "COMPLETED" }),
    );

    for rx in [&mut admin_rx, &mut customer_rx, &mut unauth_rx] {
        let (event, data) = recv(rx);
        assert_eq!(event, "booking:status:update");
        assert_eq!(data["status"], "COMPLETED");
    }
}

#[test]
fn webhook_unknown_event_is_a_noop() {
    let reg = ConnectionRegistry::new();
    let (admin, mut admin_rx) = connect(&reg);
    authenticate(&reg, admin, "a1", "ADMIN");
    recv(&mut admin_rx);

    routing::handle_webhook(&reg, "booking_cancelled", &serde_json::json!({}));

    assert_empty(&mut admin_rx);
}

// One recipient with a wedged queue must not abort the rest of a broadcast.
#[test]
fn full_queue_drops_one_recipient_only() {
    let reg = ConnectionRegistry::new();

    // capacity-1 queue, pre-filled so the next try_send fails
    let (tx, mut stuck_rx) = mpsc::channel(1);
    tx.try_send(Message::Text("sentinel".into())).unwrap();
    let stuck = reg.add_conn(Connection { tx });
    reg.register_admin("a-stuck", stuck);

    let (healthy, mut healthy_rx) = connect(&reg);
    authenticate(&reg, healthy, "a2", "ADMIN");
    recv(&mut healthy_rx);

    send(
        &reg,
        healthy,
        r#"{"event":"booking:new","data":{"bookingNumber":"BK8","customerName":"Ann","pickupLocation":"SFO","bookingType":"AIRPORT","totalPrice":90}}"#,
    );

    let (event, _) = recv(&mut healthy_rx);
    assert_eq!(event, "booking:new:notification");

    // the stuck queue still only holds the sentinel
    let Ok(Message::Text(s)) = stuck_rx.try_recv() else {
        panic!("sentinel missing");
    };
    assert_eq!(s, "sentinel");
    assert_empty(&mut stuck_rx);
}
