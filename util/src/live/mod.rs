//! Live-subscription contract for read models.
//!
//! Workflows publish JSON event envelopes onto named topics; presentation
//! layers subscribe to the topics they render (a student's notification feed,
//! a faculty member's alert feed). The transport that carries messages to a
//! client is out of scope here — subscribers receive the serialized envelope
//! and forward it however they like.

pub mod hub;
pub use hub::LiveHub;

use chrono::Utc;
use serde::Serialize;

/// Standard event envelope sent over live topics.
#[derive(Serialize)]
pub struct EventEnvelope<'a, T> {
    #[serde(rename = "type")]
    pub r#type: &'static str,
    pub event: &'a str,
    pub topic: &'a str,
    pub payload: T,
    pub ts: String,
}

/// Broadcast a JSON-serialized `EventEnvelope` on `topic`.
pub async fn emit<T: Serialize>(hub: &LiveHub, topic: &str, event: &str, payload: &T) {
    let env = EventEnvelope {
        r#type: "event",
        event,
        topic,
        payload,
        ts: Utc::now().to_rfc3339(),
    };
    if let Ok(json) = serde_json::to_string(&env) {
        hub.broadcast(topic, json).await;
    }
}

/// Topic name helpers so producers and subscribers agree on spelling.
pub mod topics {
    /// Per-student notification feed.
    pub fn student_notifications(student_id: i64) -> String {
        format!("student:{student_id}:notifications")
    }

    /// Per-faculty violation alert feed.
    pub fn faculty_alerts(faculty_id: i64) -> String {
        format!("faculty:{faculty_id}:alerts")
    }

    /// Per-faculty follow/connection request feed.
    pub fn faculty_requests(faculty_id: i64) -> String {
        format!("faculty:{faculty_id}:requests")
    }
}
