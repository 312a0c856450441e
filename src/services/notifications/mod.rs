pub mod webhook;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::{Booking, BookingStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BookingEventKind {
    #[serde(rename = "booking_created")]
    Created,
    #[serde(rename = "booking_confirmed")]
    Confirmed,
    #[serde(rename = "booking_cancelled")]
    Cancelled,
    #[serde(rename = "booking_rescheduled")]
    Rescheduled,
}

impl BookingEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingEventKind::Created => "booking_created",
            BookingEventKind::Confirmed => "booking_confirmed",
            BookingEventKind::Cancelled => "booking_cancelled",
            BookingEventKind::Rescheduled => "booking_rescheduled",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingEvent {
    pub event: BookingEventKind,
    pub booking_id: String,
    pub shop_id: String,
    pub staff_id: String,
    pub user_id: String,
    pub appointment_date_time: NaiveDateTime,
    pub status: BookingStatus,
}

impl BookingEvent {
    pub fn new(event: BookingEventKind, booking: &Booking) -> Self {
        Self {
            event,
            booking_id: booking.id.clone(),
            shop_id: booking.shop_id.clone(),
            staff_id: booking.staff_id.clone(),
            user_id: booking.user_id.clone(),
            appointment_date_time: booking.appointment_date_time,
            status: booking.status,
        }
    }
}

/// Fire-and-forget delivery of booking events to whoever is listening.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &BookingEvent) -> anyhow::Result<()>;
}

/// Writes events to the log. Used when no webhook is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &BookingEvent) -> anyhow::Result<()> {
        tracing::info!(
            event = event.event.as_str(),
            booking_id = %event.booking_id,
            staff_id = %event.staff_id,
            "booking event"
        );
        Ok(())
    }
}

/// Sends `event` in the background. Delivery failures are logged and never
/// reach the caller.
pub fn dispatch(notifier: Arc<dyn Notifier>, event: BookingEvent) {
    tokio::spawn(async move {
        if let Err(e) = notifier.notify(&event).await {
            tracing::warn!(
                event = event.event.as_str(),
                booking_id = %event.booking_id,
                "failed to deliver booking event: {e:#}"
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_wire_name() {
        let event = BookingEvent {
            event: BookingEventKind::Cancelled,
            booking_id: "b-1".to_string(),
            shop_id: "shop-1".to_string(),
            staff_id: "staff-1".to_string(),
            user_id: "user-1".to_string(),
            appointment_date_time: NaiveDateTime::parse_from_str(
                "2025-06-16 10:00",
                "%Y-%m-%d %H:%M",
            )
            .unwrap(),
            status: BookingStatus::Cancelled,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "booking_cancelled");
        assert_eq!(json["status"], "CANCELLED");
        assert_eq!(json["booking_id"], "b-1");
    }

    struct Failing;

    #[async_trait]
    impl Notifier for Failing {
        async fn notify(&self, _event: &BookingEvent) -> anyhow::Result<()> {
            anyhow::bail!("listener down")
        }
    }

    #[tokio::test]
    async fn test_dispatch_swallows_failures() {
        let event = BookingEvent {
            event: BookingEventKind::Created,
            booking_id: "b-1".to_string(),
            shop_id: "shop-1".to_string(),
            staff_id: "staff-1".to_string(),
            user_id: "user-1".to_string(),
            appointment_date_time: NaiveDateTime::default(),
            status: BookingStatus::Pending,
        };
        dispatch(Arc::new(Failing), event);
        tokio::task::yield_now().await;
    }
}
