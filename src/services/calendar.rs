use chrono::{Duration, NaiveDateTime};

use crate::models::Booking;

const ICS_FORMAT: &str = "%Y%m%dT%H%M%S";

fn ics_time(ts: &NaiveDateTime) -> String {
    ts.format(ICS_FORMAT).to_string()
}

/// Text values may not carry raw commas, semicolons or newlines.
fn escape_text(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

/// Single-event calendar for a booking. Times are the shop's wall clock
/// (floating), and the event covers the service only, not the cleanup buffer.
pub fn generate_ics(booking: &Booking, shop_name: &str, service_name: &str) -> String {
    let dtstart = ics_time(&booking.appointment_date_time);
    let dtend = ics_time(
        &(booking.appointment_date_time + Duration::minutes(booking.duration_minutes as i64)),
    );
    let dtstamp = ics_time(&booking.created_at);
    let uid = format!("{}@barbershop", booking.id);

    let summary = escape_text(&format!("{service_name} at {shop_name}"));
    let description = escape_text(booking.notes.as_deref().unwrap_or("No additional notes"));
    let status = if booking.blocks_calendar() {
        "CONFIRMED"
    } else {
        "CANCELLED"
    };

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Barbershop//Appointments//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         STATUS:{status}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    )
}
