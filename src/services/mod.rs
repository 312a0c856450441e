pub mod availability;
pub mod calendar;
pub mod catalog;
pub mod conflict;
pub mod lifecycle;
pub mod notifications;
pub mod scheduling;
pub mod staff_lock;
