pub mod booking;
pub mod schedule;
pub mod service;
pub mod shop;
pub mod staff;

pub use booking::{Booking, BookingStatus, Interval, PaymentStatus};
pub use schedule::{AvailabilityWindow, BusinessHours, DayOfWeek, StaffAvailability, TimeWindow};
pub use service::{Service, ServiceCategory};
pub use shop::{Shop, ShopSettings};
pub use staff::Staff;
