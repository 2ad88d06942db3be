pub mod booking;
pub mod slot;

pub use booking::{Booking, BookedBy, PaymentMethod, PaymentStatus, RefundStatus, VehicleClass};
pub use slot::{SlotEntry, SlotStatus, SlotView, TIME_SLOTS};
