pub mod allocator;
pub mod availability;
pub mod bookings;
pub mod notify;
