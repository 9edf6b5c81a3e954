pub mod admin;
pub mod bookings;
pub mod payments;
pub mod root;
