pub mod booking;
pub mod listing;
pub mod payout;
pub mod user;

pub use booking::*;
pub use listing::*;
pub use payout::*;
pub use user::*;
