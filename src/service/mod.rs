pub mod booking_service;
pub mod payout_service;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::clock::Clock;
use crate::config::Settings;
use crate::contracts::ContractRenderer;
use crate::notifications::NotificationSink;
use crate::payments::{reconciler::PaymentReconciler, PaymentGateway};
use crate::repository::*;

pub use booking_service::{
    BookingPage, BookingService, CancelBookingInput, CreateBookingInput, PaymentInitiation,
};
pub use payout_service::PayoutService;

pub struct ServiceContext {
    pub user_repo: Arc<dyn UserRepository>,
    pub listing_repo: Arc<dyn ListingRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub payout_repo: Arc<dyn PayoutRepository>,
    pub booking_service: Arc<BookingService>,
    pub payout_service: Arc<PayoutService>,
    pub reconciler: Arc<PaymentReconciler>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: &Settings,
        gateway: Option<Arc<dyn PaymentGateway>>,
        contract_renderer: Arc<dyn ContractRenderer>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        checksum_key: String,
        db_pool: SqlitePool,
    ) -> Self {
        let user_repo: Arc<dyn UserRepository> =
            Arc::new(SqliteUserRepository::new(db_pool.clone()));
        let listing_repo: Arc<dyn ListingRepository> =
            Arc::new(SqliteListingRepository::new(db_pool.clone()));
        let booking_repo: Arc<dyn BookingRepository> =
            Arc::new(SqliteBookingRepository::new(db_pool.clone()));
        let payout_repo: Arc<dyn PayoutRepository> =
            Arc::new(SqlitePayoutRepository::new(db_pool.clone()));

        let booking_service = Arc::new(BookingService::new(
            booking_repo.clone(),
            listing_repo.clone(),
            gateway,
            notifier.clone(),
            clock.clone(),
            settings.booking.clone(),
            settings.server.base_url.clone(),
        ));
        let payout_service = Arc::new(PayoutService::new(
            booking_repo.clone(),
            payout_repo.clone(),
            user_repo.clone(),
            clock.clone(),
            settings.booking.platform_fee_pct,
            settings.booking.utc_offset_hours,
        ));
        let reconciler = Arc::new(PaymentReconciler::new(
            booking_repo.clone(),
            contract_renderer,
            notifier,
            clock,
            checksum_key,
        ));

        Self {
            user_repo,
            listing_repo,
            booking_repo,
            payout_repo,
            booking_service,
            payout_service,
            reconciler,
            db_pool,
        }
    }
}
