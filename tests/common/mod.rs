#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use sqlx::SqlitePool;
use uuid::Uuid;

use stayhub::{
    clock::{Clock, ManualClock},
    config::Settings,
    contracts::S3ContractRenderer,
    domain::{
        Booking, CancellationPolicy, Listing, ListingStatus, User, UserRole, UserStatus,
    },
    notifications::LogNotifier,
    payments::{FakePaymentGateway, PaymentGateway},
    service::{CreateBookingInput, ServiceContext},
};

pub const CHECKSUM_KEY: &str = "test-checksum-key";

pub struct TestApp {
    pub ctx: Arc<ServiceContext>,
    pub settings: Arc<Settings>,
    pub clock: Arc<ManualClock>,
    pub gateway: Arc<FakePaymentGateway>,
}

pub async fn spawn_at(start: DateTime<Utc>) -> TestApp {
    let pool = SqlitePool::connect(":memory:").await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    let clock = Arc::new(ManualClock::starting_at(start));
    let gateway = Arc::new(FakePaymentGateway::new());
    let settings = Settings::default();

    let ctx = Arc::new(ServiceContext::new(
        &settings,
        Some(gateway.clone() as Arc<dyn PaymentGateway>),
        Arc::new(S3ContractRenderer::new(
            "test-bucket".to_string(),
            "ap-southeast-1".to_string(),
        )),
        Arc::new(LogNotifier),
        clock.clone(),
        CHECKSUM_KEY.to_string(),
        pool,
    ));

    TestApp {
        ctx,
        settings: Arc::new(settings),
        clock,
        gateway,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn instant(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    date(y, m, d).and_hms_opt(h, min, 0).unwrap().and_utc()
}

pub async fn create_user(app: &TestApp, role: UserRole, with_bank: bool) -> User {
    let now = app.clock.now();
    let id = Uuid::new_v4();
    app.ctx
        .user_repo
        .create(User {
            id,
            email: format!("{id}@example.test"),
            full_name: "Test User".to_string(),
            role,
            status: UserStatus::Active,
            bank_name: with_bank.then(|| "Vietcombank".to_string()),
            bank_account_number: with_bank.then(|| "0123456789".to_string()),
            bank_account_holder: with_bank.then(|| "TEST USER".to_string()),
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap()
}

/// Standard listing: 500k/night, 100k cleaning, 50k service, no tax.
/// Two nights at the default 5% platform fee totals 1,207,500.
pub async fn create_listing(app: &TestApp, host: &User) -> Listing {
    let now = app.clock.now();
    app.ctx
        .listing_repo
        .create(Listing {
            id: Uuid::new_v4(),
            host_id: host.id,
            title: "Riverside Homestay".to_string(),
            status: ListingStatus::Approved,
            base_price: 500_000,
            cleaning_fee: 100_000,
            service_fee: 50_000,
            tax_pct: 0.0,
            cancellation_policy: CancellationPolicy::default(),
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap()
}

pub async fn create_booking(
    app: &TestApp,
    guest: &User,
    listing: &Listing,
    checkin: NaiveDate,
    checkout: NaiveDate,
) -> Booking {
    app.ctx
        .booking_service
        .create_booking(
            guest,
            CreateBookingInput {
                listing_id: listing.id,
                checkin_date: checkin,
                checkout_date: checkout,
                guest_count: 2,
                promo_code: None,
            },
        )
        .await
        .unwrap()
}

pub fn sign_body(body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(CHECKSUM_KEY.as_bytes()).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

pub fn success_webhook(order_code: &str) -> Vec<u8> {
    serde_json::json!({
        "code": "00",
        "desc": "success",
        "success": true,
        "data": {
            "orderCode": order_code.parse::<i64>().unwrap(),
            "reference": format!("FT{order_code}"),
            "amount": 0
        }
    })
    .to_string()
    .into_bytes()
}

pub fn failure_webhook(order_code: &str) -> Vec<u8> {
    serde_json::json!({
        "code": "01",
        "desc": "payment failed",
        "success": false,
        "data": { "orderCode": order_code.parse::<i64>().unwrap() }
    })
    .to_string()
    .into_bytes()
}

/// Drives a booking from `requested` all the way to `paid`: host accepts,
/// guest initiates, a signed success webhook lands. Returns the reloaded
/// booking.
pub async fn pay_booking(app: &TestApp, guest: &User, host: &User, booking_id: Uuid) -> Booking {
    // Order codes are clock-derived; nudge the clock so concurrent test
    // bookings get distinct ones.
    app.clock.advance(chrono::Duration::seconds(61));
    app.ctx
        .booking_service
        .host_accept(host, booking_id, Some(60))
        .await
        .unwrap();
    let initiation = app
        .ctx
        .booking_service
        .initiate_payment(guest, booking_id, "payos".to_string(), "qr".to_string())
        .await
        .unwrap();

    let body = success_webhook(&initiation.order_code);
    let sig = sign_body(&body);
    let ack = app.ctx.reconciler.process(&body, Some(&sig)).await.unwrap();
    assert!(ack.ok);

    app.ctx
        .booking_service
        .get_booking(guest, booking_id)
        .await
        .unwrap()
}
