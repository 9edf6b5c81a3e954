mod common;

use chrono::Duration;
use common::*;

use stayhub::{
    clock::Clock,
    domain::{BookingStatus, PaymentStatus, RefundStatus, UserRole},
    error::AppError,
    pricing::round_pct,
    service::{CancelBookingInput, CreateBookingInput},
};

fn no_bank_cancel(reason: &str) -> CancelBookingInput {
    CancelBookingInput {
        reason: Some(reason.to_string()),
        bank_name: None,
        bank_account_number: None,
        bank_account_holder: None,
    }
}

fn bank_cancel(reason: &str) -> CancelBookingInput {
    CancelBookingInput {
        reason: Some(reason.to_string()),
        bank_name: Some("Vietcombank".to_string()),
        bank_account_number: Some("0123456789".to_string()),
        bank_account_holder: Some("TEST USER".to_string()),
    }
}

#[tokio::test]
async fn booking_flows_from_request_to_paid() {
    let app = spawn_at(instant(2025, 3, 1, 2, 0)).await;
    let guest = create_user(&app, UserRole::Guest, false).await;
    let host = create_user(&app, UserRole::Host, true).await;
    let listing = create_listing(&app, &host).await;

    let booking =
        create_booking(&app, &guest, &listing, date(2025, 3, 20), date(2025, 3, 22)).await;
    assert_eq!(booking.status, BookingStatus::Requested);
    assert_eq!(booking.nights, 2);
    assert_eq!(booking.pricing.subtotal, 1_150_000);
    assert_eq!(booking.pricing.platform_fee, 57_500);
    assert_eq!(booking.pricing.total, 1_207_500);
    assert_eq!(booking.pricing.host_payout, 1_092_500);
    assert!(booking.contract.preview_hash.is_some());
    assert!(booking.order_code.is_none());

    let accepted = app
        .ctx
        .booking_service
        .host_accept(&host, booking.id, Some(30))
        .await
        .unwrap();
    assert_eq!(accepted.status, BookingStatus::AwaitingPayment);
    let expires_at = accepted.expires_at.unwrap();
    assert_eq!(expires_at, app.clock.now() + Duration::minutes(30));

    let initiation = app
        .ctx
        .booking_service
        .initiate_payment(&guest, booking.id, "payos".to_string(), "qr".to_string())
        .await
        .unwrap();
    assert_eq!(initiation.amount, 1_207_500);
    assert_eq!(initiation.currency, "VND");
    assert!(initiation.checkout_url.contains(&initiation.order_code));

    let body = success_webhook(&initiation.order_code);
    let sig = sign_body(&body);
    let ack = app.ctx.reconciler.process(&body, Some(&sig)).await.unwrap();
    assert!(ack.ok);

    let paid = app
        .ctx
        .booking_service
        .get_booking(&guest, booking.id)
        .await
        .unwrap();
    assert_eq!(paid.status, BookingStatus::Paid);
    assert_eq!(paid.payment.status, PaymentStatus::Succeeded);
    assert!(paid.payment.paid_at.is_some());
    // Contract issuance rides on the success path
    assert!(paid.contract.executed_at.is_some());
    assert!(paid.contract.pdf_key.as_deref().unwrap().contains(&booking.id.to_string()));

    let txns = app.ctx.booking_repo.list_txns(booking.id).await.unwrap();
    assert_eq!(txns.len(), 1);
    assert_eq!(txns[0].amount, 1_207_500);
}

#[tokio::test]
async fn duplicate_success_webhook_is_a_no_op() {
    let app = spawn_at(instant(2025, 3, 1, 2, 0)).await;
    let guest = create_user(&app, UserRole::Guest, false).await;
    let host = create_user(&app, UserRole::Host, true).await;
    let listing = create_listing(&app, &host).await;

    let booking =
        create_booking(&app, &guest, &listing, date(2025, 3, 20), date(2025, 3, 22)).await;
    let paid = pay_booking(&app, &guest, &host, booking.id).await;
    assert_eq!(paid.status, BookingStatus::Paid);

    let body = success_webhook(&paid.order_code.clone().unwrap());
    let sig = sign_body(&body);
    let ack = app.ctx.reconciler.process(&body, Some(&sig)).await.unwrap();
    assert!(ack.ok);
    assert_eq!(ack.message.as_deref(), Some("Already processed"));

    // Still exactly one audit txn, still paid
    let txns = app.ctx.booking_repo.list_txns(booking.id).await.unwrap();
    assert_eq!(txns.len(), 1);
    let reloaded = app
        .ctx
        .booking_service
        .get_booking(&guest, booking.id)
        .await
        .unwrap();
    assert_eq!(reloaded.status, BookingStatus::Paid);
}

#[tokio::test]
async fn success_webhook_after_cancellation_records_a_receipt() {
    let app = spawn_at(instant(2025, 3, 1, 2, 0)).await;
    let guest = create_user(&app, UserRole::Guest, false).await;
    let host = create_user(&app, UserRole::Host, true).await;
    let listing = create_listing(&app, &host).await;

    let booking =
        create_booking(&app, &guest, &listing, date(2025, 3, 20), date(2025, 3, 22)).await;
    app.ctx
        .booking_service
        .host_accept(&host, booking.id, Some(60))
        .await
        .unwrap();
    let initiation = app
        .ctx
        .booking_service
        .initiate_payment(&guest, booking.id, "payos".to_string(), "qr".to_string())
        .await
        .unwrap();

    // Guest cancels while the transfer is in flight at the bank
    app.ctx
        .booking_service
        .cancel(&guest, booking.id, no_bank_cancel("changed my mind"))
        .await
        .unwrap();

    let body = success_webhook(&initiation.order_code);
    let sig = sign_body(&body);
    let ack = app.ctx.reconciler.process(&body, Some(&sig)).await.unwrap();
    assert!(ack.ok);
    assert_eq!(
        ack.message.as_deref(),
        Some("Recorded for manual reconciliation")
    );

    // The cancellation stands; the money is on record for ops
    let reloaded = app
        .ctx
        .booking_service
        .get_booking(&guest, booking.id)
        .await
        .unwrap();
    assert_eq!(reloaded.status, BookingStatus::CancelledByGuest);
    assert_ne!(reloaded.payment.status, PaymentStatus::Succeeded);

    let txns = app.ctx.booking_repo.list_txns(booking.id).await.unwrap();
    assert_eq!(txns.len(), 1);
    assert_eq!(txns[0].status, "unreconciled");
    assert_eq!(txns[0].amount, 1_207_500);
}

#[tokio::test]
async fn webhook_rejects_missing_or_bad_signature() {
    let app = spawn_at(instant(2025, 3, 1, 2, 0)).await;
    let body = success_webhook("1234567890");

    let err = app.ctx.reconciler.process(&body, None).await.unwrap_err();
    assert!(matches!(err, AppError::WebhookSignature));

    let err = app
        .ctx
        .reconciler
        .process(&body, Some("deadbeef"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::WebhookSignature));

    // Valid signature over different bytes fails too
    let sig = sign_body(&failure_webhook("1234567890"));
    let err = app
        .ctx
        .reconciler
        .process(&body, Some(&sig))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::WebhookSignature));
}

#[tokio::test]
async fn failure_webhook_keeps_booking_retryable() {
    let app = spawn_at(instant(2025, 3, 1, 2, 0)).await;
    let guest = create_user(&app, UserRole::Guest, false).await;
    let host = create_user(&app, UserRole::Host, true).await;
    let listing = create_listing(&app, &host).await;

    let booking =
        create_booking(&app, &guest, &listing, date(2025, 3, 20), date(2025, 3, 22)).await;
    app.ctx
        .booking_service
        .host_accept(&host, booking.id, Some(60))
        .await
        .unwrap();
    let initiation = app
        .ctx
        .booking_service
        .initiate_payment(&guest, booking.id, "payos".to_string(), "qr".to_string())
        .await
        .unwrap();

    let body = failure_webhook(&initiation.order_code);
    let sig = sign_body(&body);
    let ack = app.ctx.reconciler.process(&body, Some(&sig)).await.unwrap();
    assert!(ack.ok);

    let reloaded = app
        .ctx
        .booking_service
        .get_booking(&guest, booking.id)
        .await
        .unwrap();
    assert_eq!(reloaded.status, BookingStatus::AwaitingPayment);
    assert_eq!(reloaded.payment.status, PaymentStatus::Failed);
    assert!(reloaded.payment.paid_at.is_none());

    // A fresh attempt within the window still works
    app.clock.advance(Duration::minutes(1));
    let retry = app
        .ctx
        .booking_service
        .initiate_payment(&guest, booking.id, "payos".to_string(), "qr".to_string())
        .await
        .unwrap();
    assert_ne!(retry.order_code, initiation.order_code);

    let body = success_webhook(&retry.order_code);
    let sig = sign_body(&body);
    app.ctx.reconciler.process(&body, Some(&sig)).await.unwrap();
    let paid = app
        .ctx
        .booking_service
        .get_booking(&guest, booking.id)
        .await
        .unwrap();
    assert_eq!(paid.status, BookingStatus::Paid);
}

#[tokio::test]
async fn blocking_booking_rejects_overlapping_requests() {
    let app = spawn_at(instant(2025, 3, 1, 2, 0)).await;
    let guest_a = create_user(&app, UserRole::Guest, false).await;
    let guest_b = create_user(&app, UserRole::Guest, false).await;
    let host = create_user(&app, UserRole::Host, true).await;
    let listing = create_listing(&app, &host).await;

    let first =
        create_booking(&app, &guest_a, &listing, date(2025, 3, 20), date(2025, 3, 22)).await;
    app.ctx
        .booking_service
        .host_accept(&host, first.id, Some(60))
        .await
        .unwrap();

    // Identical window
    let err = app
        .ctx
        .booking_service
        .create_booking(
            &guest_b,
            CreateBookingInput {
                listing_id: listing.id,
                checkin_date: date(2025, 3, 20),
                checkout_date: date(2025, 3, 22),
                guest_count: 2,
                promo_code: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Partial overlap
    let err = app
        .ctx
        .booking_service
        .create_booking(
            &guest_b,
            CreateBookingInput {
                listing_id: listing.id,
                checkin_date: date(2025, 3, 21),
                checkout_date: date(2025, 3, 23),
                guest_count: 2,
                promo_code: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Back-to-back is fine: [20,22) then [22,24)
    let adjacent =
        create_booking(&app, &guest_b, &listing, date(2025, 3, 22), date(2025, 3, 24)).await;
    assert_eq!(adjacent.status, BookingStatus::Requested);
}

#[tokio::test]
async fn accepting_second_identical_window_hits_unique_index() {
    let app = spawn_at(instant(2025, 3, 1, 2, 0)).await;
    let guest_a = create_user(&app, UserRole::Guest, false).await;
    let guest_b = create_user(&app, UserRole::Guest, false).await;
    let host = create_user(&app, UserRole::Host, true).await;
    let listing = create_listing(&app, &host).await;

    // Both requests exist before either is accepted; `requested` does not
    // block, so this is legal.
    let first =
        create_booking(&app, &guest_a, &listing, date(2025, 3, 20), date(2025, 3, 22)).await;
    let second =
        create_booking(&app, &guest_b, &listing, date(2025, 3, 20), date(2025, 3, 22)).await;

    app.ctx
        .booking_service
        .host_accept(&host, first.id, Some(60))
        .await
        .unwrap();

    // Accepting the second would put an identical window into the blocking
    // set; the index refuses.
    let err = app
        .ctx
        .booking_service
        .host_accept(&host, second.id, Some(60))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn payment_window_expiry_is_resolved_on_pay() {
    let app = spawn_at(instant(2025, 3, 1, 2, 0)).await;
    let guest = create_user(&app, UserRole::Guest, false).await;
    let host = create_user(&app, UserRole::Host, true).await;
    let listing = create_listing(&app, &host).await;

    let booking =
        create_booking(&app, &guest, &listing, date(2025, 3, 20), date(2025, 3, 22)).await;
    app.ctx
        .booking_service
        .host_accept(&host, booking.id, Some(30))
        .await
        .unwrap();

    app.clock.advance(Duration::minutes(31));
    let err = app
        .ctx
        .booking_service
        .initiate_payment(&guest, booking.id, "payos".to_string(), "qr".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(ref msg) if msg == "Booking expired"));

    let reloaded = app
        .ctx
        .booking_service
        .get_booking(&guest, booking.id)
        .await
        .unwrap();
    assert_eq!(reloaded.status, BookingStatus::Expired);

    // The freed window is bookable again
    let retry =
        create_booking(&app, &guest, &listing, date(2025, 3, 20), date(2025, 3, 22)).await;
    assert_eq!(retry.status, BookingStatus::Requested);
}

#[tokio::test]
async fn list_sweep_applies_time_based_transitions() {
    let app = spawn_at(instant(2025, 3, 1, 2, 0)).await;
    let guest = create_user(&app, UserRole::Guest, false).await;
    let host = create_user(&app, UserRole::Host, true).await;
    let listing = create_listing(&app, &host).await;
    let listing_b = create_listing(&app, &host).await;

    // Never-answered request
    let stale =
        create_booking(&app, &guest, &listing, date(2025, 3, 5), date(2025, 3, 7)).await;
    // Paid stay that will finish
    let finished =
        create_booking(&app, &guest, &listing_b, date(2025, 3, 3), date(2025, 3, 4)).await;
    pay_booking(&app, &guest, &host, finished.id).await;
    // Request whose check-in is today: the host can still answer it
    let pending =
        create_booking(&app, &guest, &listing, date(2025, 3, 10), date(2025, 3, 12)).await;

    // Well past both checkout and the stale request's check-in; local today
    // is 2025-03-10
    app.clock.set(instant(2025, 3, 10, 2, 0));
    let page = app
        .ctx
        .booking_service
        .list_mine_guest(&guest, None, 20, 0)
        .await
        .unwrap();
    assert_eq!(page.total, 3);

    let by_id = |id| page.items.iter().find(|b| b.id == id).unwrap();
    assert_eq!(by_id(stale.id).status, BookingStatus::HostRejected);
    let done = by_id(finished.id);
    assert_eq!(done.status, BookingStatus::Completed);
    assert!(done.completed_at.is_some());
    // Check-in day itself is not "passed"
    assert_eq!(by_id(pending.id).status, BookingStatus::Requested);
}

#[tokio::test]
async fn unpaid_cancellation_zeroes_settlement_fields() {
    let app = spawn_at(instant(2025, 3, 1, 2, 0)).await;
    let guest = create_user(&app, UserRole::Guest, false).await;
    let host = create_user(&app, UserRole::Host, true).await;
    let listing = create_listing(&app, &host).await;

    let booking =
        create_booking(&app, &guest, &listing, date(2025, 3, 20), date(2025, 3, 22)).await;
    let cancelled = app
        .ctx
        .booking_service
        .cancel(&guest, booking.id, no_bank_cancel("change of plans"))
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::CancelledByGuest);
    assert_eq!(cancelled.pricing.platform_fee, 0);
    assert_eq!(cancelled.pricing.host_payout, 0);
    assert!(cancelled.refund.is_none());
    assert_eq!(cancelled.cancel_reason.as_deref(), Some("change of plans"));

    // Cancelling again is a no-op success
    let again = app
        .ctx
        .booking_service
        .cancel(&guest, booking.id, no_bank_cancel("still cancelled"))
        .await
        .unwrap();
    assert_eq!(again.status, BookingStatus::CancelledByGuest);
}

#[tokio::test]
async fn paid_cancellation_one_day_out_recomputes_settlement() {
    let app = spawn_at(instant(2025, 3, 1, 2, 0)).await;
    let guest = create_user(&app, UserRole::Guest, false).await;
    let host = create_user(&app, UserRole::Host, true).await;
    let listing = create_listing(&app, &host).await;

    let booking =
        create_booking(&app, &guest, &listing, date(2025, 3, 20), date(2025, 3, 22)).await;
    pay_booking(&app, &guest, &host, booking.id).await;

    // Bank details are mandatory for a refund
    let err = app
        .ctx
        .booking_service
        .cancel(&guest, booking.id, no_bank_cancel("no bank"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Check-in anchors at 2025-03-20 14:00 +07:00 == 07:00 UTC; 20 hours
    // out lands in the 1-day tier (30% refund).
    app.clock.set(instant(2025, 3, 19, 11, 0));
    let cancelled = app
        .ctx
        .booking_service
        .cancel(&guest, booking.id, bank_cancel("emergency"))
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::RefundPending);

    let refund = cancelled.refund.clone().unwrap();
    let expected_refund = round_pct(1_207_500, 30.0);
    assert_eq!(refund.pct, 30);
    assert_eq!(refund.amount, expected_refund);
    assert_eq!(refund.status, RefundStatus::Pending);
    assert_eq!(refund.bank.bank_name, "Vietcombank");

    // Retained amount is re-split between platform and host
    let retained = 1_207_500 - expected_refund;
    assert_eq!(cancelled.pricing.platform_fee, round_pct(retained, 5.0));
    assert_eq!(
        cancelled.pricing.host_payout,
        retained - cancelled.pricing.platform_fee
    );
    // The rest of the snapshot stays frozen
    assert_eq!(cancelled.pricing.total, 1_207_500);
    assert_eq!(cancelled.pricing.subtotal, 1_150_000);
}

#[tokio::test]
async fn refund_confirmation_completes_the_cycle() {
    let app = spawn_at(instant(2025, 3, 1, 2, 0)).await;
    let guest = create_user(&app, UserRole::Guest, false).await;
    let host = create_user(&app, UserRole::Host, true).await;
    let admin = create_user(&app, UserRole::Admin, false).await;
    let listing = create_listing(&app, &host).await;

    let booking =
        create_booking(&app, &guest, &listing, date(2025, 3, 20), date(2025, 3, 22)).await;
    pay_booking(&app, &guest, &host, booking.id).await;
    app.clock.set(instant(2025, 3, 14, 2, 0));
    app.ctx
        .booking_service
        .cancel(&guest, booking.id, bank_cancel("trip cancelled"))
        .await
        .unwrap();

    let refunded = app
        .ctx
        .booking_service
        .confirm_refund(booking.id)
        .await
        .unwrap();
    assert_eq!(refunded.status, BookingStatus::Refunded);
    assert_eq!(refunded.payment.status, PaymentStatus::Refunded);
    assert_eq!(refunded.refund.unwrap().status, RefundStatus::Completed);

    // Confirming again is a no-op success
    let again = app
        .ctx
        .booking_service
        .confirm_refund(booking.id)
        .await
        .unwrap();
    assert_eq!(again.status, BookingStatus::Refunded);

    // Six days out: 100% refund, nothing retained
    assert_eq!(again.pricing.platform_fee, 0);
    assert_eq!(again.pricing.host_payout, 0);

    // Admin can read the booking without being a participant
    let seen = app
        .ctx
        .booking_service
        .get_booking(&admin, booking.id)
        .await
        .unwrap();
    assert_eq!(seen.id, booking.id);
}

#[tokio::test]
async fn bookings_are_participant_gated() {
    let app = spawn_at(instant(2025, 3, 1, 2, 0)).await;
    let guest = create_user(&app, UserRole::Guest, false).await;
    let outsider = create_user(&app, UserRole::Guest, false).await;
    let host = create_user(&app, UserRole::Host, true).await;
    let listing = create_listing(&app, &host).await;

    let booking =
        create_booking(&app, &guest, &listing, date(2025, 3, 20), date(2025, 3, 22)).await;

    let err = app
        .ctx
        .booking_service
        .get_booking(&outsider, booking.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    // Host is a participant
    let seen = app
        .ctx
        .booking_service
        .get_booking(&host, booking.id)
        .await
        .unwrap();
    assert_eq!(seen.id, booking.id);

    // Lookup by order code obeys the same gate
    let paid = pay_booking(&app, &guest, &host, booking.id).await;
    let order_code = paid.order_code.unwrap();
    let err = app
        .ctx
        .booking_service
        .get_by_order_code(&outsider, &order_code)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
}
