//! Integration tests for verification tokens: single-winner consumption,
//! cleanup and per-type stats.

mod common;

use chrono::{Duration, Utc};
use common::{exec, test_db};
use stockyard::entity::NewEmailVerification;
use stockyard::repo::TokenRepo;
use stockyard::StoreError;
use uuid::Uuid;

fn setup_schema(db: &stockyard::ClientExecutor) {
    exec(
        db,
        "CREATE TABLE IF NOT EXISTS email_verifications ( \
           id UUID PRIMARY KEY, \
           user_id UUID NOT NULL, \
           email TEXT NOT NULL, \
           token TEXT NOT NULL UNIQUE, \
           token_type TEXT NOT NULL, \
           expires_at TIMESTAMPTZ NOT NULL, \
           is_used BOOLEAN NOT NULL DEFAULT false, \
           used_at TIMESTAMPTZ, \
           created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(), \
           updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW() \
         )",
    );
    exec(db, "DELETE FROM email_verifications");
}

fn new_token(user_id: Uuid, token_type: &str, ttl: Duration) -> NewEmailVerification {
    NewEmailVerification {
        id: Uuid::new_v4(),
        user_id,
        email: "user@example.com".to_string(),
        token: Uuid::new_v4().simple().to_string(),
        token_type: token_type.to_string(),
        expires_at: Utc::now() + ttl,
    }
}

#[test]
fn test_mark_used_is_single_winner() {
    let Some(db) = test_db() else { return };
    setup_schema(&db);

    let user = Uuid::new_v4();
    let tok = TokenRepo::create(&db, &new_token(user, "EMAIL_VERIFICATION", Duration::hours(1)))
        .unwrap();
    assert!(!tok.is_used);

    TokenRepo::mark_used(&db, tok.id).unwrap();
    let err = TokenRepo::mark_used(&db, tok.id).unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    let fetched = TokenRepo::get_by_token(&db, &tok.token).unwrap();
    assert!(fetched.is_used);
    assert!(fetched.used_at.is_some());
}

#[test]
fn test_mark_used_consumes_expired_tokens() {
    let Some(db) = test_db() else { return };
    setup_schema(&db);

    // Consumption only guards against double use; an expired token can
    // still be flipped to used (a host may accept it under a grace rule).
    let user = Uuid::new_v4();
    let stale = TokenRepo::create(&db, &new_token(user, "EMAIL_VERIFICATION", Duration::hours(-1)))
        .unwrap();
    TokenRepo::mark_used(&db, stale.id).unwrap();

    let fetched = TokenRepo::get_by_token(&db, &stale.token).unwrap();
    assert!(fetched.is_used);
    assert!(fetched.used_at.is_some());

    // The second consumption still loses.
    assert!(matches!(
        TokenRepo::mark_used(&db, stale.id),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn test_active_verification_skips_used_and_expired() {
    let Some(db) = test_db() else { return };
    setup_schema(&db);

    let user = Uuid::new_v4();
    // Expired token never matches.
    TokenRepo::create(&db, &new_token(user, "PASSWORD_RESET", Duration::hours(-1))).unwrap();
    assert!(TokenRepo::get_active_verification(&db, user, "PASSWORD_RESET")
        .unwrap()
        .is_none());

    let live = TokenRepo::create(&db, &new_token(user, "PASSWORD_RESET", Duration::hours(1)))
        .unwrap();
    let found = TokenRepo::get_active_verification(&db, user, "PASSWORD_RESET")
        .unwrap()
        .unwrap();
    assert_eq!(found.id, live.id);

    // Type is part of the key.
    assert!(TokenRepo::get_active_verification(&db, user, "EMAIL_VERIFICATION")
        .unwrap()
        .is_none());

    TokenRepo::mark_used(&db, live.id).unwrap();
    assert!(TokenRepo::get_active_verification(&db, user, "PASSWORD_RESET")
        .unwrap()
        .is_none());
}

#[test]
fn test_cleanup_and_stats() {
    let Some(db) = test_db() else { return };
    setup_schema(&db);

    let user = Uuid::new_v4();
    TokenRepo::create(&db, &new_token(user, "EMAIL_VERIFICATION", Duration::hours(1))).unwrap();
    let used = TokenRepo::create(&db, &new_token(user, "EMAIL_VERIFICATION", Duration::hours(1)))
        .unwrap();
    TokenRepo::mark_used(&db, used.id).unwrap();
    TokenRepo::create(&db, &new_token(user, "PASSWORD_RESET", Duration::hours(-2))).unwrap();

    let stats = TokenRepo::verification_stats(&db).unwrap();
    let email = &stats["EMAIL_VERIFICATION"];
    assert_eq!(email.total, 2);
    assert_eq!(email.used, 1);
    assert_eq!(email.active, 1);
    assert_eq!(email.expired, 0);
    let reset = &stats["PASSWORD_RESET"];
    assert_eq!(reset.total, 1);
    assert_eq!(reset.expired, 1);

    // Only tokens expired by more than the grace period go away.
    let purged = TokenRepo::cleanup_expired(&db, Duration::hours(1)).unwrap();
    assert_eq!(purged, 1);
    let stats = TokenRepo::verification_stats(&db).unwrap();
    assert!(!stats.contains_key("PASSWORD_RESET"));
}
