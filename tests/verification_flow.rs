//! End-to-end exercises of the public API: issuing and redeeming simple
//! codes, config-driven TOTP verification, and fuzzy search over typical
//! record shapes.

use keymatch::config::OtpConfig;
use keymatch::error::KeymatchError;
use keymatch::fuzzy::{fuzzy_score, fuzzy_search, fuzzy_search_by, FuzzyOptions};
use keymatch::otp;
use keymatch::store::OtpStore;
use serde_json::json;

#[test]
fn test_simple_code_sign_in_flow() {
    let store = OtpStore::new();

    // Server issues a code for an approved user
    let otp = store.issue("user-42").unwrap();
    assert_eq!(otp.code.len(), 6);

    // Client submits it with stray whitespace; it redeems once
    let submitted = format!("  {}  ", otp.code);
    assert_eq!(store.redeem(&submitted).unwrap(), "user-42");
    assert!(matches!(
        store.redeem(&otp.code),
        Err(KeymatchError::CodeNotFound)
    ));
}

#[test]
fn test_totp_flow_with_derived_secret() {
    let config = OtpConfig {
        server_secret: "integration-secret".to_string(),
        ..OtpConfig::default()
    };

    // The per-user secret never needs storage: derive, generate, validate
    let secret = config.user_secret("room-host");
    let code = otp::generate_totp(&secret, config.time_step).unwrap();
    assert!(otp::validate_totp(
        &code,
        &secret,
        config.time_step,
        config.drift_window
    ));

    // The convenience wrappers agree with the free functions
    assert!(config.validate_totp_for("room-host", &code));
}

#[test]
fn test_totp_drift_boundaries() {
    let pinned = 1_750_000_000u64;
    let code = otp::generate_totp_at("drift", 30, pinned).unwrap();

    assert!(otp::validate_totp_at(&code, "drift", 30, 1, pinned + 30));
    assert!(!otp::validate_totp_at(&code, "drift", 30, 1, pinned + 60));
    assert!(otp::validate_totp_at(&code, "drift", 30, 2, pinned + 60));
}

#[test]
fn test_search_box_over_records() {
    // The shape a client search box actually feeds in: JSON rows from an
    // API response, searched across a couple of fields
    let listings = vec![
        json!({"name": "Sunnyside Duplex", "description": "Two bedrooms near the park"}),
        json!({"name": "Riverview Flat", "description": "Studio with balcony"}),
        json!({"name": "Oak Street House", "description": "Family home, big yard"}),
    ];

    let opts = FuzzyOptions::with_fields(&["name", "description"]);

    // Typo'd query still finds the right row
    let hits = fuzzy_search(&listings, "rivervew", &opts);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["name"], "Riverview Flat");

    // Description text is searched too
    let hits = fuzzy_search(&listings, "balcony", &opts);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["name"], "Riverview Flat");

    // Blank query leaves the list untouched
    let hits = fuzzy_search(&listings, "", &opts);
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0]["name"], "Sunnyside Duplex");
}

#[test]
fn test_search_ranking_prefers_closer_matches() {
    let names = vec![
        "Mechanic Match".to_string(),
        "Match Day".to_string(),
        "Dispatcher".to_string(),
    ];
    let hits = fuzzy_search(&names, "match", &FuzzyOptions::default());

    // "Match Day" starts with the query, "Mechanic Match" merely contains it
    assert!(hits.len() >= 2);
    assert_eq!(hits[0], "Match Day");
    assert_eq!(hits[1], "Mechanic Match");
}

#[test]
fn test_search_by_accessor_on_domain_type() {
    struct Member {
        handle: String,
        karma: i64,
    }
    let members = vec![
        Member {
            handle: "night-owl".to_string(),
            karma: 12,
        },
        Member {
            handle: "early-bird".to_string(),
            karma: 7,
        },
    ];

    let hits = fuzzy_search_by(
        &members,
        "owl",
        |m| Some(m.handle.clone()),
        &FuzzyOptions::default(),
    );
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].karma, 12);
}

#[test]
fn test_score_contract_examples() {
    let opts = FuzzyOptions::default();
    assert_eq!(fuzzy_score("apple", "Apple", &opts), 1.0);
    assert_eq!(fuzzy_score("ap", "apple", &opts), 0.9);
    assert_eq!(fuzzy_score("", "apple", &opts), 1.0);
    assert_eq!(fuzzy_score("apple", "", &opts), 0.0);
    assert_eq!(fuzzy_score("elppa", "apple", &opts), 0.0);
}
