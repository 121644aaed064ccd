//! Adversarial Property-Based Tests for Configuration and Classification
//!
//! # Attack Plan
//!
//! 1. **Phone Number Bypass**: Unicode digits, zero-width chars, control
//!    characters, missing '+', over-long numbers.
//!
//! 2. **URL List Abuse**: Separators only, embedded whitespace, non-http
//!    schemes, very long lists.
//!
//! 3. **Boolean Flags**: Mixed case, garbage, empty strings.
//!
//! 4. **Marker Spoofing**: 403 bodies with near-miss markers, unicode
//!    look-alikes, very large bodies.
//!
//! # Invariants
//!
//! - from_getter never panics on any input
//! - validate() never panics (may return Err)
//! - validate() rejects any phone that is not '+' followed by 8-15 ASCII digits
//! - A parsed URL list never contains blank entries
//! - classify() alerts on 403 only with the exact marker

use proptest::prelude::*;
use std::collections::HashMap;

use sitecheck::checker::{classify, Verdict, MASKED_OUTAGE_MARKER};
use sitecheck::config::Config;

// ============================================================================
// ADVERSARIAL GENERATORS
// ============================================================================

fn dangerous_phone() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("5551234567".to_string()),
        Just("15551234567".to_string()),
        Just("".to_string()),
        Just("+".to_string()),
        Just("+123".to_string()),
        Just("+12345678901234567890".to_string()),
        Just("+٥٥٥١٢٣٤٥٦٧".to_string()), // Arabic-Indic
        Just("+５５５１２３４５６７".to_string()), // Fullwidth
        Just("+1555\x001234567".to_string()),
        Just("+1555\n1234567".to_string()),
        Just("+1555\u{200B}1234567".to_string()), // zero-width space
        Just("+1 (555) 123-4567".to_string()),
        Just("+15551234567; --".to_string()),
        Just("++15551234567".to_string()),
    ]
}

fn dangerous_url_list() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(",".to_string()),
        Just(",,, ,".to_string()),
        Just("javascript:alert(1)".to_string()),
        Just("file:///etc/passwd".to_string()),
        Just("https://a.example.com,ftp://b.example.com".to_string()),
        Just(" https://a.example.com\t, https://b.example.com\n".to_string()),
        Just("https://a.example.com/".repeat(500)),
        Just(vec!["https://x.example.com"; 1000].join(",")),
    ]
}

fn base_valid_config() -> HashMap<&'static str, String> {
    let mut m = HashMap::new();
    m.insert("TWILIO_ACCOUNT_SID", "AC0123456789abcdef0123456789abcdef".to_string());
    m.insert("TWILIO_AUTH_TOKEN", "token".to_string());
    m.insert("TWILIO_PHONE_NUMBER", "+15550001111".to_string());
    m.insert("YOUR_PHONE_NUMBER", "+15551234567".to_string());
    m
}

// ============================================================================
// INVARIANT: from_getter / validate NEVER PANIC
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_dangerous_phone_rejected_by_validate(phone in dangerous_phone()) {
        let mut env = base_valid_config();
        env.insert("YOUR_PHONE_NUMBER", phone.clone());
        let config = Config::from_getter(|key| env.get(key).cloned()).unwrap();
        let result = config.validate();
        prop_assert!(result.is_err(), "phone {:?} should be rejected", phone);
    }

    #[test]
    fn prop_url_list_never_blank(list in dangerous_url_list()) {
        let mut env = base_valid_config();
        env.insert("MONITOR_URLS", list);
        let config = Config::from_getter(|key| env.get(key).cloned()).unwrap();
        for url in &config.urls {
            prop_assert!(!url.trim().is_empty());
        }
        let _ = config.validate();
    }

    #[test]
    fn prop_from_getter_never_panics_with_arbitrary_values(
        sid in ".*",
        token in ".*",
        from in ".*",
        to in ".*",
        cert in ".*",
        path in ".*",
        flag in ".*",
    ) {
        let mut env = HashMap::new();
        env.insert("TWILIO_ACCOUNT_SID", sid);
        env.insert("TWILIO_AUTH_TOKEN", token);
        env.insert("TWILIO_PHONE_NUMBER", from);
        env.insert("YOUR_PHONE_NUMBER", to);
        env.insert("SSL_CERTIFICATE", cert);
        env.insert("SSL_CERT_PATH", path);
        env.insert("ALERT_ON_UNREACHABLE", flag);
        if let Ok(config) = Config::from_getter(|key| env.get(key).cloned()) {
            let _ = config.validate();
        }
    }

    #[test]
    fn prop_flag_garbage_is_an_error(flag in "[a-z]{2,10}") {
        prop_assume!(!["true", "false", "yes", "no", "on", "off"].contains(&flag.as_str()));
        let mut env = base_valid_config();
        env.insert("ALERT_ON_UNREACHABLE", flag);
        prop_assert!(Config::from_getter(|key| env.get(key).cloned()).is_err());
    }
}

// ============================================================================
// INVARIANT: 403 ALERTS ONLY ON THE EXACT MARKER
// ============================================================================

fn near_miss_marker() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("502 bad gateway".to_string()),
        Just("502 Bad  Gateway".to_string()),
        Just("502 Bad\nGateway".to_string()),
        Just("502\u{00A0}Bad Gateway".to_string()), // non-breaking space
        Just("５０２ Bad Gateway".to_string()), // fullwidth digits
        Just("502 Bad Gatewa".to_string()),
        Just("Bad Gateway 502".to_string()),
        Just("502 Bad Gate\u{200B}way".to_string()),
    ]
}

proptest! {
    #[test]
    fn prop_near_miss_marker_is_blocked(marker in near_miss_marker(), pad in ".{0,200}") {
        let body = format!("{}{}{}", pad, marker, pad);
        prop_assume!(!body.contains(MASKED_OUTAGE_MARKER));
        prop_assert_eq!(classify(403, &body), Verdict::Blocked);
    }

    #[test]
    fn prop_marker_anywhere_in_large_body(offset in 0usize..100_000) {
        let mut body = "x".repeat(100_000);
        body.insert_str(offset, MASKED_OUTAGE_MARKER);
        prop_assert_eq!(classify(403, &body), Verdict::MaskedOutage);
    }
}
