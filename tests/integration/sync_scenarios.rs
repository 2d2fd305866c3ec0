//! Sync-then-resolve scenarios
//!
//! Every scenario goes through the public surface only: raw batches into the
//! sync coordinator, typed queries into the resolver.

use rdap_bootstrap::bootstrap::{Family, RedirectQuery};
use rdap_bootstrap::error::{RecordError, SyncError};

use super::{raw, Harness};

const CNNIC: &[&str] = &["http://cnnic.cn/rdap"];
const NEW: &[&str] = &["http://new1", "http://new2"];

fn url_of(harness: &Harness, query: &RedirectQuery) -> Option<String> {
    harness.resolver.resolve(query).map(|t| t.url.to_string())
}

// ============================================================================
// IPv4
// ============================================================================

#[test]
fn test_ipv4_default_then_specific_sync() {
    let h = Harness::new();
    h.sync(Family::Ipv4, &[("1.0.0.0/0", CNNIC)]);

    assert_eq!(
        url_of(&h, &RedirectQuery::ip("1.0.0.0", Some(0))).as_deref(),
        Some("http://cnnic.cn/rdap")
    );

    // Whole-family replace: the /0 is not part of the new batch
    h.sync(Family::Ipv4, &[("1.0.0.0/24", NEW)]);

    assert_eq!(
        url_of(&h, &RedirectQuery::ip("1.0.0.0/24", None)).as_deref(),
        Some("http://new1")
    );
    assert_eq!(url_of(&h, &RedirectQuery::ip("2.0.0.0", None)), None);
    assert_eq!(h.registry.snapshot_info(Family::Ipv4).records, 1);
}

#[test]
fn test_ipv4_default_kept_when_resynced() {
    let h = Harness::new();
    h.sync(Family::Ipv4, &[("1.0.0.0/0", CNNIC), ("1.0.0.0/24", NEW)]);

    assert_eq!(
        url_of(&h, &RedirectQuery::ip("1.0.0.0/24", None)).as_deref(),
        Some("http://new1")
    );
    assert_eq!(
        url_of(&h, &RedirectQuery::ip("2.0.0.0", None)).as_deref(),
        Some("http://cnnic.cn/rdap")
    );
}

#[test]
fn test_ipv4_round_trip_exact_key() {
    let h = Harness::new();
    let entries: &[(&str, &[&str])] = &[
        ("1.0.0.0/24", NEW),
        ("1.0.1.0/24", &["REDIRECT_URL_1_UPDATED_1"]),
        ("0.0.0.0/0", CNNIC),
    ];
    h.sync(Family::Ipv4, entries);

    for (key, urls) in entries {
        let target = h
            .resolver
            .resolve(&RedirectQuery::ip(*key, None))
            .expect("own key must resolve");
        assert_eq!(target.matched_key.to_string(), *key);
        assert_eq!(target.url, urls[0], "{key}");
        assert_eq!(&*target.mirrors, *urls);
    }
}

#[test]
fn test_ipv4_narrower_record_wins() {
    let h = Harness::new();
    h.sync(
        Family::Ipv4,
        &[("10.0.0.0/8", &["http://broad"]), ("10.20.30.0/24", &["http://narrow"])],
    );

    let target = h.resolver.resolve(&RedirectQuery::ip("10.20.30.40", None)).unwrap();
    assert_eq!(target.matched_key.to_string(), "10.20.30.0/24");

    let target = h.resolver.resolve(&RedirectQuery::ip("10.20.31.40", None)).unwrap();
    assert_eq!(target.matched_key.to_string(), "10.0.0.0/8");

    // A /16 query is not covered by the /24 record
    let target = h.resolver.resolve(&RedirectQuery::ip("10.20.0.0", Some(16))).unwrap();
    assert_eq!(target.matched_key.to_string(), "10.0.0.0/8");
}

// ============================================================================
// IPv6
// ============================================================================

#[test]
fn test_ipv6_default_then_specific_sync() {
    let h = Harness::new();
    h.sync(Family::Ipv6, &[("::/0", CNNIC)]);

    assert_eq!(
        url_of(&h, &RedirectQuery::ip("0:0:0:0:2001:6a8:0:1", None)).as_deref(),
        Some("http://cnnic.cn/rdap")
    );

    h.sync(Family::Ipv6, &[("0:0:0:0:2001:6a8::/32", NEW)]);

    assert_eq!(
        url_of(&h, &RedirectQuery::ip("0:0:0:0:2001:6a8::/32", None)).as_deref(),
        Some("http://new1")
    );
    assert_eq!(
        url_of(&h, &RedirectQuery::ip("0:0:0:0:2001:6a8:0:1", None)).as_deref(),
        Some("http://new1")
    );
    assert_eq!(url_of(&h, &RedirectQuery::ip("2001:db8::1", None)), None);
}

#[test]
fn test_ipv6_longest_prefix() {
    let h = Harness::new();
    h.sync(
        Family::Ipv6,
        &[
            ("2001:200::/23", &["https://rdap.apnic.net/"]),
            ("2001:400::/23", &["https://rdap.arin.net/registry/"]),
            ("2001:400:1::/48", &["https://special.example/"]),
        ],
    );

    let target = h.resolver.resolve(&RedirectQuery::ip("2001:400:1::9", None)).unwrap();
    assert_eq!(target.url.as_str(), "https://special.example/");
    let target = h.resolver.resolve(&RedirectQuery::ip("2001:401::9", None)).unwrap();
    assert_eq!(target.url.as_str(), "https://rdap.arin.net/registry/");
}

// ============================================================================
// Domain, ASN, Entity
// ============================================================================

#[test]
fn test_domain_scenario() {
    let h = Harness::new();
    h.sync(
        Family::Domain,
        &[("cn", CNNIC), ("com.cn", &["https://rdap.com-cn.example/"])],
    );

    assert_eq!(
        url_of(&h, &RedirectQuery::domain("WWW.Baidu.CN.")).as_deref(),
        Some("http://cnnic.cn/rdap")
    );
    assert_eq!(
        url_of(&h, &RedirectQuery::domain("shop.com.cn")).as_deref(),
        Some("https://rdap.com-cn.example/")
    );
    assert_eq!(url_of(&h, &RedirectQuery::domain("example.org")), None);
}

#[test]
fn test_asn_scenario() {
    let h = Harness::new();
    h.sync(
        Family::Asn,
        &[
            ("1-1876", &["https://rdap.arin.net/registry/"]),
            ("1877-1901", &["https://rdap.db.ripe.net/"]),
            ("4608-4865", &["https://rdap.apnic.net/"]),
        ],
    );

    assert_eq!(
        url_of(&h, &RedirectQuery::autnum("AS1877")).as_deref(),
        Some("https://rdap.db.ripe.net/")
    );
    assert_eq!(
        url_of(&h, &RedirectQuery::autnum("4700-4710")).as_deref(),
        Some("https://rdap.apnic.net/")
    );
    assert_eq!(url_of(&h, &RedirectQuery::autnum("2000")), None);
}

#[test]
fn test_entity_scenario() {
    let h = Harness::new();
    h.sync(
        Family::Entity,
        &[
            ("ARIN", &["https://rdap.arin.net/registry/"]),
            ("AP", &["https://rdap.apnic.net/"]),
        ],
    );

    assert_eq!(
        url_of(&h, &RedirectQuery::entity("IRT-APNIC-AP")).as_deref(),
        Some("https://rdap.apnic.net/")
    );
    assert_eq!(
        url_of(&h, &RedirectQuery::entity("abc123-arin")).as_deref(),
        Some("https://rdap.arin.net/registry/")
    );
    assert_eq!(url_of(&h, &RedirectQuery::entity("MAP")), None);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_invalid_query_is_no_redirect() {
    let h = Harness::new();
    h.sync(Family::Ipv4, &[("0.0.0.0/0", CNNIC)]);
    h.sync(Family::Ipv6, &[("::/0", CNNIC)]);

    assert_eq!(url_of(&h, &RedirectQuery::ip("", None)), None);
    assert_eq!(url_of(&h, &RedirectQuery::ip("300.1.1.1", None)), None);
    assert_eq!(url_of(&h, &RedirectQuery::ip("::1", Some(200))), None);
    assert_eq!(url_of(&h, &RedirectQuery::domain("a..b")), None);
}

#[test]
fn test_duplicate_batch_rejected_wholesale() {
    let h = Harness::new();
    h.sync(Family::Ipv4, &[("1.0.0.0/0", CNNIC)]);

    let err = h
        .sync
        .sync_family(
            Family::Ipv4,
            &raw(
                Family::Ipv4,
                &[("1.0.0.0/24", NEW), ("8.0.0.0/8", CNNIC), ("1.0.0.0/24", CNNIC)],
            ),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        SyncError::Rejected {
            family: Family::Ipv4,
            source: RecordError::DuplicateKey { .. },
        }
    ));

    // Prior snapshot fully in effect, nothing from the rejected batch leaked
    assert_eq!(
        url_of(&h, &RedirectQuery::ip("1.0.0.0/24", None)).as_deref(),
        Some("http://cnnic.cn/rdap")
    );
    assert_eq!(h.registry.snapshot_info(Family::Ipv4).version, 1);
    assert_eq!(h.registry.records(Family::Ipv4).len(), 1);
}

#[test]
fn test_empty_targets_rejected() {
    let h = Harness::new();
    let err = h
        .sync
        .sync_family(Family::Domain, &raw(Family::Domain, &[("com", &[])]))
        .unwrap_err();
    assert!(matches!(
        err,
        SyncError::Rejected {
            source: RecordError::EmptyTargets { .. },
            ..
        }
    ));
}

#[test]
fn test_location_for_each_family() {
    let h = Harness::new();
    h.sync(Family::Ipv4, &[("0.0.0.0/0", &["https://rdap.example/v4/"])]);
    h.sync(Family::Domain, &[("cn", CNNIC)]);
    h.sync(Family::Asn, &[("1-100", &["https://rdap.example"])]);
    h.sync(Family::Entity, &[("ARIN", &["https://rdap.arin.net/registry/"])]);

    let cases = [
        (RedirectQuery::ip("192.0.2.1", None), "https://rdap.example/v4/ip/192.0.2.1"),
        (RedirectQuery::domain("baidu.cn"), "http://cnnic.cn/rdap/domain/baidu.cn"),
        (RedirectQuery::autnum("AS42"), "https://rdap.example/autnum/42"),
        (RedirectQuery::entity("X-ARIN"), "https://rdap.arin.net/registry/entity/X-ARIN"),
    ];
    for (query, expected) in cases {
        let location = h.resolver.redirect_location(&query).expect("delegated");
        assert_eq!(location.as_str(), expected, "{query}");
    }
}

#[test]
fn test_opaque_target_kept_verbatim() {
    let h = Harness::new();
    h.sync(Family::Domain, &[("cn", &["REDIRECT_URL_1_UPDATED_1"])]);

    let query = RedirectQuery::domain("baidu.cn");
    let target = h.resolver.resolve(&query).expect("delegated");
    assert_eq!(target.url, "REDIRECT_URL_1_UPDATED_1");
    // Not an absolute URL, so there is nothing to redirect to
    assert!(h.resolver.redirect_location(&query).is_none());
}

#[test]
fn test_record_with_host_bits_is_masked() {
    let h = Harness::new();
    h.sync(Family::Ipv4, &[("1.0.0.9/24", NEW)]);

    let keys: Vec<String> = h
        .registry
        .records(Family::Ipv4)
        .iter()
        .map(|r| r.key().to_string())
        .collect();
    assert_eq!(keys, ["1.0.0.0/24"]);

    let target = h.resolver.resolve(&RedirectQuery::ip("1.0.0.7", None)).unwrap();
    assert_eq!(target.matched_key.to_string(), "1.0.0.0/24");
    assert_eq!(target.url, "http://new1");
}
