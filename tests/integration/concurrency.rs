//! Snapshot atomicity under concurrent readers and writers

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use rdap_bootstrap::bootstrap::{Family, RedirectQuery};

use super::{raw, Harness};

const OLD: &[&str] = &["http://old.example/"];
const NEW: &[&str] = &["http://new.example/"];

#[test]
fn test_readers_never_see_mixed_snapshot() {
    let h = Arc::new(Harness::new());
    let s1 = raw(Family::Ipv4, &[("10.0.0.0/8", OLD), ("192.0.2.0/24", OLD)]);
    let s2 = raw(Family::Ipv4, &[("10.1.0.0/16", NEW), ("192.0.2.0/24", NEW)]);
    h.sync.sync_family(Family::Ipv4, &s1).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let h = Arc::clone(&h);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let query = RedirectQuery::ip("10.1.2.3", None);
                let mut seen = 0u64;
                while !done.load(Ordering::Relaxed) {
                    let target = h.resolver.resolve(&query).expect("always delegated");
                    let pair = (target.matched_key.to_string(), target.url.to_string());
                    assert!(
                        pair == ("10.0.0.0/8".into(), OLD[0].into())
                            || pair == ("10.1.0.0/16".into(), NEW[0].into()),
                        "torn read: {pair:?}"
                    );
                    seen += 1;
                }
                seen
            })
        })
        .collect();

    for i in 0..200 {
        let batch = if i % 2 == 0 { &s2 } else { &s1 };
        h.sync.sync_family(Family::Ipv4, batch).unwrap();
    }
    done.store(true, Ordering::Relaxed);

    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }
    assert_eq!(h.registry.snapshot_info(Family::Ipv4).version, 201);
}

#[test]
fn test_concurrent_writers_serialize_per_family() {
    let h = Arc::new(Harness::new());

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let h = Arc::clone(&h);
            thread::spawn(move || {
                let url = format!("http://writer{w}.example/");
                let batch = raw(Family::Domain, &[("com", &[url.as_str()])]);
                for _ in 0..25 {
                    h.sync.sync_family(Family::Domain, &batch).unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let info = h.registry.snapshot_info(Family::Domain);
    assert_eq!(info.version, 100);
    assert_eq!(info.records, 1);
}

#[test]
fn test_families_replace_independently_under_load() {
    let h = Arc::new(Harness::new());
    h.sync(Family::Asn, &[("1-1000", OLD)]);

    let writer = {
        let h = Arc::clone(&h);
        thread::spawn(move || {
            for i in 0..100u32 {
                let key = format!("{}.0.0.0/8", i % 200 + 1);
                h.sync.sync_family(Family::Ipv4, &raw(Family::Ipv4, &[(key.as_str(), NEW)])).unwrap();
            }
        })
    };

    // The ASN family is untouched by the IPv4 writer
    for _ in 0..1000 {
        let target = h.resolver.resolve(&RedirectQuery::autnum("500")).unwrap();
        assert_eq!(target.url.as_str(), OLD[0]);
    }
    writer.join().unwrap();

    assert_eq!(h.registry.snapshot_info(Family::Asn).version, 1);
    assert_eq!(h.registry.snapshot_info(Family::Ipv4).version, 100);
}
