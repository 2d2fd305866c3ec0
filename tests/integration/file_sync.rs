//! Bootstrap files on disk, config-driven sync and the periodic task

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::broadcast;

use rdap_bootstrap::bootstrap::{
    spawn_periodic_sync, Family, RedirectQuery, RedirectRegistry, Resolver, SyncCoordinator,
    SyncOutcome,
};
use rdap_bootstrap::config::{load_config_str, BootstrapConfig};

const IPV4_JSON: &str = r#"{
  "description": "RDAP bootstrap file for IPv4 address allocations",
  "publication": "2024-05-01T00:00:00Z",
  "services": [
    [["1.0.0.0/8", "27.0.0.0/8"], ["https://rdap.apnic.net/", "http://rdap.apnic.net/"]],
    [["3.0.0.0/8"], ["https://rdap.arin.net/registry/", "http://rdap.arin.net/registry/"]]
  ],
  "version": "1.0"
}"#;

const DNS_JSON: &str = r#"{
  "description": "RDAP bootstrap file for Domain Name System registrations",
  "publication": "2024-05-01T00:00:00Z",
  "services": [
    [["cn"], ["http://cnnic.cn/rdap/"]],
    [["com", "net"], ["https://rdap.verisign.com/com/v1/"]]
  ],
  "version": "1.0"
}"#;

const OBJECT_TAGS_JSON: &str = r#"{
  "description": "RDAP bootstrap file for service provider object tags",
  "publication": "2024-05-01T00:00:00Z",
  "services": [
    [["contact@arin.net"], ["ARIN"], ["https://rdap.arin.net/registry/"]],
    [["helpdesk@apnic.net"], ["AP"], ["https://rdap.apnic.net/"]]
  ],
  "version": "1.0"
}"#;

fn bootstrap_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("ipv4.json"), IPV4_JSON).unwrap();
    fs::write(dir.path().join("dns.json"), DNS_JSON).unwrap();
    fs::write(dir.path().join("object-tags.json"), OBJECT_TAGS_JSON).unwrap();
    dir
}

fn config_for(dir: &TempDir) -> BootstrapConfig {
    BootstrapConfig {
        dir: dir.path().to_path_buf(),
        ..Default::default()
    }
}

#[test]
fn test_sync_all_from_directory() {
    let dir = bootstrap_dir();
    let registry = Arc::new(RedirectRegistry::new());
    let coordinator = SyncCoordinator::new(Arc::clone(&registry));

    let report = coordinator.sync_all(&config_for(&dir));
    assert_eq!(report.published(), 3);
    assert_eq!(report.skipped(), 2);
    assert!(report.is_success());
    assert!(matches!(
        report.outcome(Family::Ipv6),
        Some(SyncOutcome::Skipped { .. })
    ));

    assert_eq!(registry.snapshot_info(Family::Ipv4).records, 3);
    assert_eq!(registry.snapshot_info(Family::Domain).records, 3);
    assert_eq!(
        registry.snapshot_info(Family::Entity).publication.as_deref(),
        Some("2024-05-01T00:00:00Z")
    );

    let resolver = Resolver::new(registry);
    let target = resolver.resolve(&RedirectQuery::ip("27.1.2.3", None)).unwrap();
    assert_eq!(target.url.as_str(), "https://rdap.apnic.net/");
    assert_eq!(target.mirrors.len(), 2);

    let location = resolver
        .redirect_location(&RedirectQuery::entity("IRT-APNIC-AP"))
        .unwrap();
    assert_eq!(location.as_str(), "https://rdap.apnic.net/entity/IRT-APNIC-AP");
}

#[test]
fn test_config_driven_resolver_prefers_https() {
    let dir = bootstrap_dir();
    let json = format!(
        r#"{{
            "bootstrap": {{"dir": {:?}, "sync_interval_secs": 3600}},
            "resolver": {{"prefer_https": true}},
            "log": {{"level": "debug"}}
        }}"#,
        dir.path().display().to_string()
    );
    let config = load_config_str(&json).unwrap();
    assert_eq!(config.bootstrap.sync_interval(), Duration::from_secs(3600));

    let registry = Arc::new(RedirectRegistry::new());
    SyncCoordinator::new(Arc::clone(&registry)).sync_all(&config.bootstrap);

    // cnnic only publishes an http URL, so it stays http
    let resolver = Resolver::with_options(registry, config.resolver);
    let target = resolver.resolve(&RedirectQuery::domain("www.baidu.cn")).unwrap();
    assert_eq!(target.url, "http://cnnic.cn/rdap/");

    let target = resolver.resolve(&RedirectQuery::ip("3.3.3.3", None)).unwrap();
    assert_eq!(target.url.as_str(), "https://rdap.arin.net/registry/");
}

#[test]
fn test_broken_file_keeps_previous_family() {
    let dir = bootstrap_dir();
    let registry = Arc::new(RedirectRegistry::new());
    let coordinator = SyncCoordinator::new(Arc::clone(&registry));
    coordinator.sync_all(&config_for(&dir));

    fs::write(dir.path().join("dns.json"), r#"{"version": "1.0", "services": [[["com"]]]}"#).unwrap();
    let report = coordinator.sync_all(&config_for(&dir));
    assert_eq!(report.failures().count(), 1);
    assert_eq!(report.failures().next().unwrap().family(), Family::Domain);

    let info = registry.snapshot_info(Family::Domain);
    assert_eq!(info.version, 1);
    assert_eq!(info.records, 3);
    // Other families were re-published
    assert_eq!(registry.snapshot_info(Family::Ipv4).version, 2);
}

#[tokio::test]
async fn test_periodic_sync_picks_up_new_files() {
    let dir = TempDir::new().unwrap();
    let registry = Arc::new(RedirectRegistry::new());
    let coordinator = Arc::new(SyncCoordinator::new(Arc::clone(&registry)));

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = spawn_periodic_sync(
        Arc::clone(&coordinator),
        config_for(&dir),
        Duration::from_millis(20),
        shutdown_rx,
    );

    // Nothing to load yet; the file appears after the task is running
    fs::write(dir.path().join("ipv4.json"), IPV4_JSON).unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while registry.snapshot_info(Family::Ipv4).version == 0 {
        assert!(tokio::time::Instant::now() < deadline, "periodic sync never ran");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("task stops on shutdown")
        .unwrap();

    let resolver = Resolver::new(registry);
    assert!(resolver.resolve(&RedirectQuery::ip("1.2.3.4", None)).is_some());
}
