// Tests for CLI argument helpers

use ftptree::handlers::{parse_host_argument, parse_method, verbosity_level};
use ftptree_crawler::ListingMethod;
use tracing::Level;

// ============================================================================
// Host argument parsing
// ============================================================================

#[test]
fn test_bare_host() {
    let (host, root) = parse_host_argument("ftp.kernel.test").unwrap();
    assert_eq!(host, "ftp.kernel.test");
    assert_eq!(root, None);
}

#[test]
fn test_host_with_port() {
    let (host, root) = parse_host_argument("ftp.kernel.test:2121").unwrap();
    assert_eq!(host, "ftp.kernel.test:2121");
    assert_eq!(root, None);
}

#[test]
fn test_ftp_url() {
    let (host, root) = parse_host_argument("ftp://ftp.kernel.test/pub/linux").unwrap();
    assert_eq!(host, "ftp.kernel.test");
    assert_eq!(root, Some("/pub/linux".to_string()));
}

#[test]
fn test_ftp_url_with_port_no_path() {
    let (host, root) = parse_host_argument("ftp://mirror.test:2121/").unwrap();
    assert_eq!(host, "mirror.test:2121");
    assert_eq!(root, None);
}

#[test]
fn test_rejects_http_url() {
    assert!(parse_host_argument("http://example.test/").is_err());
}

#[test]
fn test_rejects_empty_host() {
    assert!(parse_host_argument("").is_err());
}

// ============================================================================
// Method / verbosity parsing
// ============================================================================

#[test]
fn test_parse_method_names() {
    assert_eq!(parse_method("auto").unwrap(), ListingMethod::Auto);
    assert_eq!(parse_method("mlsd").unwrap(), ListingMethod::Mlsd);
    assert_eq!(parse_method("unix").unwrap(), ListingMethod::Unix);
    assert_eq!(parse_method("windows").unwrap(), ListingMethod::Windows);
    assert!(parse_method("vms").is_err());
}

#[test]
fn test_verbosity_levels() {
    assert_eq!(verbosity_level(0), Level::INFO);
    assert_eq!(verbosity_level(1), Level::DEBUG);
    assert_eq!(verbosity_level(2), Level::TRACE);
    assert_eq!(verbosity_level(9), Level::TRACE);
}
