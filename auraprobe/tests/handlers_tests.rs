use auraprobe::handlers::*;
use auraprobe::{command_argument_builder, dispatch};
use auraprobe_scanner::Target;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::Level;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn parse(args: &[&str]) -> clap::ArgMatches {
    command_argument_builder()
        .try_get_matches_from(args)
        .unwrap()
}

#[test]
fn test_exit_codes() {
    assert_eq!(AuditOutcome::Success.exit_code(), 0);
    assert_eq!(AuditOutcome::NoEndpoint.exit_code(), 2);
    assert_eq!(AuditOutcome::BootstrapFailed.exit_code(), 3);
    assert_eq!(UNEXPECTED_ERROR_EXIT_CODE, 1);
}

#[test]
fn test_verbosity_level() {
    assert_eq!(verbosity_level(0), Level::WARN);
    assert_eq!(verbosity_level(1), Level::INFO);
    assert_eq!(verbosity_level(2), Level::DEBUG);
    assert_eq!(verbosity_level(5), Level::DEBUG);
}

#[test]
fn test_global_flags_after_subcommand() {
    let matches = parse(&["auraprobe", "check", "-u", "acme.my.site.com", "-q", "-vv"]);
    assert!(matches.get_flag("quiet"));
    assert_eq!(matches.get_count("verbose"), 2);
}

#[test]
fn test_url_is_required() {
    let result = command_argument_builder().try_get_matches_from(["auraprobe", "objects"]);
    assert!(result.is_err());
}

#[test]
fn test_pull_requires_an_object() {
    let result = command_argument_builder().try_get_matches_from([
        "auraprobe",
        "pull",
        "-u",
        "https://acme.my.site.com",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_pull_collects_object_names() {
    let matches = parse(&["auraprobe", "pull", "-u", "acme.my.site.com", "User", "Account"]);
    let (_, sub) = matches.subcommand().unwrap();
    let names: Vec<&String> = sub.get_many::<String>("OBJECT").unwrap().collect();
    assert_eq!(names, vec!["User", "Account"]);
}

#[test]
fn test_dump_options_defaults() {
    let matches = parse(&["auraprobe", "dump", "-u", "acme.my.site.com"]);
    let (_, sub) = matches.subcommand().unwrap();
    let options = dump_options_from_args(sub);

    assert!(!options.full_dump);
    assert!(!options.skip_existing);
    assert_eq!(options.max_pages, 1000);
}

#[test]
fn test_dump_options_from_flags() {
    let matches = parse(&[
        "auraprobe",
        "dump",
        "-u",
        "acme.my.site.com",
        "-f",
        "-s",
        "--max-pages",
        "0",
    ]);
    let (_, sub) = matches.subcommand().unwrap();
    let options = dump_options_from_args(sub);

    assert!(options.full_dump);
    assert!(options.skip_existing);
    assert_eq!(options.max_pages, 0);
}

#[test]
fn test_transport_from_args() {
    let matches = parse(&[
        "auraprobe",
        "dump",
        "-u",
        "acme.my.site.com",
        "-p",
        "http://127.0.0.1:8080",
        "--download-timeout",
        "42",
    ]);
    let (_, sub) = matches.subcommand().unwrap();
    let transport = transport_from_args(sub);

    assert_eq!(transport.proxy.as_deref(), Some("http://127.0.0.1:8080"));
    assert_eq!(transport.download_timeout, Duration::from_secs(42));
}

#[test]
fn test_transport_without_download_timeout_arg() {
    let matches = parse(&["auraprobe", "record", "-u", "acme.my.site.com", "005A0000001"]);
    let (_, sub) = matches.subcommand().unwrap();
    let transport = transport_from_args(sub);

    assert!(transport.proxy.is_none());
    assert_eq!(transport.download_timeout, Duration::from_secs(300));
}

#[test]
fn test_resolve_output_dir_from_target() {
    let target = Target::parse("https://acme.my.site.com/partners").unwrap();
    let output = resolve_output_dir(None, &target);
    assert_eq!(output.root(), Path::new(".").join("acme.my.site.com_partners"));
}

#[test]
fn test_resolve_output_dir_explicit() {
    let target = Target::parse("https://acme.my.site.com").unwrap();
    let explicit = "/tmp/run".to_string();
    let output = resolve_output_dir(Some(&explicit), &target);
    assert_eq!(output.root(), Path::new("/tmp/run"));
}

#[test]
fn test_resolve_download_dir() {
    let explicit = "/tmp/loot".to_string();
    assert_eq!(
        resolve_download_dir(Some(&explicit)).unwrap(),
        PathBuf::from("/tmp/loot/Downloaded_Files")
    );

    let cwd = std::env::current_dir().unwrap();
    assert_eq!(
        resolve_download_dir(None).unwrap(),
        cwd.join("Downloaded_Files")
    );
}

#[test]
fn test_pulled_objects_keep_request_order() {
    let pulled = vec![
        ("User".to_string(), vec![json!({"record": {"Id": "005A"}})]),
        ("Account".to_string(), vec![json!({"record": {"Id": "001A"}})]),
    ];
    let value = pulled_to_json(pulled);
    let keys: Vec<&String> = value.as_object().unwrap().keys().collect();

    assert_eq!(keys, vec!["User", "Account"]);
    assert_eq!(value["Account"][0]["record"]["Id"], "001A");
}

#[tokio::test]
async fn test_check_finds_endpoint() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/aura"))
        .respond_with(ResponseTemplate::new(200).set_body_string("aura:invalidSession"))
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let matches = parse(&["auraprobe", "check", "-q", "-u", &uri]);

    assert_eq!(dispatch(&matches).await.unwrap(), AuditOutcome::Success);
}

#[tokio::test]
async fn test_check_without_endpoint() {
    let mock_server = MockServer::start().await;

    let uri = mock_server.uri();
    let matches = parse(&["auraprobe", "check", "-q", "-u", &uri]);

    assert_eq!(dispatch(&matches).await.unwrap(), AuditOutcome::NoEndpoint);
}

#[tokio::test]
async fn test_objects_without_context() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/s/aura"))
        .respond_with(ResponseTemplate::new(401).set_body_string("aura:invalidSession"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let matches = parse(&["auraprobe", "objects", "-q", "-u", &uri]);

    assert_eq!(
        dispatch(&matches).await.unwrap(),
        AuditOutcome::BootstrapFailed
    );
}

#[tokio::test]
async fn test_dump_rejects_bad_url() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().to_string_lossy().to_string();
    let matches = parse(&["auraprobe", "dump", "-q", "-u", "https://", "-o", &output]);

    assert!(dispatch(&matches).await.is_err());
}
