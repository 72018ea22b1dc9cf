#![deny(clippy::all, clippy::pedantic)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use httpmock::MockServer;
use proxyboard::application::error::AppError;
use proxyboard::application::table::{Breakpoints, resource_table};
use proxyboard::application::transfer::{ConflictStrategy, ImportPlan};
use proxyboard::config::{
    ApiSettings, ImportSettings, LogFormat, LoggingSettings, SearchSettings, SessionSettings,
    Settings, TableSettings,
};
use proxyboard::infra::http::{ApiError, MemoryTokens};
use proxyboard_api_types::{ResourceKind, User, UserPermissions};
use serde_json::json;
use tempfile::NamedTempFile;
use time::macros::datetime;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::args::{
    AccessListsCmd, DirectiveArg, ImportArgs, ListArgs, PermissionsArgs, ProxyHostAddArgs,
    ResourceCmd, SchemeArg, UsersCmd,
};
use crate::client::{CliError, Ctx};
use crate::handlers::{access_lists, build_query, resources, session, transfer, users};

fn settings(server: &MockServer) -> Settings {
    Settings {
        api: ApiSettings {
            base_url: Url::parse(&server.url("/api")).expect("mock url"),
            timeout: Duration::from_secs(5),
        },
        session: SessionSettings {
            token_file: PathBuf::from("unused-token"),
        },
        logging: LoggingSettings {
            level: LevelFilter::WARN,
            format: LogFormat::Compact,
        },
        search: SearchSettings {
            ttl: Duration::from_secs(300),
        },
        table: TableSettings {
            rows_per_page: 25,
            breakpoints: Breakpoints::default(),
            width: Some(120),
        },
        import: ImportSettings {
            strategy: ConflictStrategy::SkipExisting,
        },
    }
}

fn ctx(server: &MockServer) -> Ctx {
    Ctx::new(
        settings(server),
        Arc::new(MemoryTokens::new(Some("tok".into()))),
    )
    .expect("ctx")
}

fn tmp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("tmp file");
    std::io::Write::write_all(&mut file, contents.as_bytes()).expect("write tmp");
    file
}

fn list_args() -> ListArgs {
    ListArgs {
        page: 1,
        ..ListArgs::default()
    }
}

fn mock_admin(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method("GET")
            .path("/api/users/me")
            .query_param("expand", "permissions");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "id": 1,
                "email": "admin@example.com",
                "name": "Admin",
                "roles": ["admin"]
            }));
    })
}

fn add_args() -> ProxyHostAddArgs {
    ProxyHostAddArgs {
        domains: vec!["app.example.com".into()],
        forward_host: "10.0.0.5".into(),
        forward_port: 8080,
        scheme: SchemeArg::Http,
        certificate_id: 0,
        access_list_id: 0,
        ssl_forced: false,
        http2: false,
        hsts: false,
        block_exploits: true,
        websockets: false,
        caching: false,
    }
}

#[test]
fn parse_filter_requires_id_and_value() {
    assert_eq!(
        crate::io::parse_filter(" status = online ").expect("filter"),
        ("status", "online")
    );
    assert!(matches!(
        crate::io::parse_filter("status="),
        Err(CliError::InvalidInput(_))
    ));
    assert!(matches!(
        crate::io::parse_filter("online"),
        Err(CliError::InvalidInput(_))
    ));
}

#[test]
fn build_query_validates_filters_sort_and_page() -> Result<(), CliError> {
    let engine = resource_table(
        ResourceKind::ProxyHosts,
        datetime!(2025-02-01 00:00 UTC),
    );

    let args = ListArgs {
        filters: vec!["status=disabled".into()],
        sort: Some("status:desc".into()),
        page: 2,
        ..ListArgs::default()
    };
    let query = build_query(&engine, &args, 10)?;
    assert_eq!(query.filters().get("status"), "disabled");
    assert_eq!(query.page(), 1);
    assert_eq!(query.rows_per_page(), 10);

    let unknown_filter = ListArgs {
        filters: vec!["colour=red".into()],
        ..list_args()
    };
    assert!(matches!(
        build_query(&engine, &unknown_filter, 10),
        Err(CliError::InvalidInput(_))
    ));

    let bad_value = ListArgs {
        filters: vec!["status=sleeping".into()],
        ..list_args()
    };
    assert!(matches!(
        build_query(&engine, &bad_value, 10),
        Err(CliError::InvalidInput(_))
    ));

    let bad_sort = ListArgs {
        sort: Some("nonexistent".into()),
        ..list_args()
    };
    assert!(matches!(
        build_query(&engine, &bad_sort, 10),
        Err(CliError::InvalidInput(_))
    ));

    let page_zero = ListArgs::default();
    assert!(matches!(
        build_query(&engine, &page_zero, 10),
        Err(CliError::InvalidInput(_))
    ));
    Ok(())
}

#[test]
fn merge_permissions_overrides_only_given_levels() -> Result<(), CliError> {
    let mut current = UserPermissions::default();
    current.set("proxy_hosts", "view");
    current.set("streams", "manage");

    let args = PermissionsArgs {
        id: 4,
        visibility: Some("user".into()),
        proxy_hosts: Some("manage".into()),
        ..PermissionsArgs::default()
    };
    let merged = users::merge_permissions(Some(current), &args)?;
    assert_eq!(merged.get("proxy_hosts"), Some("manage"));
    assert_eq!(merged.get("streams"), Some("manage"));
    assert_eq!(merged.visibility.as_deref(), Some("user"));

    let invalid = PermissionsArgs {
        certificates: Some("owner".into()),
        ..PermissionsArgs::default()
    };
    assert!(matches!(
        users::merge_permissions(None, &invalid),
        Err(CliError::InvalidInput(_))
    ));
    Ok(())
}

#[test]
fn session_errors_point_at_login() {
    let err = CliError::from(ApiError::SessionExpired);
    assert!(err.hint().expect("hint").contains("proxyboard login"));

    let denied = CliError::from(AppError::permission_denied("nope"));
    assert!(denied.hint().expect("hint").contains("administrator"));

    assert!(CliError::InvalidInput("x".into()).hint().is_none());
}

#[test]
fn whoami_lists_levels_per_resource() {
    let user: User = serde_json::from_value(json!({
        "id": 7,
        "email": "ops@example.com",
        "name": "Ops",
        "roles": [],
        "permissions": {
            "visibility": "user",
            "proxy_hosts": "manage",
            "certificates": "view"
        }
    }))
    .expect("user");

    let text = session::describe_user(&user);
    assert!(text.starts_with("Ops <ops@example.com>"));
    assert!(text.contains("visibility: user"));
    assert!(text.lines().any(|l| l.starts_with("Proxy Hosts") && l.ends_with("manage")));
    assert!(text.lines().any(|l| l.starts_with("Streams") && l.ends_with("hidden")));
}

#[tokio::test]
async fn proxy_hosts_list_requests_expanded_rows() -> Result<(), CliError> {
    let server = MockServer::start();
    let me = mock_admin(&server);
    let hosts = server.mock(|when, then| {
        when.method("GET")
            .path("/api/nginx/proxy-hosts")
            .query_param("expand", "owner,access_list,certificate")
            .header("authorization", "Bearer tok");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!([
                {"id": 1, "domain_names": ["a.example.com"], "forward_host": "10.0.0.1", "forward_port": 80},
                {"id": 2, "domain_names": ["b.example.com"], "forward_host": "10.0.0.2", "forward_port": 81, "enabled": false}
            ]));
    });

    let ctx = ctx(&server);
    resources::handle(&ctx, ResourceKind::ProxyHosts, ResourceCmd::List(list_args())).await?;
    me.assert();
    hosts.assert();
    Ok(())
}

#[tokio::test]
async fn invalid_proxy_host_is_rejected_before_any_request() {
    let server = MockServer::start();
    let any = server.mock(|when, then| {
        when.any_request();
        then.status(500);
    });

    let mut args = add_args();
    args.domains = vec!["not a domain".into()];
    args.forward_port = 0;

    let ctx = ctx(&server);
    let result = resources::add_proxy_host(&ctx, args).await;
    assert!(matches!(result, Err(CliError::App(AppError::Domain(_)))));
    any.assert_calls(0);
}

#[tokio::test]
async fn add_proxy_host_posts_editable_fields() -> Result<(), CliError> {
    let server = MockServer::start();
    mock_admin(&server);
    let create = server.mock(|when, then| {
        when.method("POST")
            .path("/api/nginx/proxy-hosts")
            .json_body_includes(
                r#"{"domain_names":["app.example.com"],"forward_host":"10.0.0.5","forward_port":8080,"block_exploits":true}"#,
            );
        then.status(201)
            .header("content-type", "application/json")
            .json_body(json!({
                "id": 12,
                "domain_names": ["app.example.com"],
                "forward_host": "10.0.0.5",
                "forward_port": 8080
            }));
    });

    let ctx = ctx(&server);
    resources::add_proxy_host(&ctx, add_args()).await?;
    create.assert();
    Ok(())
}

#[tokio::test]
async fn set_rule_replaces_client_at_position() -> Result<(), CliError> {
    let server = MockServer::start();
    mock_admin(&server);
    let list = json!({
        "id": 3,
        "name": "office",
        "clients": [
            {"address": "10.0.0.0/8", "directive": "allow"},
            {"address": "all", "directive": "deny"}
        ]
    });
    let fetch = server.mock(|when, then| {
        when.method("GET").path("/api/nginx/access-lists/3");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(list.clone());
    });
    let update = server.mock(|when, then| {
        when.method("PUT")
            .path("/api/nginx/access-lists/3")
            .json_body_includes(
                r#"{"clients":[{"address":"10.0.0.0/8","directive":"allow"},{"address":"192.168.1.0/24","directive":"allow"}]}"#,
            );
        then.status(200)
            .header("content-type", "application/json")
            .json_body(list.clone());
    });

    let ctx = ctx(&server);
    access_lists::handle(
        &ctx,
        AccessListsCmd::SetRule {
            id: 3,
            position: 2,
            address: "192.168.1.0/24".into(),
            directive: DirectiveArg::Allow,
        },
    )
    .await?;
    fetch.assert();
    update.assert();
    Ok(())
}

#[tokio::test]
async fn set_rule_rejects_missing_position() {
    let server = MockServer::start();
    mock_admin(&server);
    server.mock(|when, then| {
        when.method("GET").path("/api/nginx/access-lists/3");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"id": 3, "name": "office", "clients": []}));
    });
    let update = server.mock(|when, then| {
        when.method("PUT").path("/api/nginx/access-lists/3");
        then.status(200);
    });

    let ctx = ctx(&server);
    let result = access_lists::handle(
        &ctx,
        AccessListsCmd::SetRule {
            id: 3,
            position: 1,
            address: "10.1.0.0/16".into(),
            directive: DirectiveArg::Deny,
        },
    )
    .await;
    assert!(matches!(result, Err(CliError::InvalidInput(_))));
    update.assert_calls(0);
}

#[tokio::test]
async fn bulk_delete_reports_partial_failure() {
    let server = MockServer::start();
    mock_admin(&server);
    let ok = server.mock(|when, then| {
        when.method("DELETE").path("/api/nginx/streams/4");
        then.status(200)
            .header("content-type", "application/json")
            .body("true");
    });
    let failing = server.mock(|when, then| {
        when.method("DELETE").path("/api/nginx/streams/5");
        then.status(500)
            .header("content-type", "application/json")
            .json_body(json!({"error": {"code": 500, "message": "Internal Error"}}));
    });

    let ctx = ctx(&server);
    let result = resources::handle(
        &ctx,
        ResourceKind::Streams,
        ResourceCmd::Delete {
            ids: vec![4, 5, 4],
            yes: true,
        },
    )
    .await;
    assert!(matches!(
        result,
        Err(CliError::Partial {
            failed: 1,
            total: 2
        })
    ));
    ok.assert_calls(1);
    failing.assert_calls(1);
}

#[tokio::test]
async fn deleting_own_account_is_refused() {
    let server = MockServer::start();
    mock_admin(&server);
    let delete = server.mock(|when, then| {
        when.method("DELETE");
        then.status(200)
            .header("content-type", "application/json")
            .body("true");
    });

    let ctx = ctx(&server);
    let result = users::handle(
        &ctx,
        UsersCmd::Delete {
            ids: vec![3, 1],
            yes: true,
        },
    )
    .await;
    assert!(matches!(result, Err(CliError::App(AppError::Validation(_)))));
    delete.assert_calls(0);
}

#[tokio::test]
async fn toggling_unsupported_kind_is_a_validation_error() {
    let server = MockServer::start();
    let ctx = ctx(&server);
    let result = resources::handle(
        &ctx,
        ResourceKind::Certificates,
        ResourceCmd::Enable { ids: vec![1] },
    )
    .await;
    assert!(matches!(result, Err(CliError::App(AppError::Validation(_)))));
}

#[tokio::test]
async fn expired_token_is_refreshed_once() -> Result<(), CliError> {
    let server = MockServer::start();
    let stale = server.mock(|when, then| {
        when.method("GET")
            .path("/api/users/me")
            .header("authorization", "Bearer tok");
        then.status(401)
            .header("content-type", "application/json")
            .json_body(json!({"error": {"code": 401, "message": "Token has expired"}}));
    });
    let refresh = server.mock(|when, then| {
        when.method("GET")
            .path("/api/tokens")
            .header("authorization", "Bearer tok");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"token": "fresh", "expires": "2030-01-01T00:00:00Z"}));
    });
    let fresh = server.mock(|when, then| {
        when.method("GET")
            .path("/api/users/me")
            .header("authorization", "Bearer fresh");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"id": 1, "email": "admin@example.com", "roles": ["admin"]}));
    });

    let ctx = ctx(&server);
    session::whoami(&ctx).await?;
    stale.assert_calls(1);
    refresh.assert_calls(1);
    fresh.assert_calls(1);
    assert_eq!(ctx.api.tokens().token().as_deref(), Some("fresh"));
    Ok(())
}

#[tokio::test]
async fn import_dry_run_sends_nothing() -> Result<(), CliError> {
    let server = MockServer::start();
    let any = server.mock(|when, then| {
        when.any_request();
        then.status(500);
    });
    let file = tmp_file(
        r#"{"type":"proxy_host","exported_at":"2025-02-01T08:00:00Z","data":[
            {"domain_names":["a.example.com"],"forward_host":"10.0.0.1","forward_port":80},
            {"domain_names":["b.example.com"],"forward_host":"10.0.0.2","forward_port":80}
        ]}"#,
    );

    let ctx = ctx(&server);
    transfer::import_cmd(
        &ctx,
        ImportArgs {
            file: file.path().to_path_buf(),
            strategy: Some("rename".into()),
            select: vec![2],
            dry_run: true,
        },
    )
    .await?;
    any.assert_calls(0);
    Ok(())
}

#[tokio::test]
async fn import_rejects_out_of_range_selection() {
    let server = MockServer::start();
    let file = tmp_file(r#"{"type":"stream","exported_at":"2025-02-01T08:00:00Z","data":[]}"#);
    let ctx = ctx(&server);
    let result = transfer::import_cmd(
        &ctx,
        ImportArgs {
            file: file.path().to_path_buf(),
            strategy: None,
            select: vec![1],
            dry_run: true,
        },
    )
    .await;
    assert!(matches!(result, Err(CliError::InvalidInput(_))));
}

#[tokio::test]
async fn import_skips_existing_and_creates_new() -> Result<(), CliError> {
    let server = MockServer::start();
    mock_admin(&server);
    let existing = server.mock(|when, then| {
        when.method("GET").path("/api/nginx/proxy-hosts");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!([
                {"id": 1, "domain_names": ["a.example.com"], "forward_host": "10.0.0.1", "forward_port": 80}
            ]));
    });
    let create = server.mock(|when, then| {
        when.method("POST")
            .path("/api/nginx/proxy-hosts")
            .json_body_includes(r#"{"domain_names":["b.example.com"]}"#);
        then.status(201)
            .header("content-type", "application/json")
            .json_body(json!({
                "id": 2,
                "domain_names": ["b.example.com"],
                "forward_host": "10.0.0.2",
                "forward_port": 80
            }));
    });
    let file = tmp_file(
        r#"{"type":"proxy_host","exported_at":"2025-02-01T08:00:00Z","data":[
            {"domain_names":["a.example.com"],"forward_host":"10.0.0.1","forward_port":80},
            {"domain_names":["b.example.com"],"forward_host":"10.0.0.2","forward_port":80}
        ]}"#,
    );

    let ctx = ctx(&server);
    transfer::import_cmd(
        &ctx,
        ImportArgs {
            file: file.path().to_path_buf(),
            strategy: None,
            select: Vec::new(),
            dry_run: false,
        },
    )
    .await?;
    existing.assert_calls(1);
    create.assert_calls(1);
    Ok(())
}

#[test]
fn plan_description_marks_selection() {
    let mut plan = ImportPlan::parse(
        br#"{"type":"stream","exported_at":"2025-02-01T08:00:00Z","data":[
            {"incoming_port":8443,"forwarding_host":"10.0.0.9","forwarding_port":443},
            {"incoming_port":2222,"forwarding_host":"10.0.0.10","forwarding_port":22}
        ]}"#,
    )
    .expect("plan");
    plan.select_only(&[1]);

    let text = transfer::describe_plan(&plan);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("2 item(s), 1 selected"));
    assert!(lines[1].starts_with("  [ ]   1."));
    assert!(lines[2].starts_with("  [x]   2."));
}

#[test]
fn dashboard_render_lists_counts_and_failures() {
    use proxyboard::application::dashboard::{Dashboard, ResourceCounts};
    use proxyboard::domain::certificates::ExpiryBand;

    let mut board = Dashboard::default();
    board.counts.insert(
        ResourceKind::ProxyHosts,
        ResourceCounts {
            total: 3,
            enabled: 2,
            disabled: 1,
            offline: 1,
        },
    );
    board.counts.insert(
        ResourceKind::Certificates,
        ResourceCounts {
            total: 2,
            ..ResourceCounts::default()
        },
    );
    board.expiry.insert(ExpiryBand::Expired, 1);
    board.expiry.insert(ExpiryBand::Critical, 1);
    board
        .failed
        .push((ResourceKind::Streams, "permission denied: no".into()));

    let text = crate::handlers::dashboard::render(&board);
    assert!(text.contains("(2 enabled, 1 disabled, 1 offline)"));
    assert!(text.lines().any(|l| l.starts_with("SSL Certificates") && l.ends_with('2')));
    assert!(text.contains("2 certificate(s) expired or expiring within 7 days"));
    assert!(text.contains("Streams unavailable: permission denied: no"));
}
