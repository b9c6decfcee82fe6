//! Integration tests for the merge pipeline, from files on disk to the
//! merged project.

mod common;
use common::{load_all, Stack};

use qec::document::{ContainerPort, MountSource, VolumeMount};
use qec::merge::{MergeEvent, ResourceKind};
use qec::{CollisionPolicy, ConfigMerger, Error, MergeOptions};

fn published(project: &qec::MergedProject, service: &str) -> Vec<String> {
    project.services()[service]
        .ports
        .iter()
        .filter_map(|p| p.published.clone())
        .collect()
}

// =============================================================================
// Namespacing
// =============================================================================

#[test]
fn test_web_and_db_projects() {
    let stack = Stack::new();
    let web = stack.project(
        "web",
        r"
services:
  frontend:
    image: node
    depends_on: [api]
    links: ['api:backend']
  api:
    build: ./api
    ports: ['3000:3000']
",
    );
    let db = stack.project(
        "db",
        r"
services:
  api:
    image: pgrest
    depends_on:
      postgres:
        condition: service_healthy
  postgres:
    image: postgres
    ports: ['5432:5432']
    volumes: ['pgdata:/var/lib/postgresql/data']
volumes:
  pgdata: {}
",
    );

    let outcome = ConfigMerger::default()
        .merge(load_all(&[web, db]))
        .unwrap();
    let services = outcome.project.services();

    assert_eq!(
        services.keys().map(String::as_str).collect::<Vec<_>>(),
        ["db_api", "db_postgres", "web_api", "web_frontend"]
    );
    assert!(services["web_frontend"].depends_on.contains_key("web_api"));
    assert_eq!(services["web_frontend"].links, ["web_api:backend"]);
    assert_eq!(
        services["db_api"].depends_on["db_postgres"].condition,
        "service_healthy"
    );
    assert_eq!(
        services["db_postgres"].volume_mounts[0].source(),
        MountSource::Named("db_pgdata")
    );
    assert!(outcome.project.resources.volumes.contains_key("db_pgdata"));

    let context = &services["web_api"].build.as_ref().unwrap().context;
    assert_eq!(
        std::path::Path::new(context),
        stack.root().join("web").join("api")
    );
}

#[test]
fn test_every_reference_stays_inside_its_project() {
    let stack = Stack::new();
    let a = stack.project(
        "a",
        "services:\n  app:\n    depends_on: [cache]\n  cache:\n    image: redis\n",
    );
    let b = stack.project(
        "b",
        "services:\n  app:\n    depends_on: [cache]\n  cache:\n    image: memcached\n",
    );

    let outcome = ConfigMerger::default().merge(load_all(&[a, b])).unwrap();
    let services = outcome.project.services();
    assert!(services["a_app"].depends_on.contains_key("a_cache"));
    assert!(services["b_app"].depends_on.contains_key("b_cache"));
    for spec in services.values() {
        for target in spec.depends_on.keys() {
            assert!(services.contains_key(target), "dangling reference {target}");
        }
    }
}

#[test]
fn test_external_references_untouched() {
    let stack = Stack::new();
    let path = stack.project(
        "web",
        r"
services:
  app:
    image: nginx
    depends_on: [shared-db]
    volumes:
      - external-cache:/cache
      - /var/run/docker.sock:/var/run/docker.sock
",
    );

    let outcome = ConfigMerger::default().merge(load_all(&[path])).unwrap();
    let app = &outcome.project.services()["web_app"];
    assert!(app.depends_on.contains_key("shared-db"));
    assert_eq!(
        app.volume_mounts[0],
        VolumeMount::Short("external-cache:/cache".into())
    );
    assert_eq!(
        app.volume_mounts[1].source(),
        MountSource::Bind("/var/run/docker.sock")
    );
    assert!(outcome.report.events().iter().any(|e| matches!(
        e,
        MergeEvent::ReferenceUnresolved { target, .. } if target == "shared-db"
    )));
}

#[test]
fn test_service_count_is_preserved() {
    let stack = Stack::new();
    let paths = [
        stack.project("one", "services:\n  a: {image: x}\n  b: {image: y}\n"),
        stack.project("two", "services:\n  a: {image: x}\n"),
        stack.project("three", "services: {}\n"),
    ];

    let outcome = ConfigMerger::default().merge(load_all(&paths)).unwrap();
    assert_eq!(outcome.project.services().len(), 3);
}

// =============================================================================
// Namespace collisions
// =============================================================================

#[test]
fn test_same_directory_name_fails_by_default() {
    let stack = Stack::new();
    let first = stack.project("x/web", "services:\n  app: {image: a}\n");
    let second = stack.project("y/web", "services:\n  app: {image: b}\n");

    let err = ConfigMerger::default()
        .merge(load_all(&[first.clone(), second.clone()]))
        .unwrap_err();
    match err {
        Error::DuplicateNamespace {
            token,
            first: f,
            second: s,
        } => {
            assert_eq!(token, "web");
            assert_eq!(f, first);
            assert_eq!(s, second);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_same_directory_name_overwrite_policy() {
    let stack = Stack::new();
    let first = stack.project("x/web", "services:\n  app: {image: a}\n");
    let second = stack.project("y/web", "services:\n  app: {image: b}\n");

    let merger = ConfigMerger::new(MergeOptions {
        collision_policy: CollisionPolicy::Overwrite,
        ..MergeOptions::default()
    });
    let outcome = merger.merge(load_all(&[first, second])).unwrap();

    assert_eq!(
        outcome.project.services()["web_app"].image.as_deref(),
        Some("b")
    );
    assert!(outcome.report.warnings().any(|e| matches!(
        e,
        MergeEvent::NamespaceOverwritten { kind: ResourceKind::Service, name, .. } if name == "web_app"
    )));
}

// =============================================================================
// Port conflicts
// =============================================================================

#[test]
fn test_shared_http_ports_are_offset() {
    let stack = Stack::new();
    let a = stack.project(
        "a",
        "services:\n  proxy:\n    image: nginx\n    ports: ['80:80', '443:443']\n",
    );
    let b = stack.project(
        "b",
        "services:\n  proxy:\n    image: nginx\n    ports: ['80:80', '443:443']\n",
    );

    let outcome = ConfigMerger::default().merge(load_all(&[a, b])).unwrap();
    assert_eq!(published(&outcome.project, "a_proxy"), ["80", "443"]);
    assert_eq!(published(&outcome.project, "b_proxy"), ["180", "543"]);
    assert_eq!(outcome.report.reassignments().count(), 2);
}

#[test]
fn test_tie_break_ignores_file_order() {
    let stack = Stack::new();
    let web = stack.project("web", "services:\n  app:\n    ports: ['8080:80']\n");
    let api = stack.project("api", "services:\n  app:\n    ports: ['8080:80']\n");

    for order in [vec![web.clone(), api.clone()], vec![api.clone(), web.clone()]] {
        let outcome = ConfigMerger::default().merge(load_all(&order)).unwrap();
        assert_eq!(published(&outcome.project, "api_app"), ["8080"]);
        assert_eq!(published(&outcome.project, "web_app"), ["8180"]);
    }
}

#[test]
fn test_custom_offset() {
    let stack = Stack::new();
    let a = stack.project("a", "services:\n  s:\n    ports: ['3000:3000']\n");
    let b = stack.project("b", "services:\n  s:\n    ports: ['3000:3000']\n");
    let c = stack.project("c", "services:\n  s:\n    ports: ['3000:3000']\n");

    let merger = ConfigMerger::new(MergeOptions {
        port_offset: 1000,
        ..MergeOptions::default()
    });
    let outcome = merger.merge(load_all(&[a, b, c])).unwrap();
    assert_eq!(published(&outcome.project, "a_s"), ["3000"]);
    assert_eq!(published(&outcome.project, "b_s"), ["4000"]);
    assert_eq!(published(&outcome.project, "c_s"), ["5000"]);
}

#[test]
fn test_offset_landing_on_taken_port_fails() {
    let stack = Stack::new();
    let a = stack.project("a", "services:\n  s:\n    ports: ['80:80', '180:180']\n");
    let b = stack.project("b", "services:\n  s:\n    ports: ['80:80']\n");

    let err = ConfigMerger::default().merge(load_all(&[a, b])).unwrap_err();
    assert!(matches!(err, Error::UnresolvableConflict { port: 180, .. }));
    assert!(err.is_port_conflict());
}

#[test]
fn test_unpublished_and_ranged_ports_pass_through() {
    let stack = Stack::new();
    let a = stack.project(
        "a",
        "services:\n  s:\n    ports: ['9000', '7000-7005:80', '8000-8005:8000-8005', '3000-3005']\n",
    );
    let b = stack.project(
        "b",
        "services:\n  s:\n    ports: ['9000', '7000-7005:80', {target: '4000-4001', published: '4000-4001'}]\n",
    );

    let outcome = ConfigMerger::default().merge(load_all(&[a, b])).unwrap();
    assert_eq!(published(&outcome.project, "a_s"), ["7000-7005", "8000-8005"]);
    assert_eq!(published(&outcome.project, "b_s"), ["7000-7005", "4000-4001"]);
    let a_ports = &outcome.project.services()["a_s"].ports;
    assert_eq!(a_ports[2].target, ContainerPort::Range(8000, 8005));
    assert_eq!(a_ports[3].target, ContainerPort::Range(3000, 3005));
    assert!(a_ports[3].published.is_none());
    assert_eq!(
        outcome.project.services()["b_s"].ports[2].target,
        ContainerPort::Range(4000, 4001)
    );
    assert_eq!(outcome.report.reassignments().count(), 0);
    assert!(outcome
        .report
        .events()
        .iter()
        .any(|e| matches!(e, MergeEvent::BindingSkipped { .. })));
}

// =============================================================================
// Output
// =============================================================================

#[test]
fn test_merged_yaml_round_trips_through_loader() {
    let stack = Stack::new();
    let a = stack.project(
        "a",
        r"
name: shop
services:
  web:
    image: nginx
    restart: always
    environment:
      MODE: prod
    ports: ['80:80']
networks:
  front: {}
",
    );
    let b = stack.project("b", "services:\n  web:\n    image: caddy\n    ports: ['80:80']\n");

    let outcome = ConfigMerger::default().merge(load_all(&[a, b])).unwrap();
    let yaml = outcome.project.to_yaml().unwrap();
    assert!(yaml.starts_with("name: shop"));
    assert!(yaml.contains("restart: always"));

    let merged = stack.file("out", "docker-compose.yml", &yaml);
    let reloaded = common::loader(&[]).load(&merged).unwrap();
    assert_eq!(reloaded.project_name(), Some("shop"));
    assert_eq!(reloaded.resources().services.len(), 2);
    assert!(reloaded.resources().networks.contains_key("front"));
    assert_eq!(
        reloaded.resources().services["b_web"].ports[0]
            .published
            .as_deref(),
        Some("180")
    );
}
