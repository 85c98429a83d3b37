// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn raw(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn converts_full_definition() {
    let params = convert(&raw(&[
        ("image", "nginx"),
        ("tag", "latest"),
        ("ports", "{80: 8080}"),
        ("volumes", "['/data', '/srv/www:/usr/share/nginx/html:ro']"),
        ("volumes_from", "['web-config']"),
        ("privileged", "true"),
    ]));

    assert_eq!(params.image.as_deref(), Some("nginx"));
    assert_eq!(params.tag.as_deref(), Some("latest"));
    assert_eq!(params.ports, Some(PortMap::new().with_binding(80, PortBinding::port(8080))));
    assert_eq!(
        params.volumes,
        Some(vec![
            VolumeSpec { host: None, container: "/data".into(), mode: None },
            VolumeSpec {
                host: Some("/srv/www".into()),
                container: "/usr/share/nginx/html".into(),
                mode: Some("ro".into()),
            },
        ])
    );
    assert_eq!(params.volumes_from, Some(vec!["web-config".to_string()]));
    assert_eq!(params.privileged, Some(true));
    assert!(params.extra.is_empty());
}

#[test]
fn empty_input_yields_every_field_unset() {
    let params = convert(&HashMap::new());
    assert_eq!(params, ContainerParams::default());
    assert_eq!(params.image_ref(), None);
}

#[test]
fn malformed_ports_degrade_without_affecting_other_fields() {
    let params = convert(&raw(&[
        ("ports", "not-a-valid-literal"),
        ("image", "redis"),
        ("volumes_from", "['data']"),
        ("privileged", "false"),
    ]));

    assert_eq!(params.ports, None);
    assert_eq!(params.image.as_deref(), Some("redis"));
    assert_eq!(params.volumes_from, Some(vec!["data".to_string()]));
    assert_eq!(params.privileged, Some(false));
}

#[yare::parameterized(
    unparseable   = { "ports",        "{80: " },
    wrong_shape   = { "ports",        "'8080'" },
    port_range    = { "ports",        "{80: 70000}" },
    bad_proto     = { "ports",        "{'80/icmp': 1}" },
    volume_int    = { "volumes",      "[1, 2]" },
    volume_colons = { "volumes",      "['a:b:c:d']" },
    from_mapping  = { "volumes_from", "{'a': 1}" },
)]
fn structured_field_errors_degrade_to_none(field: &str, value: &str) {
    let params = convert(&raw(&[(field, value), ("image", "busybox")]));
    assert_eq!(params.ports, None);
    assert_eq!(params.volumes, None);
    assert_eq!(params.volumes_from, None);
    assert_eq!(params.image.as_deref(), Some("busybox"));
}

#[test]
fn blank_structured_fields_are_unset() {
    let params = convert(&raw(&[("ports", "  "), ("volumes", ""), ("image", "")]));
    assert_eq!(params, ContainerParams::default());
}

#[test]
fn image_and_tag_are_trimmed() {
    let params = convert(&raw(&[("image", " nginx\n"), ("tag", "\t1.25 ")]));
    assert_eq!(params.image_ref().as_deref(), Some("nginx:1.25"));

    let blank = convert(&raw(&[("image", "   "), ("tag", "latest")]));
    assert_eq!(blank.image, None);
    assert_eq!(blank.image_ref().as_deref(), Some("latest"));
}

#[test]
fn unrecognized_fields_pass_through_unchanged() {
    let params = convert(&raw(&[("image", "nginx"), ("restart", "{'Name': 'always'}")]));
    assert_eq!(params.extra.get("restart").map(String::as_str), Some("{'Name': 'always'}"));
}

#[test]
fn camel_case_volumes_from_is_accepted() {
    let params = convert(&raw(&[("volumesFrom", "['cfg']")]));
    assert_eq!(params.volumes_from, Some(vec!["cfg".to_string()]));
    assert!(params.extra.is_empty());
}

#[test]
fn snake_case_volumes_from_wins_over_alias() {
    let params = convert(&raw(&[("volumesFrom", "['alias']"), ("volumes_from", "['canonical']")]));
    assert_eq!(params.volumes_from, Some(vec!["canonical".to_string()]));
}

#[yare::parameterized(
    lower_true  = { "true",  Some(true) },
    upper_true  = { "True",  Some(true) },
    one         = { "1",     Some(true) },
    lower_false = { "false", Some(false) },
    zero        = { "0",     Some(false) },
    garbage     = { "maybe", None },
    blank       = { "",      None },
)]
fn privileged_flag_coercion(value: &str, expected: Option<bool>) {
    let params = convert(&raw(&[("privileged", value)]));
    assert_eq!(params.privileged, expected);
}

#[yare::parameterized(
    both      = { Some("nginx"), Some("1.25"), Some("nginx:1.25") },
    image     = { Some("nginx"), None,         Some("nginx") },
    tag_only  = { None,          Some("nginx:stable"), Some("nginx:stable") },
    neither   = { None,          None,         None },
)]
fn image_reference(image: Option<&str>, tag: Option<&str>, expected: Option<&str>) {
    let params = ContainerParams {
        image: image.map(str::to_string),
        tag: tag.map(str::to_string),
        ..Default::default()
    };
    assert_eq!(params.image_ref().as_deref(), expected);
}

#[test]
fn port_values_accept_docker_binding_forms() {
    let params = convert(&raw(&[(
        "ports",
        "{80: [8080, ('127.0.0.1', 8081)], '53/udp': None, 443: '8443', 22: ('0.0.0.0',)}",
    )]));
    let ports = params.ports.unwrap();

    assert_eq!(
        ports.get("80/tcp").unwrap(),
        &[
            PortBinding::port(8080),
            PortBinding { host_ip: Some("127.0.0.1".into()), host_port: Some(8081) },
        ]
    );
    assert_eq!(ports.get("53/udp").unwrap(), &[PortBinding::default()]);
    assert_eq!(ports.get("443/tcp").unwrap(), &[PortBinding::port(8443)]);
    assert_eq!(
        ports.get("22/tcp").unwrap(),
        &[PortBinding { host_ip: Some("0.0.0.0".into()), host_port: None }]
    );
    assert_eq!(ports.exposed(), vec!["22/tcp", "443/tcp", "53/udp", "80/tcp"]);
}

#[test]
fn port_list_exposes_without_publishing() {
    let params = convert(&raw(&[("ports", "[80, '9000/udp']")]));
    let ports = params.ports.unwrap();
    assert_eq!(ports.len(), 2);
    assert_eq!(ports.get("80/tcp").unwrap(), &[] as &[PortBinding]);
    assert_eq!(ports.get("9000/udp").unwrap(), &[] as &[PortBinding]);
}

#[test]
fn create_and_start_options_split_exposure_from_bindings() {
    let params = convert(&raw(&[
        ("image", "nginx"),
        ("ports", "{80: 8080}"),
        ("volumes", "['/cache', '/srv:/data:ro']"),
        ("volumes_from", "['cfg']"),
    ]));

    let create = params.create_options("nginx:latest".into());
    assert_eq!(create.image, "nginx:latest");
    assert_eq!(create.exposed_ports, vec!["80/tcp"]);
    assert_eq!(create.volumes, vec!["/cache", "/data"]);

    let start = params.start_options();
    assert_eq!(start.port_bindings.get("80/tcp").unwrap(), &[PortBinding::port(8080)]);
    assert_eq!(start.binds, vec!["/srv:/data:ro"]);
    assert_eq!(start.volumes_from, vec!["cfg"]);
    assert!(!start.privileged);
}

#[yare::parameterized(
    anonymous      = { "/data",           None,          "/data", None },
    anonymous_mode = { "/data:ro",        None,          "/data", Some("ro") },
    bind           = { "/host:/data",     Some("/host"), "/data", None },
    bind_mode      = { "/host:/data:rw,z", Some("/host"), "/data", Some("rw,z") },
)]
fn volume_spec_parsing(spec: &str, host: Option<&str>, container: &str, mode: Option<&str>) {
    let parsed = VolumeSpec::parse(spec).unwrap();
    assert_eq!(parsed.host.as_deref(), host);
    assert_eq!(parsed.container, container);
    assert_eq!(parsed.mode.as_deref(), mode);
    assert_eq!(parsed.to_string(), spec);
}

#[yare::parameterized(
    empty          = { "" },
    empty_host     = { ":/data" },
    bad_mode       = { "/a:/b:xx" },
    too_many_parts = { "/a:/b:ro:rw" },
)]
fn volume_spec_rejects(spec: &str) {
    assert!(VolumeSpec::parse(spec).is_err());
}

#[test]
fn diff_names_changed_fields() {
    let before = convert(&raw(&[("image", "nginx"), ("ports", "{80: 8080}"), ("note", "a")]));
    let after = convert(&raw(&[("image", "nginx"), ("ports", "{80: 9090}"), ("owner", "ops")]));

    assert_eq!(before.diff(&after), vec!["ports", "note", "owner"]);
    assert!(before.diff(&before.clone()).is_empty());
}

#[test]
fn conversion_is_deterministic() {
    let input = raw(&[("image", "nginx"), ("ports", "{80: 8080, 81: 8081}"), ("x", "y")]);
    assert_eq!(convert(&input), convert(&input));
}
