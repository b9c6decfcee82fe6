//! Compose document schema.
//!
//! The engine interprets only names, paths and ports. Everything else a
//! service or resource declares is carried through untouched in an `extra`
//! mapping, so the merged file keeps every setting the author wrote.
//!
//! Short syntaxes (`"8080:80/udp"`, `depends_on` lists, `KEY=VALUE`
//! environment lists, string build contexts) are normalized on load and
//! written back in their long form.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};

use crate::port::Port;

/// Services keyed by name.
pub type Services = BTreeMap<String, ServiceSpec>;

/// The resource maps of one compose project.
///
/// Unknown top-level keys (`version`, `x-*` extensions) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectResources {
    /// Services keyed by name.
    #[serde(
        default,
        deserialize_with = "nullable_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub services: Services,

    /// Named volumes.
    #[serde(
        default,
        deserialize_with = "nullable_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub volumes: BTreeMap<String, VolumeSpec>,

    /// Networks. These are shared across documents and never namespaced.
    #[serde(
        default,
        deserialize_with = "nullable_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub networks: BTreeMap<String, NetworkSpec>,

    /// Named configs.
    #[serde(
        default,
        deserialize_with = "nullable_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub configs: BTreeMap<String, ConfigSpec>,

    /// Named secrets.
    #[serde(
        default,
        deserialize_with = "nullable_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub secrets: BTreeMap<String, SecretSpec>,
}

/// A whole compose file as read from disk.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ComposeFile {
    /// Declared project name, if any.
    #[serde(default)]
    pub name: Option<String>,

    /// The resource maps.
    #[serde(flatten)]
    pub resources: ProjectResources,
}

/// One service definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Build section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildSpec>,

    /// Port bindings, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortBinding>,

    /// Dependencies and their wait conditions.
    #[serde(
        default,
        deserialize_with = "deserialize_depends_on",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub depends_on: BTreeMap<String, Dependency>,

    /// Link entries (`target` or `target:alias`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,

    /// Volume mounts.
    #[serde(default, rename = "volumes", skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,

    /// References to top-level configs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub configs: Vec<ResourceRef>,

    /// References to top-level secrets.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<ResourceRef>,

    /// Environment variables; `None` passes the variable through from the
    /// host at run time.
    #[serde(
        default,
        deserialize_with = "deserialize_environment",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub environment: BTreeMap<String, Option<String>>,

    /// Every other key, preserved verbatim.
    #[serde(flatten)]
    pub extra: Mapping,
}

/// A service build section, always in long form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBuild")]
pub struct BuildSpec {
    /// Build context: a directory or a remote (git/URL) context.
    pub context: String,

    /// Dockerfile path relative to the context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dockerfile: Option<String>,

    /// Every other build key.
    #[serde(flatten)]
    pub extra: Mapping,
}

impl BuildSpec {
    /// Creates a build section with only a context.
    #[must_use]
    pub fn with_context(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            dockerfile: None,
            extra: Mapping::new(),
        }
    }
}

fn default_context() -> String {
    ".".to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBuild {
    Context(String),
    Detailed {
        #[serde(default = "default_context")]
        context: String,
        #[serde(default)]
        dockerfile: Option<String>,
        #[serde(flatten)]
        extra: Mapping,
    },
}

impl From<RawBuild> for BuildSpec {
    fn from(raw: RawBuild) -> Self {
        match raw {
            RawBuild::Context(context) => Self::with_context(context),
            RawBuild::Detailed {
                context,
                dockerfile,
                extra,
            } => Self {
                context,
                dockerfile,
                extra,
            },
        }
    }
}

/// Transport protocol of a port binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// TCP (the default).
    #[default]
    Tcp,
    /// UDP.
    Udp,
    /// SCTP.
    Sctp,
}

impl Protocol {
    fn parse(s: &str) -> Result<Self, String> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            "sctp" => Ok(Self::Sctp),
            other => Err(format!("unknown port protocol '{other}'")),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
            Self::Sctp => write!(f, "sctp"),
        }
    }
}

/// The container side of a port binding: one port or an inclusive range.
///
/// Serializes as a number for a single port and as `"start-end"` for a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerPort {
    /// A single port.
    Single(u16),
    /// An inclusive range such as `8000-8005`.
    Range(u16, u16),
}

impl ContainerPort {
    fn parse(value: &str, spec: &str) -> Result<Self, String> {
        let invalid = || format!("invalid container port '{value}' in '{spec}'");
        let value = value.trim();
        match value.split_once('-') {
            Some((start, end)) => {
                let start = start.trim().parse::<u16>().map_err(|_| invalid())?;
                let end = end.trim().parse::<u16>().map_err(|_| invalid())?;
                if start > end {
                    return Err(invalid());
                }
                Ok(Self::Range(start, end))
            }
            None => value.parse::<u16>().map(Self::Single).map_err(|_| invalid()),
        }
    }
}

impl From<u16> for ContainerPort {
    fn from(port: u16) -> Self {
        Self::Single(port)
    }
}

impl fmt::Display for ContainerPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(port) => write!(f, "{port}"),
            Self::Range(start, end) => write!(f, "{start}-{end}"),
        }
    }
}

impl Serialize for ContainerPort {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Single(port) => serializer.serialize_u16(*port),
            Self::Range(..) => serializer.collect_str(self),
        }
    }
}

/// A port binding in long form.
///
/// `published` is kept as the string the author wrote. A value that is not a
/// single decimal port (a range, say) is carried through but ignored by
/// conflict resolution. The container side may be a range too.
///
/// # Examples
///
/// ```
/// use qec::document::{ContainerPort, PortBinding};
///
/// let binding = PortBinding::parse_short("127.0.0.1:8080:80/udp").unwrap();
/// assert_eq!(binding.host_ip.as_deref(), Some("127.0.0.1"));
/// assert_eq!(binding.published.as_deref(), Some("8080"));
/// assert_eq!(binding.target, ContainerPort::Single(80));
/// assert_eq!(binding.protocol.to_string(), "udp");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPort")]
pub struct PortBinding {
    /// Container port or port range.
    pub target: ContainerPort,

    /// Published host port; `None` means unpublished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,

    /// Host interface to bind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_ip: Option<String>,

    /// Transport protocol.
    #[serde(default)]
    pub protocol: Protocol,

    /// Swarm publishing mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl PortBinding {
    /// Creates a TCP binding `published:target`.
    #[must_use]
    pub fn new(published: Option<&str>, target: u16) -> Self {
        Self {
            target: ContainerPort::Single(target),
            published: published.map(str::to_string),
            host_ip: None,
            protocol: Protocol::Tcp,
            mode: None,
        }
    }

    /// Parses the short syntax `[[host_ip:]published:]target[/protocol]`.
    ///
    /// IPv6 host addresses must be bracketed: `[::1]:8080:80`.
    ///
    /// # Errors
    ///
    /// Returns a message if the container port is missing or is neither a
    /// number nor a range, or the protocol is unknown.
    pub fn parse_short(spec: &str) -> Result<Self, String> {
        let (addr, protocol) = match spec.rsplit_once('/') {
            Some((addr, proto)) => (addr, Protocol::parse(proto)?),
            None => (spec, Protocol::Tcp),
        };

        let (host_ip, rest) = if let Some(stripped) = addr.strip_prefix('[') {
            let (ip, rest) = stripped
                .split_once("]:")
                .ok_or_else(|| format!("malformed IPv6 host address in '{spec}'"))?;
            (Some(ip.to_string()), rest)
        } else {
            (None, addr)
        };

        let parts: Vec<&str> = rest.split(':').collect();
        let (host_ip, published, target) = match (host_ip, parts.as_slice()) {
            (None, [target]) => (None, None, *target),
            (ip, [published, target]) => (ip, Some(*published), *target),
            (None, [ip, published, target]) => (Some((*ip).to_string()), Some(*published), *target),
            _ => return Err(format!("invalid port specification '{spec}'")),
        };

        Ok(Self {
            target: ContainerPort::parse(target, spec)?,
            published: published
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            host_ip: host_ip.filter(|ip| !ip.is_empty()),
            protocol,
            mode: None,
        })
    }

    /// The published host port, when it is a single valid port number.
    #[must_use]
    pub fn published_port(&self) -> Option<Port> {
        self.published.as_deref().and_then(Port::parse_published)
    }
}

/// A YAML scalar that may be written as a number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Number(u64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPort {
    Number(u64),
    Short(String),
    Long {
        target: Scalar,
        #[serde(default)]
        published: Option<Scalar>,
        #[serde(default)]
        host_ip: Option<String>,
        #[serde(default)]
        protocol: Option<String>,
        #[serde(default)]
        mode: Option<String>,
    },
}

impl TryFrom<RawPort> for PortBinding {
    type Error = String;

    fn try_from(raw: RawPort) -> Result<Self, Self::Error> {
        match raw {
            RawPort::Number(n) => {
                let target = u16::try_from(n).map_err(|_| format!("invalid container port {n}"))?;
                Ok(Self::new(None, target))
            }
            RawPort::Short(spec) => Self::parse_short(&spec),
            RawPort::Long {
                target,
                published,
                host_ip,
                protocol,
                mode,
            } => {
                let target_text = target.to_string();
                Ok(Self {
                    target: ContainerPort::parse(&target_text, &target_text)?,
                    published: published
                        .map(|p| p.to_string())
                        .filter(|p| !p.is_empty()),
                    host_ip,
                    protocol: protocol
                        .as_deref()
                        .map(Protocol::parse)
                        .transpose()?
                        .unwrap_or_default(),
                    mode,
                })
            }
        }
    }
}

/// A `depends_on` entry's settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Wait condition (`service_started`, `service_healthy`, ...).
    #[serde(default = "default_condition")]
    pub condition: String,

    /// Restart the dependent when this dependency restarts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart: Option<bool>,

    /// Whether the dependency must exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

fn default_condition() -> String {
    "service_started".to_string()
}

impl Default for Dependency {
    fn default() -> Self {
        Self {
            condition: default_condition(),
            restart: None,
            required: None,
        }
    }
}

impl Dependency {
    /// A dependency with the given wait condition.
    #[must_use]
    pub fn with_condition(condition: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            ..Self::default()
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDependsOn {
    List(Vec<String>),
    Map(BTreeMap<String, Option<Dependency>>),
}

fn deserialize_depends_on<'de, D>(deserializer: D) -> Result<BTreeMap<String, Dependency>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawDependsOn>::deserialize(deserializer)? {
        None => BTreeMap::new(),
        Some(RawDependsOn::List(names)) => names
            .into_iter()
            .map(|name| (name, Dependency::default()))
            .collect(),
        Some(RawDependsOn::Map(map)) => map
            .into_iter()
            .map(|(name, dep)| (name, dep.unwrap_or_default()))
            .collect(),
    })
}

fn deserialize_environment<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    let mut env = BTreeMap::new();
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => {}
        Some(Value::Sequence(entries)) => {
            for entry in entries {
                let Value::String(entry) = entry else {
                    return Err(D::Error::custom("environment list entries must be strings"));
                };
                match entry.split_once('=') {
                    Some((key, value)) => env.insert(key.to_string(), Some(value.to_string())),
                    None => env.insert(entry, None),
                };
            }
        }
        Some(Value::Mapping(map)) => {
            for (key, value) in map {
                let key = scalar_to_string(&key)
                    .ok_or_else(|| D::Error::custom("environment keys must be scalars"))?;
                let value = match value {
                    Value::Null => None,
                    other => Some(scalar_to_string(&other).ok_or_else(|| {
                        D::Error::custom(format!("environment value for '{key}' must be a scalar"))
                    })?),
                };
                env.insert(key, value);
            }
        }
        Some(_) => return Err(D::Error::custom("environment must be a list or a mapping")),
    }
    Ok(env)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Where a mount's data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountSource<'a> {
    /// A named volume.
    Named(&'a str),
    /// A host path.
    Bind(&'a str),
    /// No source (anonymous volume or tmpfs).
    Anonymous,
}

/// A service volume mount in short (`source:target[:mode]`) or long form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VolumeMount {
    /// Short syntax, kept as written.
    Short(String),
    /// Long syntax.
    Long(LongMount),
}

/// Long-syntax volume mount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongMount {
    /// Mount type (`volume`, `bind`, `tmpfs`, ...).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Volume name or host path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Path inside the container.
    pub target: String,

    /// Every other mount key.
    #[serde(flatten)]
    pub extra: Mapping,
}

fn looks_like_path(source: &str) -> bool {
    source.starts_with('/')
        || source.starts_with('.')
        || source.starts_with('~')
        || source.contains('/')
        || source.contains('\\')
}

impl VolumeMount {
    /// Classifies the mount source.
    ///
    /// # Examples
    ///
    /// ```
    /// use qec::document::{MountSource, VolumeMount};
    ///
    /// let named = VolumeMount::Short("data:/var/lib/data".into());
    /// assert_eq!(named.source(), MountSource::Named("data"));
    ///
    /// let bind = VolumeMount::Short("./conf:/etc/conf:ro".into());
    /// assert_eq!(bind.source(), MountSource::Bind("./conf"));
    ///
    /// let anonymous = VolumeMount::Short("/cache".into());
    /// assert_eq!(anonymous.source(), MountSource::Anonymous);
    /// ```
    #[must_use]
    pub fn source(&self) -> MountSource<'_> {
        match self {
            Self::Short(spec) => match spec.split_once(':') {
                Some((source, _)) if looks_like_path(source) => MountSource::Bind(source),
                Some((source, _)) if !source.is_empty() => MountSource::Named(source),
                _ => MountSource::Anonymous,
            },
            Self::Long(long) => match (long.kind.as_deref(), long.source.as_deref()) {
                (_, None | Some("")) | (Some("tmpfs" | "npipe" | "image"), _) => {
                    MountSource::Anonymous
                }
                (Some("bind"), Some(source)) => MountSource::Bind(source),
                (Some("volume"), Some(source)) => MountSource::Named(source),
                (_, Some(source)) if looks_like_path(source) => MountSource::Bind(source),
                (_, Some(source)) => MountSource::Named(source),
            },
        }
    }

    /// Replaces the mount source, keeping target and options.
    pub fn set_source(&mut self, source: &str) {
        match self {
            Self::Short(spec) => {
                if let Some((_, rest)) = spec.split_once(':') {
                    *spec = format!("{source}:{rest}");
                }
            }
            Self::Long(long) => long.source = Some(source.to_string()),
        }
    }
}

/// A service-level reference to a top-level config or secret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceRef {
    /// Just the resource name.
    Short(String),
    /// Long form with `source` and options (`target`, `mode`, ...).
    Long {
        /// Name of the referenced resource.
        source: String,
        /// Every other key.
        #[serde(flatten)]
        extra: Mapping,
    },
}

impl ResourceRef {
    /// Name of the referenced resource.
    #[must_use]
    pub fn source(&self) -> &str {
        match self {
            Self::Short(name) | Self::Long { source: name, .. } => name,
        }
    }

    /// Points the reference at another resource.
    pub fn set_source(&mut self, name: &str) {
        match self {
            Self::Short(source) | Self::Long { source, .. } => *source = name.to_string(),
        }
    }
}

/// A top-level volume definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeSpec {
    /// Driver, labels, `external`, ...
    #[serde(flatten)]
    pub options: Mapping,
}

/// A top-level network definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Driver, `external`, IPAM, ...
    #[serde(flatten)]
    pub options: Mapping,
}

/// A top-level config or secret definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileResourceSpec {
    /// Host file backing the resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// `external`, `environment`, `content`, `name`, ...
    #[serde(flatten)]
    pub options: Mapping,
}

/// A top-level config definition.
pub type ConfigSpec = FileResourceSpec;

/// A top-level secret definition.
pub type SecretSpec = FileResourceSpec;

fn nullable_map<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let map = Option::<BTreeMap<String, Option<T>>>::deserialize(deserializer)?;
    Ok(map
        .unwrap_or_default()
        .into_iter()
        .map(|(name, spec)| (name, spec.unwrap_or_default()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(yaml: &str) -> ServiceSpec {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_short_port_forms() {
        let only_target = PortBinding::parse_short("3000").unwrap();
        assert_eq!(only_target.target, ContainerPort::Single(3000));
        assert!(only_target.published.is_none());

        let mapped = PortBinding::parse_short("8080:80").unwrap();
        assert_eq!(mapped.published.as_deref(), Some("8080"));
        assert_eq!(mapped.target, ContainerPort::Single(80));
        assert_eq!(mapped.protocol, Protocol::Tcp);

        let ipv6 = PortBinding::parse_short("[::1]:5353:53/udp").unwrap();
        assert_eq!(ipv6.host_ip.as_deref(), Some("::1"));
        assert_eq!(ipv6.published.as_deref(), Some("5353"));
        assert_eq!(ipv6.protocol, Protocol::Udp);

        let random_host = PortBinding::parse_short("127.0.0.1::80").unwrap();
        assert!(random_host.published.is_none());
    }

    #[test]
    fn test_short_port_keeps_unparseable_published() {
        let range = PortBinding::parse_short("8000-8001:80").unwrap();
        assert_eq!(range.published.as_deref(), Some("8000-8001"));
        assert!(range.published_port().is_none());
    }

    #[test]
    fn test_container_port_ranges() {
        let both = PortBinding::parse_short("8000-8005:8000-8005").unwrap();
        assert_eq!(both.published.as_deref(), Some("8000-8005"));
        assert_eq!(both.target, ContainerPort::Range(8000, 8005));

        let unpublished = PortBinding::parse_short("3000-3005").unwrap();
        assert!(unpublished.published.is_none());
        assert_eq!(unpublished.target.to_string(), "3000-3005");

        let long = service("ports:\n  - target: \"3000-3005\"\n    published: \"9000-9005\"\n");
        assert_eq!(long.ports[0].target, ContainerPort::Range(3000, 3005));

        let yaml = serde_yaml::to_string(&long.ports).unwrap();
        assert!(yaml.contains("3000-3005"));
        let single = serde_yaml::to_string(&PortBinding::new(Some("80"), 80)).unwrap();
        assert!(single.contains("target: 80\n"));
    }

    #[test]
    fn test_short_port_errors() {
        assert!(PortBinding::parse_short("80:http").is_err());
        assert!(PortBinding::parse_short("3005-3000").is_err());
        assert!(PortBinding::parse_short("80:80/icmp").is_err());
        assert!(PortBinding::parse_short("a:b:c:d").is_err());
    }

    #[test]
    fn test_ports_long_and_numeric() {
        let svc = service(
            r#"
ports:
  - 9000
  - "443:443"
  - target: 53
    published: 5353
    protocol: udp
    mode: host
"#,
        );
        assert_eq!(svc.ports.len(), 3);
        assert_eq!(svc.ports[0].target, ContainerPort::Single(9000));
        assert!(svc.ports[0].published.is_none());
        assert_eq!(svc.ports[2].published.as_deref(), Some("5353"));
        assert_eq!(svc.ports[2].protocol, Protocol::Udp);
        assert_eq!(svc.ports[2].mode.as_deref(), Some("host"));
    }

    #[test]
    fn test_depends_on_list_and_map() {
        let list = service("depends_on: [db, cache]\n");
        assert_eq!(list.depends_on["db"].condition, "service_started");
        assert_eq!(list.depends_on.len(), 2);

        let map = service(
            r"
depends_on:
  db:
    condition: service_healthy
    restart: true
  cache:
",
        );
        assert_eq!(map.depends_on["db"].condition, "service_healthy");
        assert_eq!(map.depends_on["db"].restart, Some(true));
        assert_eq!(map.depends_on["cache"], Dependency::default());
    }

    #[test]
    fn test_environment_list_and_map() {
        let list = service("environment:\n  - NODE_ENV=production\n  - PASSTHROUGH\n");
        assert_eq!(
            list.environment["NODE_ENV"].as_deref(),
            Some("production")
        );
        assert_eq!(list.environment["PASSTHROUGH"], None);

        let map = service("environment:\n  DEBUG: true\n  WORKERS: 4\n  EMPTY:\n");
        assert_eq!(map.environment["DEBUG"].as_deref(), Some("true"));
        assert_eq!(map.environment["WORKERS"].as_deref(), Some("4"));
        assert_eq!(map.environment["EMPTY"], None);
    }

    #[test]
    fn test_build_short_and_long() {
        let short = service("build: ./app\n");
        assert_eq!(short.build.unwrap().context, "./app");

        let long = service("build:\n  context: ./api\n  dockerfile: Dockerfile.dev\n  target: dev\n");
        let build = long.build.unwrap();
        assert_eq!(build.context, "./api");
        assert_eq!(build.dockerfile.as_deref(), Some("Dockerfile.dev"));
        assert_eq!(build.extra.get("target"), Some(&Value::from("dev")));

        let no_context = service("build:\n  dockerfile: Dockerfile\n");
        assert_eq!(no_context.build.unwrap().context, ".");
    }

    #[test]
    fn test_unknown_service_keys_preserved() {
        let svc = service("image: nginx\ncommand: [\"nginx\", \"-g\", \"daemon off;\"]\nrestart: always\n");
        assert_eq!(svc.extra.get("restart"), Some(&Value::from("always")));

        let yaml = serde_yaml::to_string(&svc).unwrap();
        assert!(yaml.contains("restart: always"));
        assert!(yaml.contains("daemon off;"));
    }

    #[test]
    fn test_mount_sources() {
        let long_bind: VolumeMount =
            serde_yaml::from_str("type: bind\nsource: data\ntarget: /data\n").unwrap();
        assert_eq!(long_bind.source(), MountSource::Bind("data"));

        let long_named: VolumeMount =
            serde_yaml::from_str("source: data\ntarget: /data\nread_only: true\n").unwrap();
        assert_eq!(long_named.source(), MountSource::Named("data"));

        let tmpfs: VolumeMount = serde_yaml::from_str("type: tmpfs\ntarget: /tmp\n").unwrap();
        assert_eq!(tmpfs.source(), MountSource::Anonymous);
    }

    #[test]
    fn test_mount_set_source() {
        let mut short = VolumeMount::Short("data:/data:ro".into());
        short.set_source("web_data");
        assert_eq!(short, VolumeMount::Short("web_data:/data:ro".into()));

        let mut anonymous = VolumeMount::Short("/cache".into());
        anonymous.set_source("ignored");
        assert_eq!(anonymous, VolumeMount::Short("/cache".into()));
    }

    #[test]
    fn test_resource_ref_forms() {
        let refs: Vec<ResourceRef> =
            serde_yaml::from_str("- app_config\n- source: tls\n  target: /etc/tls.pem\n").unwrap();
        assert_eq!(refs[0].source(), "app_config");
        assert_eq!(refs[1].source(), "tls");

        let mut long = refs[1].clone();
        long.set_source("web_tls");
        let yaml = serde_yaml::to_string(&long).unwrap();
        assert!(yaml.contains("source: web_tls"));
        assert!(yaml.contains("target: /etc/tls.pem"));
    }

    #[test]
    fn test_null_resources_become_defaults() {
        let file: ComposeFile = serde_yaml::from_str(
            "version: '3'\nname: shop\nservices:\n  web:\n    image: nginx\nvolumes:\n  data:\nnetworks:\n  shared:\n",
        )
        .unwrap();
        assert_eq!(file.name.as_deref(), Some("shop"));
        assert!(file.resources.volumes["data"].options.is_empty());
        assert!(file.resources.networks.contains_key("shared"));
    }
}
