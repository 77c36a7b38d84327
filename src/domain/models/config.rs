use serde::{Deserialize, Serialize};

/// Main configuration structure for the recorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RecorderConfig {
    /// Record client implementation to use. Only `http` is built in.
    #[serde(default = "default_client")]
    pub client: String,

    /// Record API connection parameters.
    #[serde(default)]
    pub api: ApiConfig,

    /// Worker pool size for result submission (0-4). 0 runs every
    /// submission inline, the deterministic mode.
    #[serde(default)]
    pub callback_threads: usize,

    /// Labels attached to every run.
    #[serde(default)]
    pub default_labels: Vec<String>,

    /// Invocation argument keys recorded as `key:value` labels.
    #[serde(default = "default_argument_labels")]
    pub argument_labels: Vec<String>,

    /// Invocation argument keys redacted before run creation.
    #[serde(default = "default_ignored_arguments")]
    pub ignored_arguments: Vec<String>,

    /// Top-level fact keys redacted from results. The special value `all`
    /// replaces the whole fact payload.
    #[serde(default = "default_ignored_facts")]
    pub ignored_facts: Vec<String>,

    /// Path substrings whose file content is replaced by a placeholder.
    #[serde(default)]
    pub ignored_files: Vec<String>,

    /// The engine's local temp directory. Configurable in the engine
    /// itself, so the hosting adapter passes it in; it joins
    /// `ignored_files` at sanitizer construction.
    #[serde(default)]
    pub engine_tmp_dir: Option<String>,

    /// Remap `localhost`/`127.0.0.1` result hosts to the controller
    /// hostname.
    #[serde(default)]
    pub localhost_as_hostname: bool,

    /// Format used when resolving the controller hostname.
    #[serde(default)]
    pub localhost_as_hostname_format: HostnameFormat,

    /// Record the controller hostname on the run.
    #[serde(default = "default_true")]
    pub record_controller: bool,

    /// Explicit controller name, overriding resolution.
    #[serde(default)]
    pub record_controller_name: Option<String>,

    /// Record the acting user on the run.
    #[serde(default = "default_true")]
    pub record_user: bool,

    /// Explicit user name, overriding OS lookup.
    #[serde(default)]
    pub record_user_name: Option<String>,

    /// Record module output on results. When false, content is replaced by
    /// a placeholder.
    #[serde(default = "default_true")]
    pub record_task_content: bool,
}

fn default_client() -> String {
    "http".to_string()
}

fn default_argument_labels() -> Vec<String> {
    ["remote_user", "check", "tags", "subset"]
        .map(String::from)
        .to_vec()
}

fn default_ignored_arguments() -> Vec<String> {
    vec!["extra_vars".to_string()]
}

fn default_ignored_facts() -> Vec<String> {
    vec!["all".to_string()]
}

const fn default_true() -> bool {
    true
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            client: default_client(),
            api: ApiConfig::default(),
            callback_threads: 0,
            default_labels: vec![],
            argument_labels: default_argument_labels(),
            ignored_arguments: default_ignored_arguments(),
            ignored_facts: default_ignored_facts(),
            ignored_files: vec![],
            engine_tmp_dir: None,
            localhost_as_hostname: false,
            localhost_as_hostname_format: HostnameFormat::default(),
            record_controller: default_true(),
            record_controller_name: None,
            record_user: default_true(),
            record_user_name: None,
            record_task_content: default_true(),
        }
    }
}

/// Record API connection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ApiConfig {
    /// Base URL of the record service.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bearer token, when the service uses token auth.
    #[serde(default)]
    pub token: Option<String>,

    /// Username for basic auth.
    #[serde(default)]
    pub username: Option<String>,

    /// Password for basic auth.
    #[serde(default)]
    pub password: Option<String>,

    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8000".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            token: None,
            username: None,
            password: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// How the controller hostname is rendered when recorded or substituted
/// for localhost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostnameFormat {
    /// The name as reported by the OS, which is often already fully
    /// qualified.
    Fqdn,
    /// First dot-separated segment of the qualified name.
    FqdnShort,
    /// The raw OS hostname.
    Hostname,
    /// First dot-separated segment of the raw hostname.
    HostnameShort,
}

impl Default for HostnameFormat {
    fn default() -> Self {
        Self::Fqdn
    }
}

impl HostnameFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fqdn => "fqdn",
            Self::FqdnShort => "fqdn_short",
            Self::Hostname => "hostname",
            Self::HostnameShort => "hostname_short",
        }
    }
}
