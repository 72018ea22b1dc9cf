//! Command-line surface for `proxyboard`.

#![deny(clippy::all, clippy::pedantic)]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use proxyboard::config::GlobalOverrides;
use proxyboard_api_types::{ClientDirective, ResourceKind};

#[derive(Parser, Debug)]
#[command(
    name = "proxyboard",
    version,
    about = "Reverse-proxy manager console",
    long_about = None
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOverrides,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the session token
    Login(LoginArgs),
    /// Forget the stored session token
    Logout,
    /// Show the signed-in user and effective permissions
    Whoami,
    /// Resource counts and certificate expiry overview
    Dashboard,
    /// Proxy hosts
    ProxyHosts(ProxyHostsArgs),
    /// Redirection hosts
    RedirectionHosts(ResourceArgs),
    /// 404 hosts
    DeadHosts(ResourceArgs),
    /// TCP/UDP streams
    Streams(ResourceArgs),
    /// Access lists
    AccessLists(AccessListsArgs),
    /// SSL certificates
    Certificates(CertificatesArgs),
    /// User administration (admins only)
    Users(UsersArgs),
    /// Global settings
    Settings(SettingsArgs),
    /// Audit log
    Audit(AuditArgs),
    /// Search every resource you can view
    Search(SearchArgs),
    /// Export one resource type or a bundle of all of them
    Export(ExportArgs),
    /// Import an export file
    Import(ImportArgs),
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email
    #[arg(long, env = "PROXYBOARD_IDENTITY")]
    pub identity: String,

    /// Path to a file containing the password (takes precedence over env)
    #[arg(long, value_name = "PATH")]
    pub secret_file: Option<PathBuf>,

    /// Password from env (CLI flag intentionally disabled to avoid shell history leaks)
    #[arg(hide = true, env = "PROXYBOARD_SECRET")]
    pub secret_env: Option<String>,
}

/// Table controls shared by every listing.
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Case-insensitive substring search
    #[arg(long)]
    pub search: Option<String>,

    /// Filter as `ID=VALUE`, e.g. `status=online`; repeatable
    #[arg(long = "filter", value_name = "ID=VALUE")]
    pub filters: Vec<String>,

    /// Sort as `COLUMN[:asc|desc]`
    #[arg(long, value_name = "COLUMN[:DIR]")]
    pub sort: Option<String>,

    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Collapse a group by key; repeatable
    #[arg(long = "collapse", value_name = "GROUP")]
    pub collapsed: Vec<String>,

    /// Print the visible page as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct ResourceArgs {
    #[command(subcommand)]
    pub action: ResourceCmd,
}

#[derive(Subcommand, Debug)]
pub enum ResourceCmd {
    /// List rows with search, filters, sorting and paging
    List(ListArgs),
    /// Show one record as JSON
    Get { id: i64 },
    /// Create from a JSON file; validated before sending
    Create {
        #[arg(long, value_name = "PATH")]
        file: PathBuf,
    },
    /// Replace the editable fields of a record from a JSON file
    Update {
        id: i64,
        #[arg(long, value_name = "PATH")]
        file: PathBuf,
    },
    /// Delete one or more records
    Delete {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Enable one or more records
    Enable {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
    },
    /// Disable one or more records
    Disable {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Parser, Debug)]
pub struct ProxyHostsArgs {
    #[command(subcommand)]
    pub action: ProxyHostsCmd,
}

#[derive(Subcommand, Debug)]
pub enum ProxyHostsCmd {
    #[command(flatten)]
    Common(ResourceCmd),
    /// Create a proxy host from flags
    Add(ProxyHostAddArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ProxyHostAddArgs {
    /// Domain name; repeatable
    #[arg(long = "domain", required = true)]
    pub domains: Vec<String>,
    #[arg(long)]
    pub forward_host: String,
    #[arg(long)]
    pub forward_port: u32,
    #[arg(long, value_enum, default_value_t = SchemeArg::Http)]
    pub scheme: SchemeArg,
    #[arg(long, default_value_t = 0)]
    pub certificate_id: i64,
    #[arg(long, default_value_t = 0)]
    pub access_list_id: i64,
    #[arg(long)]
    pub ssl_forced: bool,
    #[arg(long)]
    pub http2: bool,
    #[arg(long)]
    pub hsts: bool,
    #[arg(long)]
    pub block_exploits: bool,
    #[arg(long)]
    pub websockets: bool,
    #[arg(long)]
    pub caching: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SchemeArg {
    Http,
    Https,
}

impl SchemeArg {
    pub fn as_str(self) -> &'static str {
        match self {
            SchemeArg::Http => "http",
            SchemeArg::Https => "https",
        }
    }
}

#[derive(Parser, Debug)]
pub struct AccessListsArgs {
    #[command(subcommand)]
    pub action: AccessListsCmd,
}

#[derive(Subcommand, Debug)]
pub enum AccessListsCmd {
    #[command(flatten)]
    Common(ResourceCmd),
    /// Show satisfy mode, users and client rules in evaluation order
    Rules { id: i64 },
    /// Replace the client rule at a position (1-based)
    SetRule {
        id: i64,
        #[arg(long)]
        position: usize,
        #[arg(long)]
        address: String,
        #[arg(long, value_enum)]
        directive: DirectiveArg,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DirectiveArg {
    Allow,
    Deny,
}

impl From<DirectiveArg> for ClientDirective {
    fn from(value: DirectiveArg) -> Self {
        match value {
            DirectiveArg::Allow => ClientDirective::Allow,
            DirectiveArg::Deny => ClientDirective::Deny,
        }
    }
}

#[derive(Parser, Debug)]
pub struct CertificatesArgs {
    #[command(subcommand)]
    pub action: CertificatesCmd,
}

#[derive(Subcommand, Debug)]
pub enum CertificatesCmd {
    #[command(flatten)]
    Common(ResourceCmd),
    /// Certificates expiring within the given number of days
    Expiring {
        #[arg(long, default_value_t = 30)]
        within_days: i64,
    },
    /// Ask the backend to renew a certificate
    Renew { id: i64 },
}

#[derive(Parser, Debug)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub action: UsersCmd,
}

#[derive(Subcommand, Debug)]
pub enum UsersCmd {
    List(ListArgs),
    Get {
        id: i64,
    },
    /// Create from a JSON file
    Create {
        #[arg(long, value_name = "PATH")]
        file: PathBuf,
    },
    Delete {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Set per-resource permission levels (hidden|view|manage)
    Permissions(PermissionsArgs),
    /// Set a user's password; the new password is read from a file or env
    Password {
        id: i64,
        #[arg(long, value_name = "PATH")]
        secret_file: Option<PathBuf>,
        #[arg(hide = true, env = "PROXYBOARD_NEW_SECRET")]
        secret_env: Option<String>,
    },
    /// Obtain a session token acting as another user
    LoginAs {
        id: i64,
        /// Replace the stored session with the issued token
        #[arg(long)]
        store: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct PermissionsArgs {
    pub id: i64,
    /// Row visibility (all|user)
    #[arg(long)]
    pub visibility: Option<String>,
    #[arg(long)]
    pub proxy_hosts: Option<String>,
    #[arg(long)]
    pub redirection_hosts: Option<String>,
    #[arg(long)]
    pub dead_hosts: Option<String>,
    #[arg(long)]
    pub streams: Option<String>,
    #[arg(long)]
    pub access_lists: Option<String>,
    #[arg(long)]
    pub certificates: Option<String>,
}

#[derive(Parser, Debug)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub action: SettingsCmd,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCmd {
    List,
    Get {
        id: String,
    },
    /// Set a value; parsed as JSON when possible, otherwise sent as a string
    Set {
        id: String,
        value: String,
    },
}

#[derive(Parser, Debug)]
pub struct AuditArgs {
    #[command(subcommand)]
    pub action: AuditCmd,
}

#[derive(Subcommand, Debug)]
pub enum AuditCmd {
    List {
        #[arg(long, default_value_t = 50)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    pub query: String,
    /// Also list the matching quick-create actions
    #[arg(long)]
    pub actions: bool,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Resource type; omit for a bundle of every viewable type
    #[arg(long, value_parser = parse_kind)]
    pub kind: Option<ResourceKind>,

    /// Only export these ids (requires --kind)
    #[arg(long = "id", requires = "kind")]
    pub ids: Vec<i64>,

    /// Write to a file instead of stdout
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    pub file: PathBuf,

    /// skip | rename | overwrite; defaults to the configured strategy
    #[arg(long)]
    pub strategy: Option<String>,

    /// Import only these item positions (1-based, as shown by --dry-run)
    #[arg(long = "select", value_name = "N")]
    pub select: Vec<usize>,

    /// Show the parsed items without importing
    #[arg(long)]
    pub dry_run: bool,
}

fn parse_kind(value: &str) -> Result<ResourceKind, String> {
    let kind = value
        .parse::<ResourceKind>()
        .map_err(|err| err.to_string())?;
    if kind == ResourceKind::Users {
        return Err("users cannot be exported".to_string());
    }
    Ok(kind)
}
