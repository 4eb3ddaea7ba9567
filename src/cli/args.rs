use clap::{Args, Parser, Subcommand};

/// Nexus bootstrap - resolve features and activate modules
#[derive(Parser)]
#[command(name = "nexus-bootstrap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full bootstrap and keep running until Ctrl-C
    Run {
        #[command(flatten)]
        config: ConfigArgs,

        /// Feature catalog (JSON). Defaults to <base>/etc/features.json
        #[arg(long, env = "NEXUS_FEATURE_CATALOG")]
        catalog: Option<String>,
    },
    /// Print the resolved properties without installing anything (dry-run)
    Resolve {
        #[command(flatten)]
        config: ConfigArgs,

        /// Print as JSON instead of key=value lines
        #[arg(long)]
        json: bool,
    },
}

/// Where bootstrap properties come from.
#[derive(Args)]
pub struct ConfigArgs {
    /// Installation directory (sets karaf.base)
    #[arg(long, env = "KARAF_BASE")]
    pub base_dir: Option<String>,

    /// Data/work directory (sets karaf.data)
    #[arg(long, env = "KARAF_DATA")]
    pub data_dir: Option<String>,

    /// Default properties file. Defaults to <base>/etc/nexus-default.properties
    #[arg(long, env = "NEXUS_DEFAULT_PROPERTIES")]
    pub default_properties: Option<String>,

    /// User properties file. Defaults to <data>/etc/nexus.properties
    #[arg(long, env = "NEXUS_PROPERTIES")]
    pub properties: Option<String>,

    /// Override a property (repeatable), e.g. --set nexus.jwt.enabled=true
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,
}
