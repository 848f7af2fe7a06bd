use std::path::PathBuf;

use clap::Parser;

use crate::config::DEFAULT_CONFIG_FILE;

#[derive(Parser)]
#[command(name = "kong-provision")]
#[command(about = "Provision Kong APIs, consumers and plugins from a YAML document")]
#[command(version)]
pub struct Cli {
    /// Path to the provisioning document
    ///
    /// A kong_config.yaml next to the binary takes precedence.
    pub config: Option<PathBuf>,

    /// Kong admin API base URL (overrides `kong` in the document)
    #[arg(short, long, env = "KONG_ADMIN_URL")]
    pub kong: Option<String>,

    /// Enterprise store file (defaults to ~/.kong-provision/enterprises.json)
    #[arg(long, env = "KONG_PROVISION_STORE")]
    pub store: Option<PathBuf>,
}

pub fn usage_hint() -> String {
    format!(
        "Usage:\n  kong-provision path/to/{DEFAULT_CONFIG_FILE}\n\n\
         ** Unable to find {DEFAULT_CONFIG_FILE} in current directory."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_config() {
        let cli = Cli::try_parse_from(["kong-provision", "conf/kong.yaml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("conf/kong.yaml")));
        assert!(cli.store.is_none());
    }

    #[test]
    fn test_kong_override_flag() {
        let args = ["kong-provision", "--kong", "http://kong:8001", "k.yaml"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.kong.as_deref(), Some("http://kong:8001"));
    }

    #[test]
    fn test_usage_hint_mentions_default_file() {
        assert!(usage_hint().contains("Unable to find kong_config.yaml"));
    }
}
