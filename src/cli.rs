use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "slotsync")]
#[command(about = "Sync Schedule I save slots with a cloud bucket")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the config and every save slot
    Status,
    Config {
        #[command(subcommand)]
        cmd: ConfigCmd,
    },
    /// List buckets the credentials can see
    Buckets,
    /// Upload the selected slot under a new timestamped key
    Upload,
    /// Replace the selected slot with the shared save
    Download {
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Upload the selected slot as the shared save others download
    Publish,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCmd {
    Show,
    Set {
        #[arg(long)]
        steamid: Option<String>,
        /// 1-based save slot
        #[arg(long)]
        slot: Option<u8>,
        #[arg(long)]
        bucket: Option<String>,
        #[arg(long)]
        blob: Option<String>,
    },
    /// Print the config directory
    Dir {
        /// Also open it in the file manager
        #[arg(long)]
        open: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_config_set() {
        let cli = Cli::try_parse_from(["slotsync", "config", "set", "--slot", "3", "--bucket", "b"])
            .unwrap();
        match cli.cmd {
            Command::Config {
                cmd: ConfigCmd::Set { steamid, slot, bucket, blob },
            } => {
                assert_eq!(steamid, None);
                assert_eq!(slot, Some(3));
                assert_eq!(bucket.as_deref(), Some("b"));
                assert_eq!(blob, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_download_yes() {
        let cli = Cli::try_parse_from(["slotsync", "download", "-y"]).unwrap();
        assert!(matches!(cli.cmd, Command::Download { yes: true }));
    }
}
