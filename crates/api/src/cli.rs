//! Command-line arguments

use std::path::PathBuf;

use anyhow::{bail, Context};

pub const USAGE: &str = "\
Usage: leadsync [OPTIONS]

Options:
  -c, --config <PATH>    Configuration file (.toml or .json)
      --refresh-snapshot Pull the remote table into the local snapshot first
      --no-refresh       Skip the snapshot refresh even if configured
  -h, --help             Print this help";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    /// `Some` when a flag overrides `sync.refresh_snapshot`.
    pub refresh_snapshot: Option<bool>,
    pub help: bool,
}

impl CliArgs {
    /// Parses arguments, skipping the program name.
    pub fn parse<I, S>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter().map(Into::into).skip(1);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-c" | "--config" => {
                    let path = args.next().with_context(|| format!("{arg} needs a path"))?;
                    parsed.config = Some(PathBuf::from(path));
                }
                "--refresh-snapshot" => parsed.refresh_snapshot = Some(true),
                "--no-refresh" => parsed.refresh_snapshot = Some(false),
                "-h" | "--help" => parsed.help = true,
                other => match other.strip_prefix("--config=") {
                    Some(path) => parsed.config = Some(PathBuf::from(path)),
                    None => bail!("unknown argument: {other}\n\n{USAGE}"),
                },
            }
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_config_and_flags() {
        let args = CliArgs::parse(["leadsync", "--config", "conf/leadsync.toml", "--no-refresh"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("conf/leadsync.toml")));
        assert_eq!(args.refresh_snapshot, Some(false));

        let args = CliArgs::parse(["leadsync", "--config=x.json", "--refresh-snapshot"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("x.json")));
        assert_eq!(args.refresh_snapshot, Some(true));
    }

    #[test]
    fn rejects_unknown_and_incomplete_arguments() {
        assert!(CliArgs::parse(["leadsync", "--verbose"]).is_err());
        assert!(CliArgs::parse(["leadsync", "-c"]).is_err());
        assert_eq!(CliArgs::parse(["leadsync"]).unwrap(), CliArgs::default());
    }
}
