//! Minimal CLI parsing for the local collection front end.

use std::path::PathBuf;

use anyhow::{Result, bail};

use inline_media::MediaKind;

pub const USAGE: &str = "\
usage: inline-media [--collection <dir>] <command>

commands:
  convert --audio|--video <source>...   convert sources into the collection and print the HTML
  check [--yes]                          move orphaned inline media to the trash";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Convert { kind: MediaKind, sources: Vec<String> },
    Check { assume_yes: bool },
}

#[derive(Debug, PartialEq, Eq)]
pub struct CliOptions {
    pub collection_override: Option<PathBuf>,
    pub command: Command,
}

impl CliOptions {
    pub fn from_args() -> Result<Self> {
        Self::parse(std::env::args().skip(1))
    }

    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut collection_override = None;
        let mut command_name = None;
        let mut kind = None;
        let mut assume_yes = false;
        let mut sources = Vec::new();

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--collection" => match args.next() {
                    Some(value) => collection_override = Some(PathBuf::from(value)),
                    None => bail!("--collection needs a directory"),
                },
                _ if arg.starts_with("--collection=") => {
                    if let Some((_, value)) = arg.split_once('=') {
                        collection_override = Some(PathBuf::from(value));
                    }
                }
                "--audio" => kind = Some(MediaKind::Audio),
                "--video" => kind = Some(MediaKind::Video),
                "--yes" | "-y" => assume_yes = true,
                "convert" | "check" if command_name.is_none() => command_name = Some(arg),
                _ if arg.starts_with("--") => bail!("unknown option '{arg}'"),
                _ => sources.push(arg),
            }
        }

        let command = match command_name.as_deref() {
            Some("convert") => {
                let Some(kind) = kind else {
                    bail!("convert needs --audio or --video");
                };
                if sources.is_empty() {
                    bail!("convert needs at least one source");
                }
                Command::Convert { kind, sources }
            }
            Some("check") => Command::Check { assume_yes },
            _ => bail!("missing command"),
        };

        Ok(Self {
            collection_override,
            command,
        })
    }
}
