use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{Args, Command, CommandFactory, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "uscode",
    version,
    about = "Extract the United States Code table of contents as JSON"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Options the selected subcommand does not define.
    #[arg(skip)]
    pub ignored: Vec<String>,
}

impl Cli {
    pub fn parse_lenient() -> Self {
        Self::try_parse_lenient_from(std::env::args_os()).unwrap_or_else(|err| err.exit())
    }

    /// Parses `raw` after setting aside `--name` and `--name=value` options
    /// the chosen subcommand does not know, wherever they appear.
    pub fn try_parse_lenient_from<I, T>(raw: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let (known, ignored) = split_unrecognized(&Self::command(), raw);
        let mut cli = Self::try_parse_from(known)?;
        cli.ignored = ignored;
        Ok(cli)
    }
}

fn split_unrecognized<I, T>(command: &Command, raw: I) -> (Vec<OsString>, Vec<String>)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut known = Vec::new();
    let mut ignored = Vec::new();
    let mut subcommand: Option<&Command> = None;
    let mut escaped = false;

    for (index, token) in raw.into_iter().map(Into::<OsString>::into).enumerate() {
        if index == 0 || escaped {
            known.push(token);
            continue;
        }
        let Some(text) = token.to_str() else {
            known.push(token);
            continue;
        };

        if text == "--" {
            escaped = true;
        } else if let Some(sub) = subcommand {
            if let Some(option) = text.strip_prefix("--") {
                let name = option.split_once('=').map_or(option, |(name, _)| name);
                if !defines_long(sub, name) {
                    ignored.push(text.to_string());
                    continue;
                }
            }
        } else {
            subcommand = command.find_subcommand(text);
        }

        known.push(token);
    }

    (known, ignored)
}

fn defines_long(command: &Command, name: &str) -> bool {
    name == "help"
        || command
            .get_arguments()
            .any(|arg| arg.get_long() == Some(name))
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Structure(StructureArgs),
    Status(StatusArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum SourceFormat {
    Html,
    Xml,
}

impl SourceFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Xml => "xml",
        }
    }

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Html => &["htm", "html"],
            Self::Xml => &["xml"],
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    #[arg(long, default_value = "data/uscode.house.gov")]
    pub cache_root: PathBuf,

    #[arg(long, value_enum, default_value_t = SourceFormat::Xml)]
    pub format: SourceFormat,

    #[arg(long, default_value = "uscprelim")]
    pub year: String,
}

impl SourceArgs {
    pub fn source_directory(&self) -> PathBuf {
        match self.format {
            SourceFormat::Html => self.cache_root.join("xhtml").join(&self.year),
            SourceFormat::Xml => self.cache_root.join("xml"),
        }
    }

    /// Legacy releases live side by side, so their manifests are per year.
    pub fn manifest_path(&self) -> PathBuf {
        let file_name = match self.format {
            SourceFormat::Html => format!("html_{}_inventory.json", self.year),
            SourceFormat::Xml => "xml_inventory.json".to_string(),
        };
        manifest_directory(&self.cache_root).join(file_name)
    }
}

pub fn manifest_directory(cache_root: &Path) -> PathBuf {
    cache_root.join("manifests")
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StructureArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long, default_value_t = false)]
    pub sections: bool,

    #[arg(long, default_value_t = false)]
    pub debug: bool,

    #[arg(long)]
    pub limit: Option<usize>,

    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "data/uscode.house.gov")]
    pub cache_root: PathBuf,
}
