use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Concatenate text files into a single clipboard payload"
)]
pub struct Cli {
    /// Files or directories to collect
    pub paths: Vec<PathBuf>,

    /// Wrap each file in <file> tags
    #[arg(long, overrides_with = "no_xml")]
    pub xml: bool,

    /// Emit plain text blocks instead of tags
    #[arg(long)]
    pub no_xml: bool,

    /// Annotate each file with its path
    #[arg(long, overrides_with = "no_path")]
    pub path: bool,

    /// Leave file paths out of the output
    #[arg(long)]
    pub no_path: bool,

    /// Show paths relative to the current directory
    #[arg(long)]
    pub relative: bool,

    /// Patterns for files or directories to exclude while walking
    #[arg(long, num_args = 1..)]
    pub exclude: Vec<String>,

    /// Patterns for collected files to leave unselected
    #[arg(long, num_args = 1..)]
    pub skip: Vec<String>,

    /// Print the collected files instead of copying their content
    #[arg(long)]
    pub list: bool,

    /// Print the payload instead of using the clipboard
    #[arg(long)]
    pub stdout: bool,

    /// Settings file to use instead of ~/.config/file_summarizer/settings.toml
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write log records to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// `Some` when either tag flag was given; the last one wins.
    pub fn xml_override(&self) -> Option<bool> {
        toggle(self.xml, self.no_xml)
    }

    pub fn path_override(&self) -> Option<bool> {
        toggle(self.path, self.no_path)
    }
}

fn toggle(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the allowed and blocked file types
    #[command(subcommand)]
    Types(TypesCommand),
}

#[derive(Subcommand, Debug)]
pub enum TypesCommand {
    /// Show the current lists
    List,
    /// Accept extensions (e.g. `rs`, `.toml`) or exact file names
    Allow {
        #[arg(required = true)]
        types: Vec<String>,
    },
    /// Stop accepting extensions or file names
    Disallow {
        #[arg(required = true)]
        types: Vec<String>,
    },
    /// Always reject extensions or file names
    Block {
        #[arg(required = true)]
        types: Vec<String>,
    },
    /// Remove entries from the block list
    Unblock {
        #[arg(required = true)]
        types: Vec<String>,
    },
    /// Restore the built-in lists
    Reset,
}
