//! CLI Tooling
//!
//! Command-line interface over a single store file: inspect the info table, browse
//! and edit the tree, move content in and out.

use crate::config::{ConfigLoader, SqlfsConfig};
use crate::error::{FsError, SetupError};
use crate::logging::LoggingConfig;
use crate::payload::SimplePayload;
use crate::store::{InfoField, SqlFs};
use crate::tree::name::validate_name;
use crate::tree::{Directory, FsNode, Node, NodeRecord};
use crate::types::NodeKind;
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

/// SQLFS CLI - a directory tree stored in a SQLite file
#[derive(Parser, Debug)]
#[command(name = "sqlfs")]
#[command(about = "Hierarchical file system stored as rows in a SQLite database")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Store file (created if missing)
    #[arg(long, default_value = "sqlfs.db")]
    pub db: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show store metadata and row counts
    Info {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Set the store label
    Label { value: String },
    /// List a directory
    Ls {
        #[arg(default_value = "/")]
        path: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Create a directory
    Mkdir {
        path: String,
        /// Create missing parents as well
        #[arg(short, long)]
        parents: bool,
    },
    /// Write a file, creating it if needed
    Put {
        path: String,
        /// Store this text
        #[arg(long, conflicts_with = "from")]
        text: Option<String>,
        /// Store the bytes of this host file
        #[arg(long)]
        from: Option<PathBuf>,
    },
    /// Print a file
    Cat { path: String },
    /// Delete a file or a directory with everything in it
    Rm { path: String },
    /// Move a node into another directory (absolute, or relative to its parent)
    Mv { path: String, dest: String },
    /// Rename a node in place
    Rename { path: String, name: String },
    /// Print the whole tree
    Tree,
}

/// Errors surfaced by CLI commands
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),
}

impl Cli {
    /// Configuration from `--config` (or the default sources).
    pub fn load_config(&self) -> Result<SqlfsConfig, SetupError> {
        match &self.config {
            Some(path) => ConfigLoader::load_from_file(path),
            None => ConfigLoader::load(),
        }
    }

    /// Apply the `--log-*` flags on top of `base`.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        config
    }
}

/// Open store plus the configuration it was opened with
pub struct CliContext {
    fs: SqlFs,
}

impl CliContext {
    pub fn new(db: PathBuf, config: &SqlfsConfig) -> Result<Self, CliError> {
        let fs = SqlFs::create_with_config::<SimplePayload>(&db, &config.store)?;
        if fs.fresh_tables_created() {
            info!(path = %db.display(), "initialized new store");
        }
        Ok(Self { fs })
    }

    pub fn fs(&self) -> &SqlFs {
        &self.fs
    }

    pub fn execute(&self, command: &Commands) -> Result<String, CliError> {
        match command {
            Commands::Info { format } => self.info(format),
            Commands::Label { value } => {
                self.fs.set_label(value)?;
                Ok(format!("Label set to {}", value))
            }
            Commands::Ls { path, format } => self.ls(path, format),
            Commands::Mkdir { path, parents } => {
                let dir = if *parents {
                    self.mkdir_all(path)?
                } else {
                    let (parent, name) = split_parent(path)?;
                    self.fs.directory(&parent)?.add_directory(&name)?
                };
                Ok(format!("Created directory {} (id {})", path, dir.id()))
            }
            Commands::Put { path, text, from } => self.put(path, text.as_deref(), from.as_ref()),
            Commands::Cat { path } => {
                let content: SimplePayload = self.fs.file(path)?.read_payload()?;
                Ok(match content {
                    SimplePayload::Text(s) => s,
                    SimplePayload::Binary(b) => String::from_utf8_lossy(&b).into_owned(),
                })
            }
            Commands::Rm { path } => {
                self.fs.node(path)?.delete()?;
                Ok(format!("Removed {}", path))
            }
            Commands::Mv { path, dest } => {
                self.fs.node(path)?.move_to_path(dest)?;
                Ok(format!("Moved {} to {}", path, dest))
            }
            Commands::Rename { path, name } => {
                self.fs.node(path)?.rename(name)?;
                Ok(format!("Renamed {} to {}", path, name.trim()))
            }
            Commands::Tree => self.tree(),
        }
    }

    fn info(&self, format: &str) -> Result<String, CliError> {
        let mut fields = Vec::new();
        for field in InfoField::ALL {
            fields.push((field.as_str(), self.fs.info_field(field)?.unwrap_or_default()));
        }
        let nodes = self.fs.node_count()?;
        let payloads = self.fs.payload_count()?;

        if format == "json" {
            let mut value = json!({
                "path": self.fs.path(),
                "nodes": nodes,
                "payloads": payloads,
            });
            for (name, v) in &fields {
                value[*name] = json!(v);
            }
            return Ok(serde_json::to_string_pretty(&value)?);
        }

        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Field", "Value"]);
        table.add_row(vec!["path".to_string(), self.fs.path().display().to_string()]);
        for (name, v) in fields {
            table.add_row(vec![name.to_string(), v]);
        }
        table.add_row(vec!["nodes".to_string(), nodes.to_string()]);
        table.add_row(vec!["payloads".to_string(), payloads.to_string()]);
        Ok(table.to_string())
    }

    fn ls(&self, path: &str, format: &str) -> Result<String, CliError> {
        let records: Vec<NodeRecord> = match self.fs.node(path)? {
            Node::Directory(dir) => dir
                .children()?
                .unwrap_or_default()
                .iter()
                .map(|n| n.record())
                .collect::<Result<_, _>>()?,
            file @ Node::File(_) => vec![file.record()?],
        };

        if format == "json" {
            return Ok(serde_json::to_string_pretty(&records)?);
        }
        if records.is_empty() {
            return Ok(format!("{} is empty", path));
        }
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Name", "Kind", "Size", "Modified", "Id"]);
        for r in &records {
            table.add_row(vec![
                r.name.clone(),
                r.kind.to_string(),
                r.size.to_string(),
                crate::filetime::readable_utc(r.modified),
                r.id.to_string(),
            ]);
        }
        Ok(table.to_string())
    }

    fn mkdir_all(&self, path: &str) -> Result<Directory, CliError> {
        let mut dir = self.fs.directory("/")?;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            dir = match dir.child(segment) {
                Ok(Node::Directory(existing)) => existing,
                Ok(Node::File(_)) => return Err(FsError::NotDirInPath(segment.to_string()).into()),
                Err(FsError::ChildNotFound(_)) => dir.add_directory(segment)?,
                Err(e) => return Err(e.into()),
            };
        }
        Ok(dir)
    }

    fn put(
        &self,
        path: &str,
        text: Option<&str>,
        from: Option<&PathBuf>,
    ) -> Result<String, CliError> {
        let content = match (text, from) {
            (Some(t), _) => SimplePayload::text(t),
            (None, Some(host)) => SimplePayload::binary(std::fs::read(host)?),
            (None, None) => {
                return Err(CliError::Usage("put needs --text or --from".to_string()))
            }
        };
        let (parent, raw) = split_parent(path)?;
        let name = validate_name(&raw)?;
        let dir = self.fs.directory(&parent)?;
        let file = match dir.child(&name) {
            Ok(Node::File(existing)) => existing,
            Ok(Node::Directory(_)) => {
                return Err(CliError::Usage(format!("{} is a directory", path)))
            }
            Err(FsError::ChildNotFound(_)) => dir.add_file(&name)?,
            Err(e) => return Err(e.into()),
        };
        file.save_payload(&content)?;
        Ok(format!("Wrote {} bytes to {}", file.size()?, path))
    }

    fn tree(&self) -> Result<String, CliError> {
        let mut out = String::from("/\n");
        let mut pending: Vec<(Node, usize)> = self
            .fs
            .root()?
            .children()?
            .unwrap_or_default()
            .into_iter()
            .rev()
            .map(|n| (n, 1))
            .collect();
        while let Some((node, depth)) = pending.pop() {
            let name = node.name()?;
            out.push_str(&"  ".repeat(depth));
            out.push_str(&name);
            if node.kind() == NodeKind::Directory {
                out.push('/');
            }
            out.push('\n');
            if let Node::Directory(dir) = &node {
                if let Some(children) = dir.children()? {
                    pending.extend(children.into_iter().rev().map(|c| (c, depth + 1)));
                }
            }
        }
        Ok(out.trim_end().to_string())
    }
}

/// Split an absolute path into its parent directory path and final name.
pub fn split_parent(path: &str) -> Result<(String, String), CliError> {
    let trimmed = path.trim_end_matches('/');
    if !trimmed.starts_with('/') {
        return Err(FsError::MustBeAbsolute(path.to_string()).into());
    }
    match trimmed.rsplit_once('/') {
        Some((parent, name)) if !name.is_empty() => {
            let parent = if parent.is_empty() { "/" } else { parent };
            Ok((parent.to_string(), name.to_string()))
        }
        _ => Err(FsError::EmptyPath.into()),
    }
}
