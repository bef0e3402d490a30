//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Upload command arguments.
#[derive(Debug, Args)]
pub struct UploadCommand {
    /// Image file to upload
    pub file: PathBuf,

    /// JPEG quality to request (1-100), overrides the configured value
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Exit without waiting for the previous results to refresh
    #[arg(long)]
    pub no_refresh: bool,
}

/// Recent results command arguments.
#[derive(Debug, Args)]
pub struct RecentCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Download command arguments.
#[derive(Debug, Args)]
pub struct DownloadCommand {
    /// Artifact URL, absolute or relative to the server base URL
    pub url: String,

    /// Where to save the file (defaults to the last URL segment)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl DownloadCommand {
    /// Resolve the output path.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let name = self
                .url
                .split(['?', '#'])
                .next()
                .and_then(|path| path.rsplit('/').next())
                .filter(|name| !name.is_empty())
                .unwrap_or("download.bin");
            PathBuf::from(name)
        })
    }
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn download(url: &str, output: Option<&str>) -> DownloadCommand {
        DownloadCommand {
            url: url.to_string(),
            output: output.map(PathBuf::from),
        }
    }

    #[test]
    fn test_download_output_from_url() {
        let cmd = download("http://127.0.0.1:8000/download/cat.jpg", None);
        assert_eq!(cmd.output_path(), PathBuf::from("cat.jpg"));
    }

    #[test]
    fn test_download_output_ignores_query() {
        let cmd = download("/download/cat.jpg?v=2#top", None);
        assert_eq!(cmd.output_path(), PathBuf::from("cat.jpg"));
    }

    #[test]
    fn test_download_output_fallback() {
        let cmd = download("http://127.0.0.1:8000/download/", None);
        assert_eq!(cmd.output_path(), PathBuf::from("download.bin"));
    }

    #[test]
    fn test_download_output_explicit() {
        let cmd = download("/download/cat.jpg", Some("/tmp/out.jpg"));
        assert_eq!(cmd.output_path(), PathBuf::from("/tmp/out.jpg"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }

    #[test]
    fn test_upload_command_debug() {
        let cmd = UploadCommand {
            file: PathBuf::from("cat.jpg"),
            quality: Some(80),
            no_refresh: false,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("cat.jpg"));
        assert!(debug_str.contains("80"));
    }
}
