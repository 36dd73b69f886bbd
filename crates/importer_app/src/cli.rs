use std::path::PathBuf;

use clap::Parser;
use importer_core::FailurePolicy;
use importer_engine::ImportConfig;
use log::LevelFilter;

/// Import every entry of a Notion database as Markdown posts.
///
/// Credentials and the database id come from `NOTION_TOKEN` and `DATABASE_ID`,
/// either in the environment or in a `.env` file.
#[derive(Debug, Parser)]
#[command(name = "notion-importer", version)]
pub struct Args {
    /// Read variables from this file instead of the nearest `.env`
    #[arg(long)]
    pub env_file: Option<PathBuf>,
    /// Rewrite these Markdown files, moving an embedded
    /// `<!--frontmatter-->...<!--end-->` block into a front matter header,
    /// then exit without importing
    #[arg(long, value_name = "FILE", num_args = 1..)]
    pub lift: Vec<PathBuf>,
    /// Directory the posts are written to (overrides OUTPUT_DIR)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Stop at the first entry that fails instead of finishing the batch
    #[arg(long)]
    pub fail_fast: bool,
    /// Also write the log to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    /// Command line flags win over the environment.
    pub fn apply(&self, mut config: ImportConfig) -> ImportConfig {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if self.fail_fast {
            config.failure_policy = FailurePolicy::Abort;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use importer_engine::{DATABASE_ID_VAR, TOKEN_VAR};

    use super::*;

    fn env_config() -> ImportConfig {
        ImportConfig::from_lookup(|key| match key {
            TOKEN_VAR => Some("secret".to_string()),
            DATABASE_ID_VAR => Some("db".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn flags_override_environment() {
        let args =
            Args::try_parse_from(["notion-importer", "--output-dir", "site/posts", "--fail-fast"])
                .unwrap();
        let config = args.apply(env_config());
        assert_eq!(config.output_dir, PathBuf::from("site/posts"));
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
    }

    #[test]
    fn lift_takes_several_files() {
        let args = Args::try_parse_from(["notion-importer", "--lift", "a.md", "b.md"]).unwrap();
        assert_eq!(args.lift, vec![PathBuf::from("a.md"), PathBuf::from("b.md")]);
        assert!(args.env_file.is_none());
    }

    #[test]
    fn no_flags_keep_environment_values() {
        let args = Args::try_parse_from(["notion-importer"]).unwrap();
        let config = args.apply(env_config());
        assert_eq!(config.output_dir, PathBuf::from("./content/posts"));
        assert_eq!(config.failure_policy, FailurePolicy::Continue);
        assert_eq!(args.log_level(), LevelFilter::Info);
        assert!(args.lift.is_empty());
    }
}
