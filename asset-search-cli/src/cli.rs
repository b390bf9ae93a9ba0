use asset_search::Collection;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line interface for catalog search.
#[derive(Parser, Debug)]
#[command(name = "asset-search")]
#[command(version, about = "Search an asset catalog from the terminal.")]
pub struct SearchCli {
    /// TOML configuration file.
    #[arg(short, long, global = true, default_value = "asset-search.toml")]
    pub config: PathBuf,

    /// JSON catalog with `assets`, `tags`, `projects` and `categories` arrays.
    #[arg(long, global = true, env = "ASSET_SEARCH_CATALOG", default_value = "catalog.json")]
    pub catalog: PathBuf,

    /// Whitelist file (overrides the configuration).
    #[arg(short, long, global = true)]
    pub whitelist: Option<PathBuf>,

    /// Log level (overrides the configuration).
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Pretty-print JSON output?
    #[arg(short, long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: SearchCommand,
}

/// Available searches.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum SearchCommand {
    /// Keyword search over asset names, tags, projects and categories.
    Keywords {
        /// Comma-separated keywords (e.g. "robot,arm"). Empty lists every asset.
        #[arg(default_value = "")]
        keywords: String,
        /// Field selection (e.g. "name -_id").
        #[arg(short, long)]
        select: Option<String>,
    },
    /// Structured asset search with whitelisted terms.
    Filter {
        /// JSON object of terms (e.g. '{"model":{"triCount":{"lte":500}}}').
        terms: String,
    },
    /// Names that could complete the input.
    Terms {
        /// Partial input (e.g. "rob").
        input: String,
    },
    /// Exact-match search in one collection.
    Collection {
        /// assets, tags, projects or categories
        collection: Collection,
        /// JSON object of terms (e.g. '{"name":"robot"}').
        #[arg(default_value = "{}")]
        terms: String,
    },
    /// Get an asset by id.
    Asset {
        /// Asset id.
        id: String,
        /// Field selection (e.g. "name tags").
        #[arg(short, long)]
        select: Option<String>,
    },
    /// Get a tag by exact name.
    Tag {
        /// Tag name.
        name: String,
    },
    /// Get a project by name, ignoring case.
    Project {
        /// Project name.
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        SearchCli::command().debug_assert();
    }

    #[test]
    fn test_parse_keywords_with_global_flags() {
        let cli = SearchCli::try_parse_from([
            "asset-search",
            "keywords",
            "robot,arm",
            "--select",
            "name",
            "--pretty",
        ])
        .unwrap();
        assert!(cli.pretty);
        assert_eq!(
            cli.command,
            SearchCommand::Keywords {
                keywords: "robot,arm".into(),
                select: Some("name".into())
            }
        );
    }

    #[test]
    fn test_parse_collection() {
        let cli = SearchCli::try_parse_from(["asset-search", "collection", "tags"]).unwrap();
        assert_eq!(
            cli.command,
            SearchCommand::Collection {
                collection: Collection::Tag,
                terms: "{}".into()
            }
        );
        assert!(SearchCli::try_parse_from(["asset-search", "collection", "users"]).is_err());
    }
}
