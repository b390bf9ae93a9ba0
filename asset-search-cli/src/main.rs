//! `asset-search`: run catalog searches against a JSON catalog.

mod cli;
mod logging;

use anyhow::{Context, Result};
use asset_query::Whitelist;
use asset_search::{CatalogSearch, Document, MemoryExecutor, SearchConfig, Selection};
use clap::Parser;
use cli::{SearchCli, SearchCommand};
use serde_json::Value;
use std::io::Write;
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = SearchCli::parse();

    let env: Vec<(String, String)> = std::env::vars().collect();
    let mut config = SearchConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?
        .with_env_overrides(&env);
    if let Some(path) = &cli.whitelist {
        config.whitelist_path.clone_from(path);
    }
    if let Some(level) = &cli.log_level {
        config.log_level.clone_from(level);
    }

    logging::initialize_logging(config.level_filter()?).context("installing logger")?;

    let catalog = std::fs::read_to_string(&cli.catalog)
        .with_context(|| format!("reading catalog {}", cli.catalog.display()))?;
    let executor = MemoryExecutor::from_catalog_json(&catalog)
        .with_context(|| format!("loading catalog {}", cli.catalog.display()))?;
    log::debug!("loaded catalog {}", cli.catalog.display());
    let whitelist = Whitelist::load(&config.whitelist_path);

    let search = CatalogSearch::new(Arc::new(executor), Arc::new(whitelist))
        .with_category_keywords(config.category_keywords);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("starting runtime")?;
    let output = runtime.block_on(run(&search, cli.command))?;

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    writeln!(std::io::stdout(), "{rendered}")?;
    Ok(())
}

async fn run(search: &CatalogSearch, command: SearchCommand) -> Result<Value> {
    let output = match command {
        SearchCommand::Keywords { keywords, select } => {
            let select = select.as_deref().map(Selection::parse);
            documents(search.search_by_keywords(&keywords, select.as_ref()).await?)
        },
        SearchCommand::Filter { terms } => {
            let terms = parse_terms(&terms)?;
            documents(search.asset_search(&terms).await?)
        },
        SearchCommand::Terms { input } => Value::from(search.autocomplete(&input).await?),
        SearchCommand::Collection { collection, terms } => {
            let terms = parse_terms(&terms)?;
            documents(search.search_collection(collection, &terms).await?)
        },
        SearchCommand::Asset { id, select } => {
            let select = select.as_deref().map(Selection::parse);
            optional(search.find_asset_by_id(&id, select.as_ref()).await?)
        },
        SearchCommand::Tag { name } => optional(search.find_tag(&name).await?),
        SearchCommand::Project { name } => optional(search.find_project_by_name(&name).await?),
    };
    Ok(output)
}

fn parse_terms(terms: &str) -> Result<Value> {
    serde_json::from_str(terms).with_context(|| format!("terms are not valid JSON: {terms}"))
}

fn documents(docs: Vec<Document>) -> Value {
    Value::Array(docs.into_iter().map(Document::into_value).collect())
}

fn optional(doc: Option<Document>) -> Value {
    doc.map_or(Value::Null, Document::into_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search() -> CatalogSearch {
        let executor = MemoryExecutor::from_catalog(&json!({
            "assets": [{ "_id": "a1", "name": "Robot Arm", "tags": ["t1"] }],
            "tags": [{ "_id": "t1", "name": "robot" }]
        }))
        .unwrap();
        CatalogSearch::new(Arc::new(executor), Arc::new(Whitelist::new(["name"])))
    }

    fn block_on(command: SearchCommand) -> Result<Value> {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(run(&search(), command))
    }

    #[test]
    fn test_keywords_command() {
        let output = block_on(SearchCommand::Keywords {
            keywords: "arm".into(),
            select: Some("name".into()),
        })
        .unwrap();
        assert_eq!(output, json!([{ "_id": "a1", "name": "Robot Arm" }]));
    }

    #[test]
    fn test_filter_command_populates() {
        let output = block_on(SearchCommand::Filter {
            terms: r#"{"name":"robot"}"#.into(),
        })
        .unwrap();
        assert_eq!(output[0]["tags"], json!([{ "_id": "t1", "name": "robot" }]));
    }

    #[test]
    fn test_terms_command() {
        let output = block_on(SearchCommand::Terms { input: "ro".into() }).unwrap();
        assert_eq!(output, json!(["robot arm", "robot"]));
    }

    #[test]
    fn test_missing_document_is_null() {
        let output = block_on(SearchCommand::Tag { name: "nope".into() }).unwrap();
        assert_eq!(output, Value::Null);
    }

    #[test]
    fn test_invalid_terms_json_is_an_error() {
        let err = block_on(SearchCommand::Filter { terms: "{".into() }).unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }
}
