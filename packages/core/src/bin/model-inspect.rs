//! Model Inspector
//!
//! Prints the node at a path of a page model, either from a JSON file or
//! loaded from a server the way a page would load it.
//!
//! # Usage
//!
//! ```bash
//! # From a saved model document
//! cargo run --bin model-inspect -- site.model.json /content/site/jcr:content/root
//!
//! # From a server (root page URL, then the path to print)
//! cargo run --bin model-inspect -- http://localhost:4502/content/site.html /content/site/child
//! ```
//!
//! `PAGEMODEL_CONFIG` may point to a `ManagerConfig` JSON file (e.g. to use
//! the `cqItems` key convention). Log level follows `RUST_LOG`, default `info`.

use anyhow::{anyhow, bail, Context};
use pagemodel_core::{
    config::ManagerConfig,
    db::ModelStore,
    models::ModelNodeExt,
    services::{HttpModelClient, ModelManager, StaticHost},
};
use serde_json::Value;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(source) = args.next() else {
        bail!("usage: model-inspect <model.json|http-url> [path]");
    };
    let path = args.next();

    let config = match std::env::var("PAGEMODEL_CONFIG") {
        Ok(file) => ManagerConfig::from_json_file(&file)?,
        Err(_) => ManagerConfig::default(),
    };

    let node = if source.starts_with("http://") || source.starts_with("https://") {
        inspect_remote(config, &source, path.as_deref()).await?
    } else {
        inspect_file(config, &source, path.as_deref())?
    };

    println!("{}", serde_json::to_string_pretty(&node)?);
    Ok(())
}

fn inspect_file(config: ManagerConfig, file: &str, path: Option<&str>) -> anyhow::Result<Value> {
    let contents =
        std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file))?;
    let model: Value =
        serde_json::from_str(&contents).with_context(|| format!("{} is not JSON", file))?;

    let root_path = model.node_path(&config.keys).map(str::to_string);
    let store = ModelStore::with_keys(config.keys, root_path.as_deref(), Some(model));

    store
        .get_data(path)
        .ok_or_else(|| anyhow!("no model data at {}", path.unwrap_or("/")))
}

async fn inspect_remote(
    mut config: ManagerConfig,
    url: &str,
    path: Option<&str>,
) -> anyhow::Result<Value> {
    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| anyhow!("invalid url {}", url))?;
    let (host, pathname) = match rest.find('/') {
        Some(index) => (&rest[..index], &rest[index..]),
        None => (rest, "/"),
    };
    let api_host = format!("{}://{}", scheme, host);
    config.api_host = Some(api_host.clone());

    tracing::info!("Loading page model for {} from {}", pathname, api_host);

    let client = Arc::new(HttpModelClient::new(Some(&api_host)));
    let host = Arc::new(StaticHost::new().with_pathname(pathname));
    let manager = ModelManager::new(config, client, host)?;

    let root = manager.initialize(pathname).await?;
    match path {
        Some(path) => Ok(manager.get_data(path).await?),
        None => Ok(root),
    }
}
