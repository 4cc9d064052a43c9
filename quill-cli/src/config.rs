//! Runtime configuration: CLI flag first, environment second, default last.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub const ENV_NOTION_TOKEN: &str = "QUILL_NOTION_TOKEN";
pub const ENV_NOTION_DATABASE: &str = "QUILL_NOTION_DATABASE";
pub const ENV_CMS_TOKEN: &str = "QUILL_CMS_TOKEN";
pub const ENV_CMS_COLLECTION: &str = "QUILL_CMS_COLLECTION";

pub const DEFAULT_WINDOW_DAYS: i64 = 5;
pub const DEFAULT_OUT_DIR: &str = "pages";

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Flag wins over environment; `None` when neither is set.
fn pick(flag: Option<String>, env_value: Option<String>) -> Option<String> {
    flag.filter(|v| !v.is_empty()).or(env_value)
}

pub fn notion_token() -> Result<String> {
    env_var(ENV_NOTION_TOKEN)
        .with_context(|| format!("no API token; set {ENV_NOTION_TOKEN}"))
}

pub fn database_id(flag: Option<String>) -> Result<String> {
    pick(flag, env_var(ENV_NOTION_DATABASE))
        .with_context(|| format!("no database id; pass --database or set {ENV_NOTION_DATABASE}"))
}

pub fn cms_token() -> Result<String> {
    env_var(ENV_CMS_TOKEN).with_context(|| format!("no CMS token; set {ENV_CMS_TOKEN}"))
}

pub fn collection_id(flag: Option<String>) -> Result<String> {
    pick(flag, env_var(ENV_CMS_COLLECTION)).with_context(|| {
        format!("no collection id; pass --collection or set {ENV_CMS_COLLECTION}")
    })
}

pub fn out_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR))
}
