//! Recursive block-tree materialization.
//!
//! Listing returns page metadata only; the body arrives through repeated
//! children calls. This module drains the cursor loop at each level and
//! descends into every block that reports children, so conversion downstream
//! always sees a complete, owned forest.

use quill_core::Block;
use tracing::debug;

use crate::client::NotionClient;
use crate::error::NotionError;

/// Fetch the complete child forest under `parent_id` (a page id or a block
/// id — the API treats both as block parents).
pub fn fetch_block_tree(client: &NotionClient, parent_id: &str) -> Result<Vec<Block>, NotionError> {
    let mut blocks = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let (batch, next) = client.list_block_children(parent_id, cursor.as_deref())?;
        blocks.extend(batch);
        match next {
            Some(c) => cursor = Some(c),
            None => break,
        }
    }

    for block in &mut blocks {
        if block.has_children {
            block.children = fetch_block_tree(client, &block.id.0)?;
        }
    }

    debug!(parent = parent_id, count = blocks.len(), "fetched block level");
    Ok(blocks)
}
