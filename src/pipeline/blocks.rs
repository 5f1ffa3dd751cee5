//! Turn Textract blocks into per-page prompt text.
//!
//! Each page becomes its `LINE` text in reading order, followed by every
//! table rendered as pipe-delimited rows and every form field as a
//! `key: value` line. Tables and fields are rebuilt from the
//! `TABLE` → `CELL` → `WORD` and `KEY_VALUE_SET` relationships.

use crate::content::{ExtractedContent, PageFragment};
use aws_sdk_textract::types::{Block, BlockType, EntityType, RelationshipType, SelectionStatus};
use std::collections::{BTreeMap, HashMap};

#[derive(Default)]
struct PageParts<'a> {
    lines: Vec<&'a str>,
    tables: Vec<String>,
    fields: Vec<String>,
}

/// Group blocks by page and render each page's text.
///
/// Blocks without a page number belong to page 1. Synchronous calls only
/// ever cover one page.
pub fn assemble_pages(blocks: &[Block]) -> ExtractedContent {
    let by_id: HashMap<&str, &Block> = blocks
        .iter()
        .filter_map(|b| b.id().map(|id| (id, b)))
        .collect();
    let mut pages: BTreeMap<usize, PageParts> = BTreeMap::new();

    for block in blocks {
        let page = block.page().and_then(|p| usize::try_from(p).ok()).unwrap_or(1);
        match block.block_type() {
            Some(BlockType::Line) => {
                if let Some(text) = block.text() {
                    pages.entry(page).or_default().lines.push(text);
                }
            }
            Some(BlockType::Table) => {
                if let Some(table) = render_table(block, &by_id) {
                    pages.entry(page).or_default().tables.push(table);
                }
            }
            Some(BlockType::KeyValueSet) if block.entity_types().contains(&EntityType::Key) => {
                if let Some(field) = render_field(block, &by_id) {
                    pages.entry(page).or_default().fields.push(field);
                }
            }
            _ => {}
        }
    }

    ExtractedContent {
        pages: pages
            .into_iter()
            .map(|(page, parts)| PageFragment {
                page,
                text: render_page(parts),
            })
            .collect(),
    }
}

fn render_page(parts: PageParts<'_>) -> String {
    let mut sections = Vec::new();
    if !parts.lines.is_empty() {
        sections.push(parts.lines.join("\n"));
    }
    for (i, table) in parts.tables.iter().enumerate() {
        sections.push(format!("Table {}:\n{}", i + 1, table));
    }
    if !parts.fields.is_empty() {
        sections.push(format!("Form fields:\n{}", parts.fields.join("\n")));
    }
    sections.join("\n\n")
}

fn related<'a>(
    block: &'a Block,
    kind: RelationshipType,
    by_id: &'a HashMap<&'a str, &'a Block>,
) -> impl Iterator<Item = &'a Block> + 'a {
    block
        .relationships()
        .iter()
        .filter(move |r| r.r#type() == Some(&kind))
        .flat_map(|r| r.ids().iter())
        .filter_map(|id| by_id.get(id.as_str()).copied())
}

/// Text of a block's child words; selection marks render as `[X]` / `[ ]`.
fn child_text(block: &Block, by_id: &HashMap<&str, &Block>) -> String {
    related(block, RelationshipType::Child, by_id)
        .filter_map(|child| match child.block_type() {
            Some(BlockType::Word) => child.text().map(str::to_string),
            Some(BlockType::SelectionElement) => Some(
                if child.selection_status() == Some(&SelectionStatus::Selected) {
                    "[X]".to_string()
                } else {
                    "[ ]".to_string()
                },
            ),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_table(table: &Block, by_id: &HashMap<&str, &Block>) -> Option<String> {
    let cells: Vec<(usize, usize, String)> = related(table, RelationshipType::Child, by_id)
        .filter(|b| b.block_type() == Some(&BlockType::Cell))
        .filter_map(|cell| {
            let row = usize::try_from(cell.row_index()?).ok()?.checked_sub(1)?;
            let col = usize::try_from(cell.column_index()?).ok()?.checked_sub(1)?;
            Some((row, col, child_text(cell, by_id).replace('|', "\\|")))
        })
        .collect();

    let rows = cells.iter().map(|(r, _, _)| r + 1).max()?;
    let cols = cells.iter().map(|(_, c, _)| c + 1).max()?;
    let mut grid = vec![vec![String::new(); cols]; rows];
    for (r, c, text) in cells {
        grid[r][c] = text;
    }

    let mut out = Vec::with_capacity(rows + 1);
    for (i, row) in grid.iter().enumerate() {
        out.push(format!("| {} |", row.join(" | ")));
        if i == 0 {
            out.push(format!("|{}", " --- |".repeat(cols)));
        }
    }
    Some(out.join("\n"))
}

fn render_field(key: &Block, by_id: &HashMap<&str, &Block>) -> Option<String> {
    let name = child_text(key, by_id);
    if name.is_empty() {
        return None;
    }
    let value = related(key, RelationshipType::Value, by_id)
        .map(|v| child_text(v, by_id))
        .collect::<Vec<_>>()
        .join(" ");
    Some(format!("{name}: {value}").trim_end().to_string())
}
