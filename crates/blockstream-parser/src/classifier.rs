use blockstream_types::{
    BlockAction, BlockContent, BlockDescriptor, BlockKind, BlockMetadata, TableSubtype,
};

use crate::config::ParserConfig;
use crate::language::{is_executable, normalize_language};
use crate::state::ParseState;

/// A complete line as seen by the rules
struct Line<'a> {
    text: &'a str,
    indent: usize,
}

impl<'a> Line<'a> {
    fn new(raw: &'a str) -> Self {
        let text = raw.trim();
        let indent = raw
            .chars()
            .take_while(|c| c.is_whitespace())
            .count();
        Self { text, indent }
    }
}

enum RuleOutcome {
    NoMatch,
    Block(BlockDescriptor),
    /// Stop evaluating and produce no descriptor (fence body)
    Suppressed,
}

type Rule = fn(&Line<'_>, &mut ParseState) -> RuleOutcome;

/// Rules in priority order; the first one that does not return `NoMatch` wins.
/// The paragraph fallback is applied after the list and never fails.
const RULES: &[(&str, Rule)] = &[
    ("fence", fence),
    ("fence_body", fence_body),
    ("heading", heading),
    ("bulleted_list_item", bulleted_list_item),
    ("numbered_list_item", numbered_list_item),
    ("quote", quote),
    ("divider", divider),
    ("table", table),
];

/// Decides whether a line starts, continues or ends a structural block
#[derive(Debug, Clone, Default)]
pub struct BlockClassifier {
    paragraph_blocks: bool,
}

impl BlockClassifier {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            paragraph_blocks: config.paragraph_blocks,
        }
    }

    /// Classify one complete line. Returns `None` for blank lines and for
    /// lines inside a fence.
    pub fn classify(&self, raw: &str, state: &mut ParseState) -> Option<BlockDescriptor> {
        let line = Line::new(raw);
        if line.text.is_empty() {
            return None;
        }

        // Any other shape ends an open table, whichever rule matches next
        if state.in_table && !state.in_code_block && table_cells(line.text).is_none() {
            state.close_table();
        }

        for (name, rule) in RULES {
            match rule(&line, state) {
                RuleOutcome::NoMatch => continue,
                RuleOutcome::Suppressed => return None,
                RuleOutcome::Block(descriptor) => {
                    tracing::trace!(rule = *name, block_type = %descriptor.kind, "Line classified");
                    return Some(descriptor);
                }
            }
        }

        Some(self.paragraph(&line, state))
    }

    fn paragraph(&self, line: &Line<'_>, state: &mut ParseState) -> BlockDescriptor {
        let block_id = self.paragraph_blocks.then(|| state.next_block_id());
        atomic(
            BlockKind::Paragraph,
            block_id,
            line.text.to_string(),
            BlockMetadata::Paragraph {},
        )
    }
}

fn atomic(
    kind: BlockKind,
    block_id: Option<String>,
    content: String,
    metadata: BlockMetadata,
) -> BlockDescriptor {
    BlockDescriptor {
        kind,
        subtype: None,
        block_id,
        action: None,
        content: BlockContent::Text(content),
        metadata,
    }
}

fn code_metadata(language: &str) -> BlockMetadata {
    BlockMetadata::Code {
        language: language.to_string(),
        syntax_highlighting: true,
        executable: is_executable(language),
    }
}

fn fence(line: &Line<'_>, state: &mut ParseState) -> RuleOutcome {
    if !line.text.starts_with("```") {
        return RuleOutcome::NoMatch;
    }

    if state.in_code_block {
        let language = state.code_language.take().unwrap_or_else(|| "text".to_string());
        state.in_code_block = false;
        tracing::debug!(language = %language, "Code fence closed");

        return RuleOutcome::Block(BlockDescriptor {
            kind: BlockKind::CodeBlock,
            subtype: None,
            block_id: None,
            action: Some(BlockAction::End),
            content: BlockContent::Text(String::new()),
            metadata: code_metadata(&language),
        });
    }

    let marker = line
        .text
        .trim_start_matches('`')
        .split_whitespace()
        .next()
        .unwrap_or("");
    let language = normalize_language(marker);
    state.in_code_block = true;
    state.code_language = Some(language.clone());
    tracing::debug!(language = %language, "Code fence opened");

    RuleOutcome::Block(BlockDescriptor {
        kind: BlockKind::CodeBlock,
        subtype: None,
        block_id: Some(state.next_block_id()),
        action: Some(BlockAction::Start),
        content: BlockContent::Text(String::new()),
        metadata: code_metadata(&language),
    })
}

fn fence_body(_line: &Line<'_>, state: &mut ParseState) -> RuleOutcome {
    if state.in_code_block {
        RuleOutcome::Suppressed
    } else {
        RuleOutcome::NoMatch
    }
}

fn heading(line: &Line<'_>, state: &mut ParseState) -> RuleOutcome {
    let level = line.text.bytes().take_while(|&b| b == b'#').count();
    if line.text.as_bytes().get(level) != Some(&b' ') {
        return RuleOutcome::NoMatch;
    }
    let Some(kind) = u8::try_from(level).ok().and_then(BlockKind::heading) else {
        return RuleOutcome::NoMatch;
    };

    RuleOutcome::Block(atomic(
        kind,
        Some(state.next_block_id()),
        line.text[level..].trim().to_string(),
        BlockMetadata::Heading { level: level as u8 },
    ))
}

fn bulleted_list_item(line: &Line<'_>, state: &mut ParseState) -> RuleOutcome {
    let mut chars = line.text.chars();
    let (Some(marker @ ('-' | '*' | '+')), Some(' ')) = (chars.next(), chars.next()) else {
        return RuleOutcome::NoMatch;
    };

    RuleOutcome::Block(atomic(
        BlockKind::BulletedListItem,
        Some(state.next_block_id()),
        line.text[2..].trim().to_string(),
        BlockMetadata::BulletedList {
            list_type: "bulleted".to_string(),
            marker,
            indent: line.indent,
        },
    ))
}

fn numbered_list_item(line: &Line<'_>, state: &mut ParseState) -> RuleOutcome {
    let digits = line.text.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || !line.text[digits..].starts_with(". ") {
        return RuleOutcome::NoMatch;
    }
    // Digits only, so overflow is the one way parsing fails
    let number = line.text[..digits].parse::<u64>().unwrap_or(u64::MAX);

    RuleOutcome::Block(atomic(
        BlockKind::NumberedListItem,
        Some(state.next_block_id()),
        line.text[digits + 2..].trim().to_string(),
        BlockMetadata::NumberedList {
            list_type: "numbered".to_string(),
            number,
            indent: line.indent,
        },
    ))
}

fn quote(line: &Line<'_>, state: &mut ParseState) -> RuleOutcome {
    let Some(inner) = line.text.strip_prefix("> ") else {
        return RuleOutcome::NoMatch;
    };
    let inner = inner.trim();

    if let Some((callout_type, rest)) = callout_marker(inner) {
        return RuleOutcome::Block(atomic(
            BlockKind::Callout,
            Some(state.next_block_id()),
            rest.to_string(),
            BlockMetadata::Callout { callout_type },
        ));
    }

    RuleOutcome::Block(atomic(
        BlockKind::Quote,
        Some(state.next_block_id()),
        inner.to_string(),
        BlockMetadata::Quote {
            quote_style: "default".to_string(),
        },
    ))
}

/// `[!NOTE] text` -> ("note", "text")
fn callout_marker(text: &str) -> Option<(String, &str)> {
    let rest = text.strip_prefix("[!")?;
    let close = rest.find(']')?;
    let kind = &rest[..close];
    if kind.is_empty() || !kind.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((kind.to_ascii_lowercase(), rest[close + 1..].trim()))
}

fn divider(line: &Line<'_>, state: &mut ParseState) -> RuleOutcome {
    let mut chars = line.text.chars();
    let Some(marker @ ('-' | '*' | '_')) = chars.next() else {
        return RuleOutcome::NoMatch;
    };
    if line.text.len() < 3 || !chars.all(|c| c == marker) {
        return RuleOutcome::NoMatch;
    }

    RuleOutcome::Block(atomic(
        BlockKind::Divider,
        Some(state.next_block_id()),
        line.text.to_string(),
        BlockMetadata::Divider {
            style: "line".to_string(),
            marker,
        },
    ))
}

/// Interior cells of a `| a | b |` row, or `None` if the line is not table-shaped
fn table_cells(text: &str) -> Option<Vec<String>> {
    if text.len() < 2
        || !text.starts_with('|')
        || !text.ends_with('|')
        || text.matches('|').count() < 2
    {
        return None;
    }
    Some(
        text[1..text.len() - 1]
            .split('|')
            .map(|cell| cell.trim().to_string())
            .collect(),
    )
}

fn table(line: &Line<'_>, state: &mut ParseState) -> RuleOutcome {
    let Some(cells) = table_cells(line.text) else {
        return RuleOutcome::NoMatch;
    };

    if !state.in_table {
        state.open_table(cells.clone());
        tracing::debug!(columns = cells.len(), "Table opened");

        return RuleOutcome::Block(BlockDescriptor {
            kind: BlockKind::Table,
            subtype: Some(TableSubtype::Header),
            block_id: Some(state.next_block_id()),
            action: None,
            metadata: BlockMetadata::Table {
                column_count: cells.len(),
                headers: cells.clone(),
                is_header: true,
            },
            content: BlockContent::Cells(cells),
        });
    }

    // Rows belong to the table opened by the header and get no id of their own
    RuleOutcome::Block(BlockDescriptor {
        kind: BlockKind::Table,
        subtype: Some(TableSubtype::Row),
        block_id: None,
        action: None,
        metadata: BlockMetadata::Table {
            column_count: cells.len(),
            headers: state.table_headers.clone(),
            is_header: false,
        },
        content: BlockContent::Cells(cells),
    })
}
