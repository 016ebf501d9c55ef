// Analysis text formatter.
//
// Turns the loosely structured analysis text returned by the server
// (bold headers, bullet lines, inline **bold** runs) into an
// `AnalysisDocument` of sections, blocks and spans. Pure and deterministic.

const BOLD: &str = "**";
const BULLETS: [&str; 2] = ["-", "\u{2022}"];

/// An inline run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Plain(String),
    Emphasis(String),
}

impl Span {
    pub fn text(&self) -> &str {
        match self {
            Span::Plain(s) | Span::Emphasis(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<Span>),
    ListItem(Vec<Span>),
}

impl Block {
    pub fn spans(&self) -> &[Span] {
        match self {
            Block::Paragraph(spans) | Block::ListItem(spans) => spans,
        }
    }
}

/// A heading group. Blocks that precede the first header land in a section
/// without a title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: Option<String>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisDocument {
    pub sections: Vec<Section>,
}

impl AnalysisDocument {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Parse raw analysis text into a structured document.
pub fn format(raw: &str) -> AnalysisDocument {
    let mut sections = Vec::new();
    let mut title: Option<String> = None;
    let mut blocks: Vec<Block> = Vec::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with(BOLD) && line.ends_with(BOLD) {
            flush(&mut sections, &mut title, &mut blocks);
            title = Some(line.replace(BOLD, ""));
        } else if let Some(rest) = strip_bullet(line, true) {
            blocks.push(Block::ListItem(strip_unpaired_markers(parse_inline(rest))));
        } else if let Some(rest) = strip_bullet(line, false) {
            blocks.push(Block::ListItem(parse_inline(rest)));
        } else {
            blocks.push(Block::Paragraph(parse_inline(line)));
        }
    }
    flush(&mut sections, &mut title, &mut blocks);

    AnalysisDocument { sections }
}

fn flush(sections: &mut Vec<Section>, title: &mut Option<String>, blocks: &mut Vec<Block>) {
    if title.is_some() || !blocks.is_empty() {
        sections.push(Section {
            title: title.take(),
            blocks: std::mem::take(blocks),
        });
    }
}

/// Strip a leading bullet marker and the whitespace after it.
///
/// With `bold` set, only matches bullets written as `- **` / `• **`;
/// otherwise matches `- ` / `• `.
fn strip_bullet(line: &str, bold: bool) -> Option<&str> {
    BULLETS.iter().find_map(|bullet| {
        let rest = line.strip_prefix(bullet)?;
        let marker = if bold { " **" } else { " " };
        rest.starts_with(marker).then(|| rest.trim_start())
    })
}

/// Split text on `**...**` runs. A run needs at least one character and no
/// `*` between its markers; anything else stays plain text.
fn parse_inline(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut plain_start = 0;
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find(BOLD) {
        let open = cursor + offset;
        let body_start = open + BOLD.len();
        let body_len = text[body_start..]
            .find('*')
            .unwrap_or(text.len() - body_start);
        let close = body_start + body_len;

        if body_len > 0 && text[close..].starts_with(BOLD) {
            push_plain(&mut spans, &text[plain_start..open]);
            spans.push(Span::Emphasis(text[body_start..close].to_string()));
            cursor = close + BOLD.len();
            plain_start = cursor;
        } else {
            cursor = open + 1;
        }
    }
    push_plain(&mut spans, &text[plain_start..]);
    spans
}

fn push_plain(spans: &mut Vec<Span>, text: &str) {
    if !text.is_empty() {
        spans.push(Span::Plain(text.to_string()));
    }
}

fn strip_unpaired_markers(spans: Vec<Span>) -> Vec<Span> {
    spans
        .into_iter()
        .filter_map(|span| match span {
            Span::Plain(s) => {
                let s = s.replace(BOLD, "");
                (!s.is_empty()).then_some(Span::Plain(s))
            }
            emphasis => Some(emphasis),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
