//! Minimal PDF 1.4 writer laying out text lines on A4 pages with the standard Helvetica fonts.
//! Only what a plain text report needs: no images, no compression, WinAnsi text.

use std::fmt::Write;

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;
const BODY_SIZE: f32 = 10.0;
const HEADING_SIZE: f32 = 14.0;
const LEADING: f32 = 1.4;
/// Helvetica at 10pt fits roughly this many characters between the margins.
const MAX_LINE_CHARS: usize = 95;

#[derive(Debug, Clone, PartialEq)]
struct Line {
    text: String,
    heading: bool,
}

impl Line {
    fn size(&self) -> f32 {
        if self.heading {
            HEADING_SIZE
        } else {
            BODY_SIZE
        }
    }
}

/// Lays out Markdown source as text. Heading markers are dropped and headings set in bold,
/// everything else is printed as written.
pub fn render_pdf(markdown: &str) -> Vec<u8> {
    let lines = markdown.lines().flat_map(to_lines).collect::<Vec<_>>();
    write_document(&paginate(lines))
}

fn to_lines(source: &str) -> Vec<Line> {
    let trimmed = source.trim_start_matches('#');
    let heading = trimmed.len() != source.len();
    let text = if heading { trimmed.trim() } else { source };
    wrap(text)
        .into_iter()
        .map(|text| Line { text, heading })
        .collect()
}

fn wrap(text: &str) -> Vec<String> {
    let chars = text.chars().collect::<Vec<_>>();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(MAX_LINE_CHARS)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

fn paginate(lines: Vec<Line>) -> Vec<Vec<Line>> {
    let mut pages = vec![vec![]];
    let mut used = 0.0;
    let available = PAGE_HEIGHT - 2.0 * MARGIN;
    for line in lines {
        let height = line.size() * LEADING;
        if used + height > available {
            pages.push(vec![]);
            used = 0.0;
        }
        used += height;
        if let Some(page) = pages.last_mut() {
            page.push(line);
        }
    }
    pages
}

/// PDF strings are delimited by parentheses, non WinAnsi characters are replaced.
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '(' | ')' => {
                escaped.push('\\');
                escaped.push(c);
            }
            ' '..='~' => escaped.push(c),
            _ => escaped.push('?'),
        }
    }
    escaped
}

fn content_stream(page: &[Line]) -> String {
    let mut content = String::new();
    let mut y = PAGE_HEIGHT - MARGIN;
    for line in page {
        y -= line.size() * LEADING;
        if line.text.is_empty() {
            continue;
        }
        let font = if line.heading { "F2" } else { "F1" };
        let _ = writeln!(
            content,
            "BT /{font} {} Tf {MARGIN} {y:.2} Td ({}) Tj ET",
            line.size(),
            escape_text(&line.text)
        );
    }
    content
}

fn write_document(pages: &[Vec<Line>]) -> Vec<u8> {
    // Object numbers: 1 catalog, 2 page tree, 3-4 fonts, then a page/content pair per page.
    let page_ids = (0..pages.len())
        .map(|index| 5 + index * 2)
        .collect::<Vec<_>>();

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            page_ids
                .iter()
                .map(|id| format!("{id} 0 R"))
                .collect::<Vec<_>>()
                .join(" "),
            pages.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];
    for (page, id) in pages.iter().zip(&page_ids) {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
            id + 1
        ));
        let content = content_stream(page);
        objects.push(format!(
            "<< /Length {} >>\nstream\n{content}endstream",
            content.len()
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, object) in objects.iter().enumerate() {
        offsets.push(out.len());
        let _ = write!(out, "{} 0 obj\n{object}\nendobj\n", index + 1);
    }
    let xref = out.len();
    let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = write!(out, "{offset:010} 00000 n \n");
    }
    let _ = write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
        objects.len() + 1
    );
    out.into_bytes()
}
