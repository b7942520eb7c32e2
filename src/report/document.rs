//! PDF document rendered from the CSV export
//!
//! Pages are 11x17 landscape with one inch margins. The grey header row is
//! repeated at the top of every page and body rows never split across pages.
//! Builtin PDF fonts carry no metrics here, so text is wrapped on an average
//! character width.

use super::tabular::{parse_source_cell, read_table, Table, SOURCE_COLUMN};
use anyhow::Result;
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb,
};
use std::path::Path;

/// Page size in points
const PAGE_WIDTH: f32 = 17.0 * 72.0;
const PAGE_HEIGHT: f32 = 11.0 * 72.0;
const MARGIN: f32 = 72.0;
const USABLE_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const USABLE_HEIGHT: f32 = PAGE_HEIGHT - 2.0 * MARGIN;

const FONT_SIZE: f32 = 10.0;
const LEADING: f32 = 12.0;
const CELL_PADDING: f32 = 3.0;
const HEADER_BOTTOM_PADDING: f32 = 12.0;
const CAPTION_SIZE: f32 = 9.0;
/// Average glyph width as a fraction of the font size
const CHAR_WIDTH_EM: f32 = 0.55;

/// Share of the usable page width per known column
const COLUMN_WIDTHS: [(&str, f32); 8] = [
    ("email", 0.19),
    ("password", 0.10),
    ("full_name", 0.10),
    ("username", 0.10),
    ("ip_address", 0.08),
    ("phone_number", 0.08),
    ("hash", 0.20),
    (SOURCE_COLUMN, 0.15),
];

/// Share given to columns outside the known set before normalizing
const OTHER_COLUMN_WIDTH: f32 = 0.10;

#[derive(Debug, Clone, PartialEq)]
struct Column {
    name: String,
    /// Width in points
    width: f32,
}

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Text(String),
    Source { name: String, date: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Face {
    Header,
    Body,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
struct Line {
    text: String,
    face: Face,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Header,
    Body,
}

/// A row with every cell already wrapped
#[derive(Debug, Clone)]
struct Row {
    kind: RowKind,
    cells: Vec<Vec<Line>>,
    height: f32,
}

struct Fonts {
    header: IndirectFontRef,
    body: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn for_face(&self, face: Face) -> &IndirectFontRef {
        match face {
            Face::Header => &self.header,
            Face::Body => &self.body,
            Face::Bold => &self.bold,
        }
    }
}

/// Renders the report document from a CSV file
#[derive(Debug, Default)]
pub struct DocumentRenderer;

impl DocumentRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Read `csv_path` back and render it as PDF bytes
    pub fn render_csv(&self, csv_path: &Path, title: &str) -> Result<Vec<u8>> {
        let table = read_table(csv_path)?;
        let columns = column_layout(&table.headers, USABLE_WIDTH);
        let (header, rows) = layout_table(&table, &columns);
        let pages = paginate(header.height, &rows, USABLE_HEIGHT);
        draw(title, &columns, &header, &rows, &pages)
    }
}

fn draw(
    title: &str,
    columns: &[Column],
    header: &Row,
    rows: &[Row],
    pages: &[Vec<usize>],
) -> Result<Vec<u8>> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Table");
    let fonts = Fonts {
        header: doc.add_builtin_font(BuiltinFont::HelveticaBold)?,
        body: doc.add_builtin_font(BuiltinFont::TimesRoman)?,
        bold: doc.add_builtin_font(BuiltinFont::TimesBold)?,
    };

    for (index, page_rows) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Table");
            doc.get_page(page).get_layer(layer)
        };

        layer.set_fill_color(black());
        layer.use_text(
            printable(&format!("{} - page {} of {}", title, index + 1, pages.len())),
            CAPTION_SIZE,
            mm(MARGIN),
            mm(PAGE_HEIGHT - MARGIN + CAPTION_SIZE),
            &fonts.body,
        );

        let mut top = PAGE_HEIGHT - MARGIN;
        top = draw_row(&layer, &fonts, columns, header, top);
        for &row in page_rows {
            top = draw_row(&layer, &fonts, columns, &rows[row], top);
        }
    }

    Ok(doc.save_to_bytes()?)
}

/// Draw one row below `top`; returns the new top
fn draw_row(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    columns: &[Column],
    row: &Row,
    top: f32,
) -> f32 {
    let (background, text_color) = match row.kind {
        RowKind::Header => (rgb(0.5, 0.5, 0.5), rgb(0.96, 0.96, 0.96)),
        RowKind::Body => (rgb(0.96, 0.96, 0.86), black()),
    };
    let bottom = top - row.height;

    let mut left = MARGIN;
    for (column, lines) in columns.iter().zip(&row.cells) {
        layer.set_fill_color(background.clone());
        layer.set_outline_color(black());
        layer.set_outline_thickness(1.0);
        layer.add_rect(
            Rect::new(mm(left), mm(bottom), mm(left + column.width), mm(top))
                .with_mode(PaintMode::FillStroke),
        );

        layer.set_fill_color(text_color.clone());
        for (n, line) in lines.iter().enumerate() {
            let baseline = top - CELL_PADDING - FONT_SIZE - n as f32 * LEADING;
            layer.use_text(
                line.text.clone(),
                FONT_SIZE,
                mm(left + CELL_PADDING),
                mm(baseline),
                fonts.for_face(line.face),
            );
        }
        left += column.width;
    }
    bottom
}

/// Wrap the header and every body row to the column widths
fn layout_table(table: &Table, columns: &[Column]) -> (Row, Vec<Row>) {
    let header_cells = columns
        .iter()
        .map(|column| wrap_lines(&column.name, column.width, Face::Header))
        .collect();
    let header = row(RowKind::Header, header_cells, usize::MAX);

    let max_lines = ((USABLE_HEIGHT - header.height - 2.0 * CELL_PADDING) / LEADING).floor() as usize;
    let source_index = table.headers.iter().position(|h| h == SOURCE_COLUMN);

    let rows = table
        .rows
        .iter()
        .map(|values| {
            let cells = values
                .iter()
                .zip(columns)
                .enumerate()
                .map(|(i, (value, column))| {
                    let cell = if Some(i) == source_index {
                        source_cell(value)
                    } else {
                        Cell::Text(value.clone())
                    };
                    cell_lines(&cell, column.width)
                })
                .collect();
            row(RowKind::Body, cells, max_lines)
        })
        .collect();

    (header, rows)
}

fn row(kind: RowKind, mut cells: Vec<Vec<Line>>, max_lines: usize) -> Row {
    for lines in cells.iter_mut() {
        clamp_lines(lines, max_lines.max(1));
    }
    let tallest = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
    let padding = match kind {
        RowKind::Header => CELL_PADDING + HEADER_BOTTOM_PADDING,
        RowKind::Body => 2.0 * CELL_PADDING,
    };
    Row {
        kind,
        cells,
        height: tallest as f32 * LEADING + padding,
    }
}

/// Cut a cell that would not fit on one page, marking the cut
fn clamp_lines(lines: &mut Vec<Line>, max_lines: usize) {
    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            last.text.push_str("...");
        }
    }
}

/// Two-part source cell, or the raw text when it does not parse
fn source_cell(value: &str) -> Cell {
    match parse_source_cell(value) {
        Some((name, date)) => Cell::Source {
            name: name.to_string(),
            date: date.to_string(),
        },
        None => Cell::Text(value.to_string()),
    }
}

/// Source names are set in bold above their date
fn cell_lines(cell: &Cell, width: f32) -> Vec<Line> {
    match cell {
        Cell::Text(text) => wrap_lines(text, width, Face::Body),
        Cell::Source { name, date } => {
            let mut lines = wrap_lines(name, width, Face::Bold);
            lines.extend(wrap_lines(date, width, Face::Body));
            lines
        }
    }
}

fn wrap_lines(text: &str, width: f32, face: Face) -> Vec<Line> {
    wrap(&printable(text), chars_per_line(width))
        .into_iter()
        .map(|text| Line { text, face })
        .collect()
}

fn chars_per_line(width: f32) -> usize {
    (((width - 2.0 * CELL_PADDING) / (FONT_SIZE * CHAR_WIDTH_EM)).floor() as usize).max(1)
}

/// Word wrap to `max_chars` per line; words longer than a line are split.
/// Always yields at least one line.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut len = 0;
        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if len > 0 && len + 1 + word_len > max_chars {
                lines.push(std::mem::take(&mut line));
                len = 0;
            }
            if word_len > max_chars {
                for ch in word.chars() {
                    if len == max_chars {
                        lines.push(std::mem::take(&mut line));
                        len = 0;
                    }
                    line.push(ch);
                    len += 1;
                }
                continue;
            }
            if len > 0 {
                line.push(' ');
                len += 1;
            }
            line.push_str(word);
            len += word_len;
        }
        lines.push(line);
    }

    lines
}

/// Builtin fonts only cover Latin-1
fn printable(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\t' => ' ',
            c if c == '\n' || (' '..='~').contains(&c) || ('\u{a0}'..='\u{ff}').contains(&c) => c,
            _ => '?',
        })
        .collect()
}

/// Group rows into pages below a repeated header; every page holds at least
/// one row and an empty table still gets one page
fn paginate(header_height: f32, rows: &[Row], available: f32) -> Vec<Vec<usize>> {
    let mut pages = vec![Vec::new()];
    let mut remaining = available - header_height;

    for (index, row) in rows.iter().enumerate() {
        let current = pages.len() - 1;
        if row.height > remaining && !pages[current].is_empty() {
            pages.push(Vec::new());
            remaining = available - header_height;
        }
        let current = pages.len() - 1;
        pages[current].push(index);
        remaining -= row.height;
    }

    pages
}

/// Proportional widths for `headers`, normalized to `total_width`
fn column_layout(headers: &[String], total_width: f32) -> Vec<Column> {
    let weights: Vec<f32> = headers
        .iter()
        .map(|h| {
            COLUMN_WIDTHS
                .iter()
                .find(|(name, _)| name == h)
                .map(|(_, w)| *w)
                .unwrap_or(OTHER_COLUMN_WIDTH)
        })
        .collect();
    let total: f32 = weights.iter().sum();

    headers
        .iter()
        .zip(weights)
        .map(|(name, weight)| Column {
            name: name.clone(),
            width: if total > 0.0 { weight / total * total_width } else { 0.0 },
        })
        .collect()
}

fn mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

fn rgb(r: f32, g: f32, b: f32) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn black() -> Color {
    rgb(0.0, 0.0, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn table(rows: usize, hash_len: usize) -> Table {
        Table {
            headers: headers(&["email", "hash", "source"]),
            rows: (0..rows)
                .map(|i| {
                    vec![
                        format!("user{}@matrix.io", i),
                        "a".repeat(hash_len),
                        "Name: Zion, Date: 2199-01".to_string(),
                    ]
                })
                .collect(),
        }
    }

    #[test]
    fn test_full_column_set_keeps_proportions() {
        let layout = column_layout(
            &headers(&[
                "email",
                "password",
                "full_name",
                "username",
                "ip_address",
                "phone_number",
                "hash",
                "source",
            ]),
            100.0,
        );
        let widths: Vec<f32> = layout.iter().map(|c| c.width).collect();
        let expected = [19.0, 10.0, 10.0, 10.0, 8.0, 8.0, 20.0, 15.0];
        for (w, e) in widths.iter().zip(expected) {
            assert!((w - e).abs() < 1e-3, "{} != {}", w, e);
        }
    }

    #[test]
    fn test_partial_column_set_fills_width() {
        let layout = column_layout(&headers(&["email", "breach_id", "source"]), USABLE_WIDTH);
        let total: f32 = layout.iter().map(|c| c.width).sum();
        assert!((total - USABLE_WIDTH).abs() < 1e-2);
        assert!(layout[0].width > layout[2].width);
    }

    #[test]
    fn test_source_cells_parse_or_fall_back() {
        assert_eq!(
            source_cell("Name: Leak, Date: 2020"),
            Cell::Source {
                name: "Leak".to_string(),
                date: "2020".to_string()
            }
        );
        assert_eq!(source_cell("free text"), Cell::Text("free text".to_string()));
    }

    #[test]
    fn test_source_name_is_bold_above_date() {
        let lines = cell_lines(&source_cell("Name: Zion, Date: 2199-01"), 200.0);
        assert_eq!(
            lines,
            vec![
                Line {
                    text: "Zion".to_string(),
                    face: Face::Bold
                },
                Line {
                    text: "2199-01".to_string(),
                    face: Face::Body
                },
            ]
        );
    }

    #[test]
    fn test_wrap_breaks_on_words_and_splits_long_ones() {
        assert_eq!(wrap("alpha beta gamma", 10), vec!["alpha beta", "gamma"]);
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("", 4), vec![""]);
        assert!(wrap(&"x ".repeat(100), 7).iter().all(|l| l.chars().count() <= 7));
    }

    #[test]
    fn test_non_latin_text_is_replaced() {
        assert_eq!(printable("café 東京\tok"), "café ?? ok");
    }

    #[test]
    fn test_many_rows_span_pages_in_order() {
        let table = table(200, 10);
        let columns = column_layout(&table.headers, USABLE_WIDTH);
        let (header, rows) = layout_table(&table, &columns);
        let pages = paginate(header.height, &rows, USABLE_HEIGHT);

        assert!(pages.len() > 1);
        let order: Vec<usize> = pages.iter().flatten().copied().collect();
        assert_eq!(order, (0..200).collect::<Vec<_>>());
        for page in &pages {
            let used: f32 = page.iter().map(|&i| rows[i].height).sum();
            assert!(header.height + used <= USABLE_HEIGHT);
        }
    }

    #[test]
    fn test_oversized_cell_is_cut_to_one_page() {
        let table = table(1, 50_000);
        let columns = column_layout(&table.headers, USABLE_WIDTH);
        let (header, rows) = layout_table(&table, &columns);

        assert!(header.height + rows[0].height <= USABLE_HEIGHT);
        assert!(rows[0].cells[1].last().unwrap().text.ends_with("..."));
    }

    #[test]
    fn test_render_writes_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        let mut contents = String::from("email,password,source\n");
        for i in 0..120 {
            contents.push_str(&format!("user{}@y.io,a&b,\"Name: <Leak>, Date: 2020\"\n", i));
        }
        std::fs::write(&path, contents).unwrap();

        let bytes = DocumentRenderer::new()
            .render_csv(&path, "Breach report")
            .unwrap();

        assert!(bytes.starts_with(b"%PDF"));
    }
}
