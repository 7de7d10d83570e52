use scraper::{ElementRef, Html, Selector};

use crate::scrape::ScrapeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSelector<'a> {
    /// The first `<table>` in document order.
    First,
    /// The `<table>` with this element id.
    Id(&'a str),
}

impl TableSelector<'_> {
    fn css(&self) -> String {
        match self {
            TableSelector::First => "table".to_string(),
            TableSelector::Id(id) => format!("table#{id}"),
        }
    }
}

/// Text content of an HTML table. Header rows keep their levels; cells with
/// `colspan` are repeated so every row has one entry per column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedTable {
    pub header_rows: Vec<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

impl ExtractedTable {
    pub fn width(&self) -> usize {
        self.header_rows
            .iter()
            .chain(&self.rows)
            .map(Vec::len)
            .max()
            .unwrap_or(0)
    }

    /// Writes header levels then data rows; short rows are padded with empty cells.
    pub fn to_csv_writer<W: std::io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let width = self.width();
        let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);
        for row in self.header_rows.iter().chain(&self.rows) {
            let mut padded = row.clone();
            padded.resize(width, String::new());
            wtr.write_record(&padded)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|err| ScrapeError::Selector(format!("{css}: {err:?}")))
}

pub fn extract_table(html: &str, which: TableSelector<'_>) -> Result<ExtractedTable, ScrapeError> {
    let document = Html::parse_document(html);
    let css = which.css();
    let table_sel = selector(&css)?;
    let Some(table) = document.select(&table_sel).next() else {
        return Err(ScrapeError::TableNotFound(css));
    };

    let head_sel = selector("thead > tr")?;
    let body_sel = selector("tbody > tr")?;
    let foot_sel = selector("tfoot > tr")?;
    let cell_sel = selector("th, td")?;

    let mut header_rows: Vec<Vec<String>> = table
        .select(&head_sel)
        .map(|tr| row_cells(tr, &cell_sel))
        .collect();

    let mut rows = Vec::new();
    for tr in table.select(&body_sel) {
        if tr.value().classes().any(|c| c == "thead") {
            continue;
        }
        // Without a <thead>, leading all-<th> rows are the header.
        if header_rows.is_empty() && rows.is_empty() && is_header_row(tr, &cell_sel) {
            header_rows.push(row_cells(tr, &cell_sel));
            continue;
        }
        rows.push(row_cells(tr, &cell_sel));
    }
    // Footer rows (season totals) follow the body.
    rows.extend(table.select(&foot_sel).map(|tr| row_cells(tr, &cell_sel)));

    Ok(ExtractedTable { header_rows, rows })
}

fn is_header_row(tr: ElementRef<'_>, cell_sel: &Selector) -> bool {
    let mut cells = tr.select(cell_sel).peekable();
    cells.peek().is_some() && cells.all(|c| c.value().name() == "th")
}

fn row_cells(tr: ElementRef<'_>, cell_sel: &Selector) -> Vec<String> {
    let mut out = Vec::new();
    for cell in tr.select(cell_sel) {
        let span = cell
            .value()
            .attr("colspan")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .max(1);
        let text = normalize_ws(&cell.text().collect::<String>());
        for _ in 0..span {
            out.push(text.clone());
        }
    }
    out
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::normalize_ws;

    #[test]
    fn whitespace_collapses() {
        assert_eq!(normalize_ws("  Conf.\n   Champ. "), "Conf. Champ.");
        assert_eq!(normalize_ws(""), "");
    }
}
