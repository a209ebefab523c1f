//! Markdown-flavored plain-text export.

use crate::export::document::{ExportBody, ExportDocument, LedgerTable};

/// Renders the header block followed by the body.
pub fn render_markdown(document: &ExportDocument) -> String {
    let body = match &document.body {
        ExportBody::Rich { text, .. } => text.clone(),
        ExportBody::Ledger(table) => ledger_table(table),
        ExportBody::Notice(notice) => notice.clone(),
    };
    format!(
        "# {}\n\n**Mode:** {}\n**Tags:** {}\n\n---\n\n{}",
        document.title,
        document.mode,
        document.tag_line(),
        body
    )
}

fn ledger_table(table: &LedgerTable) -> String {
    let width = table.headers.len();
    let mut lines = Vec::with_capacity(table.rows.len() + table.totals.len() + 2);
    lines.push(table_line(table.headers.iter().map(|h| escape_cell(h))));

    let separator: String = (0..width)
        .map(|index| if table.is_sum_column(index) { "---:|" } else { "---|" })
        .collect();
    lines.push(format!("|{separator}"));

    for row in &table.rows {
        lines.push(table_line(row.iter().map(|cell| escape_cell(cell))));
    }

    for total in &table.totals {
        let mut cells = vec![String::new(); width];
        if total.index > 0 {
            cells[total.index - 1] = format!("**{}**", escape_cell(&total.label));
        }
        if let Some(cell) = cells.get_mut(total.index) {
            *cell = format!("**{}**", total.value);
        }
        lines.push(table_line(cells.into_iter()));
    }
    lines.join("\n")
}

fn table_line(cells: impl Iterator<Item = String>) -> String {
    let cells: Vec<String> = cells.collect();
    format!("| {} |", cells.join(" | "))
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}
