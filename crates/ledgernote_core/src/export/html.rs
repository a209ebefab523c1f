//! Styled markup export, printable as an A4 page.

use crate::export::document::{ExportBody, ExportDocument, LedgerTable};
use crate::export::markup::escape_html;
use crate::ledger::numeric::{coerce_number, format_total};

const CELL_STYLE: &str = "padding: 8px; border: 1px solid #ddd;";
const HEADER_STYLE: &str =
    "padding: 8px; border: 1px solid #ddd; text-align: left; background-color: #f2f2f2;";
const TOTAL_STYLE: &str = "padding: 8px; border: 1px solid #ddd; text-align: right;";

/// Renders a complete HTML document for the note.
pub fn render_html(document: &ExportDocument) -> String {
    let title = escape_html(&document.title);
    format!(
        concat!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n",
            "<div style=\"width: 210mm; padding: 20mm; font-family: Arial, sans-serif;\">\n",
            "<h1>{title}</h1>\n",
            "<div style=\"font-size: 12px; color: #555; margin-bottom: 20px;\">",
            "<strong>Mode:</strong> {mode}<br/><strong>Tags:</strong> {tags}</div>\n",
            "<div>{body}</div>\n</div>\n</body>\n</html>\n"
        ),
        title = title,
        mode = document.mode,
        tags = escape_html(&document.tag_line()),
        body = render_body(&document.body),
    )
}

/// Renders only the note body: raw rich markup or the ledger table.
pub fn render_body(body: &ExportBody) -> String {
    match body {
        ExportBody::Rich { html, .. } => html.clone(),
        ExportBody::Ledger(table) => ledger_table(table),
        ExportBody::Notice(notice) => format!("<p>{}</p>", escape_html(notice)),
    }
}

fn ledger_table(table: &LedgerTable) -> String {
    let width = table.headers.len();
    let header_cells: String = table
        .headers
        .iter()
        .map(|header| format!("<th style=\"{HEADER_STYLE}\">{}</th>", escape_html(header)))
        .collect();

    let body_rows: String = table
        .rows
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .enumerate()
                .map(|(index, cell)| {
                    if table.is_sum_column(index) {
                        format!(
                            "<td style=\"{CELL_STYLE} text-align: right;\">{}</td>",
                            format_total(coerce_number(cell))
                        )
                    } else {
                        format!("<td style=\"{CELL_STYLE}\">{}</td>", escape_html(cell))
                    }
                })
                .collect();
            format!("<tr>{cells}</tr>")
        })
        .collect();

    let total_rows: String = table
        .totals
        .iter()
        .map(|total| {
            let mut row = String::from("<tr>");
            if total.index > 0 {
                row.push_str(&format!(
                    "<th colspan=\"{}\" style=\"{TOTAL_STYLE}\">{}</th>",
                    total.index,
                    escape_html(&total.label)
                ));
            }
            row.push_str(&format!("<th style=\"{TOTAL_STYLE}\">{}</th>", total.value));
            let trailing = width.saturating_sub(total.index + 1);
            if trailing > 0 {
                row.push_str(&format!("<th colspan=\"{trailing}\"></th>"));
            }
            row.push_str("</tr>");
            row
        })
        .collect();

    format!(
        "<table style=\"width: 100%; border-collapse: collapse; font-family: sans-serif;\"><thead><tr>{header_cells}</tr></thead><tbody>{body_rows}</tbody><tfoot>{total_rows}</tfoot></table>"
    )
}
