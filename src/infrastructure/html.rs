// HTML fragment rendering for datasets
use crate::domain::dataset::Dataset;
use std::fmt::Write;

pub const TABLE_CLASSES: &str = "table table-striped table-sm";

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Render a dataset as a `<table>` fragment. Every cell is escaped.
pub fn dataset_to_html(dataset: &Dataset) -> String {
    let mut html = format!("<table class=\"{}\">\n<thead>\n<tr>", TABLE_CLASSES);
    for name in dataset.column_names() {
        // Writing to a String cannot fail
        let _ = write!(html, "<th>{}</th>", html_escape(name));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");
    for row in dataset.rows() {
        html.push_str("<tr>");
        for cell in row {
            let _ = write!(html, "<td>{}</td>", html_escape(&cell.to_string()));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>");
    html
}
