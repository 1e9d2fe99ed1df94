// Server-rendered HTML pages
use crate::application::dashboard_service::FilterMetadata;
use crate::application::relational_source::ColumnInfo;
use crate::application::sandbox_service::ViewSummary;
use crate::domain::dashboard::{ColumnMapping, DashboardItem, Rendered, VizKind};
use crate::domain::dataset::Dataset;
use crate::domain::duplicates::DuplicateReport;
use crate::domain::filter::Operator;
use crate::domain::view::StoredView;
use crate::infrastructure::html::{dataset_to_html, html_escape};
use std::fmt::Write;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
const BOOTSTRAP_CDN: &str = "https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css";
const VIEW_PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(String),
    Success(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Views,
    Duplicates,
    Dashboard,
    Sandbox,
}

impl Section {
    const ALL: [Section; 4] = [Section::Views, Section::Duplicates, Section::Dashboard, Section::Sandbox];

    fn path(&self) -> &'static str {
        match self {
            Section::Views => "/views",
            Section::Duplicates => "/duplicates",
            Section::Dashboard => "/dashboard",
            Section::Sandbox => "/sandbox",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Section::Views => "Views",
            Section::Duplicates => "Duplicates",
            Section::Dashboard => "Dashboard",
            Section::Sandbox => "Sandbox",
        }
    }
}

fn layout(active: Section, notices: &[Notice], body: &str) -> String {
    let mut nav = String::new();
    for section in Section::ALL {
        let class = if section == active { "nav-link active" } else { "nav-link" };
        let _ = write!(
            nav,
            "<li class=\"nav-item\"><a class=\"{}\" href=\"{}\">{}</a></li>",
            class,
            section.path(),
            section.label()
        );
    }

    let mut banners = String::new();
    for notice in notices {
        let (class, message) = match notice {
            Notice::Error(m) => ("alert-danger", m),
            Notice::Success(m) => ("alert-success", m),
        };
        let _ = write!(banners, "<div class=\"alert {}\">{}</div>", class, html_escape(message));
    }

    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title} | View Workspace</title>\n\
         <link rel=\"stylesheet\" href=\"{bootstrap}\">\n\
         <script src=\"{plotly}\"></script>\n</head>\n<body>\n\
         <nav class=\"navbar navbar-expand bg-light mb-4\"><div class=\"container\">\
         <span class=\"navbar-brand\">View Workspace</span><ul class=\"navbar-nav\">{nav}</ul></div></nav>\n\
         <main class=\"container\">\n{banners}\n{body}\n</main>\n</body>\n</html>\n",
        title = active.label(),
        bootstrap = BOOTSTRAP_CDN,
        plotly = PLOTLY_CDN,
        nav = nav,
        banners = banners,
        body = body,
    )
}

fn select_options(options: &[String], selected: &[&str]) -> String {
    let mut html = String::new();
    for option in options {
        let attr = if selected.contains(&option.as_str()) { " selected" } else { "" };
        let escaped = html_escape(option);
        let _ = write!(html, "<option value=\"{0}\"{1}>{0}</option>", escaped, attr);
    }
    html
}

fn view_names(views: &[StoredView]) -> Vec<String> {
    views.iter().map(|v| v.name.clone()).collect()
}

/// Render output of a dashboard item or preview.
fn rendered_html(rendered: &Rendered, element_id: &str) -> String {
    match rendered {
        Rendered::Table { table_html, row_count } => format!(
            "<div class=\"table-responsive\">{}</div><p class=\"text-muted small\">{} rows</p>",
            table_html, row_count
        ),
        Rendered::Chart { chart_json } => format!(
            "<div id=\"{id}\"></div>\n<script>\n(function() {{\n  var fig = {json};\n  \
             Plotly.newPlot(\"{id}\", fig.data, fig.layout, {{responsive: true}});\n}})();\n</script>",
            id = element_id,
            // keep the JSON from closing the script element
            json = chart_json.replace("</", "<\\/"),
        ),
    }
}

/// Values a view form was submitted with, echoed back on validation errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewForm {
    pub original_name: Option<String>,
    pub name: String,
    pub use_sql: bool,
    pub table: String,
    pub sql: String,
}

impl ViewForm {
    pub fn editing(view: &StoredView) -> Self {
        Self {
            original_name: Some(view.name.clone()),
            name: view.name.clone(),
            use_sql: true,
            table: String::new(),
            sql: view.query.clone(),
        }
    }
}

pub struct ViewsPage<'a> {
    /// Source tables with their column names and declared types
    pub tables: &'a [(String, Vec<ColumnInfo>)],
    pub views: &'a [StoredView],
    pub form: ViewForm,
    pub notices: Vec<Notice>,
}

pub fn views_page(page: &ViewsPage<'_>) -> String {
    let form = &page.form;
    let table_names: Vec<String> = page.tables.iter().map(|(name, _)| name.clone()).collect();
    let mut body = String::new();
    let heading = match &form.original_name {
        Some(name) => format!("Edit view <code>{}</code>", html_escape(name)),
        None => "New view".to_string(),
    };
    let original = form
        .original_name
        .as_deref()
        .map(|n| format!("<input type=\"hidden\" name=\"original_name\" value=\"{}\">", html_escape(n)))
        .unwrap_or_default();
    let (table_checked, sql_checked) = if form.use_sql { ("", " checked") } else { (" checked", "") };

    let _ = write!(
        body,
        "<h2>{heading}</h2>\n<form method=\"post\" action=\"/views\" class=\"mb-4\">{original}\
         <div class=\"mb-2\"><label class=\"form-label\">Name</label>\
         <input class=\"form-control\" name=\"view_name\" value=\"{name}\"></div>\
         <div class=\"mb-2\">\
         <label class=\"me-3\"><input type=\"radio\" name=\"query_source\" value=\"table\"{table_checked}> Table</label>\
         <label><input type=\"radio\" name=\"query_source\" value=\"sql\"{sql_checked}> SQL</label></div>\
         <div class=\"mb-2\"><select class=\"form-select\" name=\"table_name\"><option value=\"\">Choose a table</option>{tables}</select></div>\
         <div class=\"mb-2\"><textarea class=\"form-control font-monospace\" name=\"sql_query\" rows=\"4\">{sql}</textarea></div>\
         <button class=\"btn btn-primary\" type=\"submit\">Save view</button></form>\n",
        heading = heading,
        original = original,
        name = html_escape(&form.name),
        table_checked = table_checked,
        sql_checked = sql_checked,
        tables = select_options(&table_names, &[form.table.as_str()]),
        sql = html_escape(&form.sql),
    );

    if !page.tables.is_empty() {
        body.push_str("<h5>Source tables</h5>\n<ul class=\"small mb-4\">");
        for (table, columns) in page.tables {
            let described: Vec<String> = columns
                .iter()
                .map(|c| format!("{} <span class=\"text-muted\">{}</span>", html_escape(&c.name), html_escape(&c.data_type)))
                .collect();
            let _ = write!(body, "<li><code>{}</code>: {}</li>", html_escape(table), described.join(", "));
        }
        body.push_str("</ul>\n");
    }

    body.push_str("<h2>Saved views</h2>\n");
    if page.views.is_empty() {
        body.push_str("<p class=\"text-muted\">No views yet.</p>\n");
    }
    for view in page.views {
        let encoded = urlencoding::encode(&view.name);
        let _ = write!(
            body,
            "<div class=\"card mb-3\"><div class=\"card-body\">\
             <h5 class=\"card-title\">{name}</h5>\
             <p class=\"small text-muted\">{rows} rows, {cols} columns. Updated {updated}</p>\
             <pre class=\"small\">{query}</pre>\
             <div class=\"table-responsive\">{preview}</div>\
             <div class=\"d-flex gap-2\">\
             <a class=\"btn btn-sm btn-outline-secondary\" href=\"/views/{encoded}/edit\">Edit</a>\
             <form method=\"post\" action=\"/views/{encoded}/refresh\"><button class=\"btn btn-sm btn-outline-primary\">Refresh</button></form>\
             <a class=\"btn btn-sm btn-outline-secondary\" href=\"/duplicates?view_name={encoded}\">Duplicates</a>\
             <form method=\"post\" action=\"/views/{encoded}/delete\"><button class=\"btn btn-sm btn-outline-danger\">Delete</button></form>\
             </div></div></div>\n",
            name = html_escape(&view.name),
            rows = view.dataset.row_count(),
            cols = view.dataset.columns().len(),
            updated = view.updated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            query = html_escape(&view.query),
            preview = dataset_to_html(&view.dataset.head(VIEW_PREVIEW_ROWS)),
            encoded = encoded,
        );
    }

    layout(Section::Views, &page.notices, &body)
}

pub struct DuplicatesPage<'a> {
    pub views: &'a [StoredView],
    pub selected_view: Option<&'a StoredView>,
    pub selected_columns: &'a [String],
    pub report: Option<&'a DuplicateReport>,
    pub notices: Vec<Notice>,
}

pub fn duplicates_page(page: &DuplicatesPage<'_>) -> String {
    let mut body = String::new();
    let selected_name = page.selected_view.map(|v| v.name.as_str()).unwrap_or("");
    let _ = write!(
        body,
        "<h2>Duplicate rows</h2>\n<form method=\"get\" action=\"/duplicates\" class=\"mb-3\">\
         <div class=\"input-group\"><select class=\"form-select\" name=\"view_name\">\
         <option value=\"\">Choose a view</option>{options}</select>\
         <button class=\"btn btn-outline-secondary\">Load columns</button></div></form>\n",
        options = select_options(&view_names(page.views), &[selected_name]),
    );

    if let Some(view) = page.selected_view {
        let _ = write!(
            body,
            "<form method=\"post\" action=\"/duplicates\" class=\"mb-4\">\
             <input type=\"hidden\" name=\"view_name\" value=\"{}\"><div class=\"mb-2\">",
            html_escape(&view.name)
        );
        for column in view.dataset.column_names() {
            let checked = if page.selected_columns.iter().any(|c| c == column) { " checked" } else { "" };
            let _ = write!(
                body,
                "<label class=\"me-3\"><input type=\"checkbox\" name=\"columns\" value=\"{0}\"{1}> {0}</label>",
                html_escape(column),
                checked
            );
        }
        body.push_str("</div><button class=\"btn btn-primary\">Find duplicates</button></form>\n");
    }

    if let Some(report) = page.report {
        if report.has_duplicates() {
            let _ = write!(
                body,
                "<p>{} duplicate rows. All {} occurrences:</p><div class=\"table-responsive\">{}</div>\n",
                report.duplicate_count,
                report.rows.row_count(),
                dataset_to_html(&report.rows)
            );
        } else {
            body.push_str("<p class=\"text-muted\">No duplicate rows for the selected columns.</p>\n");
        }
    }

    layout(Section::Duplicates, &page.notices, &body)
}

/// Builder form state, either fresh or loaded from an item being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderForm {
    pub edit_id: Option<String>,
    pub view_name: Option<String>,
    pub viz_kind: String,
    pub viz_name: String,
    pub columns: ColumnMapping,
}

impl Default for BuilderForm {
    fn default() -> Self {
        Self {
            edit_id: None,
            view_name: None,
            viz_kind: VizKind::Table.as_str().to_string(),
            viz_name: String::new(),
            columns: ColumnMapping::default(),
        }
    }
}

pub struct DashboardPage<'a> {
    pub views: &'a [StoredView],
    pub view_columns: &'a [String],
    pub form: &'a BuilderForm,
    pub preview: Option<&'a Rendered>,
    pub items: &'a [(DashboardItem, FilterMetadata)],
    pub notices: Vec<Notice>,
}

fn builder_form(page: &DashboardPage<'_>) -> String {
    let form = page.form;
    let selected_view = form.view_name.as_deref().unwrap_or("");
    let edit_hidden = form
        .edit_id
        .as_deref()
        .map(|id| {
            let escaped = html_escape(id);
            format!(
                "<input type=\"hidden\" name=\"edit_id\" value=\"{0}\"><input type=\"hidden\" name=\"item_id\" value=\"{0}\">",
                escaped
            )
        })
        .unwrap_or_default();

    let mut html = String::new();
    let _ = write!(
        html,
        "<h2>{title}</h2>\n<form method=\"get\" action=\"/dashboard\" class=\"mb-3\">{edit_get}\
         <div class=\"input-group\"><select class=\"form-select\" name=\"view_name\">\
         <option value=\"\">Choose a view</option>{views}</select>\
         <button class=\"btn btn-outline-secondary\">Load columns</button></div></form>\n",
        title = if form.edit_id.is_some() { "Edit visualization" } else { "New visualization" },
        edit_get = form
            .edit_id
            .as_deref()
            .map(|id| format!("<input type=\"hidden\" name=\"edit_id\" value=\"{}\">", html_escape(id)))
            .unwrap_or_default(),
        views = select_options(&view_names(page.views), &[selected_view]),
    );

    let kinds: Vec<String> = VizKind::ALL.iter().map(|k| k.as_str().to_string()).collect();
    let names = form.columns.names.as_deref().unwrap_or("");
    let values = form.columns.values.as_deref().unwrap_or("");
    let _ = write!(
        html,
        "<form method=\"post\" action=\"/dashboard\" class=\"mb-4\">{edit_hidden}\
         <input type=\"hidden\" name=\"view_name\" value=\"{view}\">\
         <div class=\"row g-2 mb-2\">\
         <div class=\"col\"><label class=\"form-label\">Type</label><select class=\"form-select\" name=\"viz_type\">{kinds}</select></div>\
         <div class=\"col\"><label class=\"form-label\">Name</label><input class=\"form-control\" name=\"viz_name\" value=\"{viz_name}\"></div></div>\
         <div class=\"row g-2 mb-2\">\
         <div class=\"col\"><label class=\"form-label\">Names (pie)</label><select class=\"form-select\" name=\"names_column\"><option value=\"\"></option>{names}</select></div>\
         <div class=\"col\"><label class=\"form-label\">Values (pie)</label><select class=\"form-select\" name=\"value_column\"><option value=\"\"></option>{values}</select></div></div>\
         <div class=\"row g-2 mb-2\">\
         <div class=\"col\"><label class=\"form-label\">Table columns</label><select class=\"form-select\" name=\"table_columns\" multiple>{table_columns}</select></div>\
         <div class=\"col\"><label class=\"form-label\">Filter columns</label><select class=\"form-select\" name=\"filter_columns\" multiple>{filter_columns}</select></div></div>\
         <div class=\"d-flex gap-2\">\
         <button class=\"btn btn-outline-primary\" name=\"action\" value=\"preview\">Preview</button>{primary}</div></form>\n",
        edit_hidden = edit_hidden,
        view = html_escape(selected_view),
        kinds = select_options(&kinds, &[form.viz_kind.as_str()]),
        viz_name = html_escape(&form.viz_name),
        names = select_options(page.view_columns, &[names]),
        values = select_options(page.view_columns, &[values]),
        table_columns = select_options(page.view_columns, &form.columns.table_column_list()),
        filter_columns = select_options(page.view_columns, &form.columns.filter_column_list()),
        primary = if form.edit_id.is_some() {
            "<button class=\"btn btn-primary\" name=\"action\" value=\"update\">Update</button>"
        } else {
            "<button class=\"btn btn-primary\" name=\"action\" value=\"add\">Add to dashboard</button>"
        },
    );

    if let Some(preview) = page.preview {
        let _ = write!(html, "<h3>Preview</h3>\n{}\n", rendered_html(preview, "chart-preview"));
    }
    html
}

fn filter_form(item: &DashboardItem, metadata: &FilterMetadata) -> String {
    let mut html = format!(
        "<form method=\"post\" action=\"/dashboard\" class=\"mt-3\">\
         <input type=\"hidden\" name=\"action\" value=\"filter_saved\">\
         <input type=\"hidden\" name=\"item_id\" value=\"{}\">",
        html_escape(&item.id)
    );
    let operators: Vec<String> = Operator::ALL.iter().map(|op| op.as_str().to_string()).collect();
    let mut existing: Vec<(&str, &str, &str)> = item
        .filters_text
        .lines()
        .filter_map(|line| {
            let mut parts = line.trim().splitn(3, char::is_whitespace);
            Some((parts.next()?, parts.next()?, parts.next()?.trim()))
        })
        .collect();
    // one blank row for adding a clause
    existing.push(("", "", ""));

    for (index, (column, operator, value)) in existing.into_iter().enumerate() {
        let list_id = format!("values-{}-{}", item.id, index);
        let _ = write!(
            html,
            "<div class=\"row g-2 mb-2\">\
             <div class=\"col\"><select class=\"form-select form-select-sm\" name=\"filter_column\"><option value=\"\"></option>{columns}</select></div>\
             <div class=\"col-2\"><select class=\"form-select form-select-sm\" name=\"filter_operator\"><option value=\"\"></option>{operators}</select></div>\
             <div class=\"col\"><input class=\"form-control form-control-sm\" name=\"filter_value\" value=\"{value}\" list=\"{list_id}\"></div></div>",
            columns = select_options(&metadata.allowed, &[column]),
            operators = select_options(&operators, &[operator]),
            value = html_escape(value),
            list_id = html_escape(&list_id),
        );
        let suggestions = metadata
            .values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, values)| values.as_slice())
            .unwrap_or_default();
        let _ = write!(html, "<datalist id=\"{}\">", html_escape(&list_id));
        for suggestion in suggestions {
            let _ = write!(html, "<option value=\"{}\">", html_escape(suggestion));
        }
        html.push_str("</datalist>");
    }
    html.push_str("<button class=\"btn btn-sm btn-outline-primary\">Apply filters</button></form>");
    html
}

pub fn dashboard_page(page: &DashboardPage<'_>) -> String {
    let mut body = builder_form(page);
    body.push_str("<h2>Dashboard</h2>\n");
    if page.items.is_empty() {
        body.push_str("<p class=\"text-muted\">No visualizations yet.</p>\n");
    }
    for (item, metadata) in page.items {
        let encoded = urlencoding::encode(&item.id);
        let _ = write!(
            body,
            "<div class=\"card mb-3\"><div class=\"card-body\">\
             <h5 class=\"card-title\">{name}</h5>\
             <p class=\"small text-muted\">{kind} of <code>{view}</code></p>\
             {rendered}{filters}\
             <div class=\"d-flex gap-2 mt-2\">\
             <a class=\"btn btn-sm btn-outline-secondary\" href=\"/dashboard/{encoded}/edit\">Edit</a>\
             <form method=\"post\" action=\"/dashboard/{encoded}/delete\"><button class=\"btn btn-sm btn-outline-danger\">Delete</button></form>\
             </div></div></div>\n",
            name = html_escape(&item.name),
            kind = item.viz_kind.title(),
            view = html_escape(&item.view_name),
            rendered = rendered_html(&item.rendered, &format!("chart-{}", item.id)),
            filters = filter_form(item, metadata),
            encoded = encoded,
        );
    }
    layout(Section::Dashboard, &page.notices, &body)
}

pub struct SandboxPage<'a> {
    pub summaries: &'a [ViewSummary],
    pub sql: &'a str,
    pub result: Option<&'a Dataset>,
    pub new_view_name: &'a str,
    pub notices: Vec<Notice>,
}

pub fn sandbox_page(page: &SandboxPage<'_>) -> String {
    let mut body = String::from("<h2>Sandbox</h2>\n<div class=\"row\"><div class=\"col-md-3\"><h5>Views</h5>");
    if page.summaries.is_empty() {
        body.push_str("<p class=\"text-muted small\">No views registered.</p>");
    }
    for summary in page.summaries {
        let _ = write!(body, "<p class=\"mb-1\"><code>{}</code></p><ul class=\"small\">", html_escape(&summary.name));
        for (column, kind) in &summary.columns {
            let _ = write!(body, "<li>{} <span class=\"text-muted\">{}</span></li>", html_escape(column), kind.as_str());
        }
        body.push_str("</ul>");
    }
    let _ = write!(
        body,
        "</div><div class=\"col-md-9\">\
         <form method=\"post\" action=\"/sandbox\" class=\"mb-3\">\
         <textarea class=\"form-control font-monospace mb-2\" name=\"sql\" rows=\"6\">{sql}</textarea>\
         <div class=\"d-flex gap-2\">\
         <button class=\"btn btn-primary\" name=\"action\" value=\"run\">Run</button>\
         <input class=\"form-control w-auto\" name=\"new_view_name\" placeholder=\"New view name\" value=\"{new_view_name}\">\
         <button class=\"btn btn-outline-success\" name=\"action\" value=\"save\">Save as view</button>\
         </div></form>",
        sql = html_escape(page.sql),
        new_view_name = html_escape(page.new_view_name),
    );
    if let Some(result) = page.result {
        let _ = write!(
            body,
            "<p class=\"small text-muted\">{} rows</p><div class=\"table-responsive\">{}</div>",
            result.row_count(),
            dataset_to_html(result)
        );
    }
    body.push_str("</div></div>\n");
    layout(Section::Sandbox, &page.notices, &body)
}
