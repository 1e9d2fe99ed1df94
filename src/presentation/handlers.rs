// HTTP request handlers
use crate::application::dashboard_service::{FilterInput, VisualizationRequest};
use crate::application::view_service::{QuerySource, SaveViewRequest};
use crate::domain::dashboard::{ColumnMapping, DashboardItem, Rendered};
use crate::presentation::app_state::AppState;
use crate::presentation::form_fields::FormFields;
use crate::presentation::pages::{
    dashboard_page, duplicates_page, sandbox_page, views_page, BuilderForm, DashboardPage, DuplicatesPage, Notice,
    SandboxPage, ViewForm, ViewsPage,
};
use axum::{
    extract::{Form, Path, Query, State},
    response::{Html, Redirect},
};
use serde::Deserialize;
use std::sync::Arc;

type Pairs = Vec<(String, String)>;

#[derive(Deserialize)]
pub struct ViewsQuery {
    pub edit: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn index() -> Redirect {
    Redirect::to("/views")
}

async fn render_views(state: &AppState, form: ViewForm, mut notices: Vec<Notice>) -> Html<String> {
    let names = match state.view_service.list_tables().await {
        Ok(names) => names,
        Err(e) => {
            tracing::warn!("Error listing source tables: {}", e);
            notices.push(Notice::Error(format!("could not list source tables: {}", e)));
            Vec::new()
        }
    };
    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let columns = state.view_service.describe_table(&name).await.unwrap_or_else(|e| {
            tracing::warn!("Error describing table {}: {}", name, e);
            Vec::new()
        });
        tables.push((name, columns));
    }
    let views = state.view_service.list_views();
    Html(views_page(&ViewsPage {
        tables: &tables,
        views: &views,
        form,
        notices,
    }))
}

/// Views page, with the edit form loaded when `?edit=` names a view
pub async fn list_views(Query(query): Query<ViewsQuery>, State(state): State<Arc<AppState>>) -> Html<String> {
    let form = query
        .edit
        .as_deref()
        .and_then(|name| state.view_service.get_view(name))
        .map(|view| ViewForm::editing(&view))
        .unwrap_or_default();
    render_views(&state, form, Vec::new()).await
}

/// Create a view, or edit one when the form carries `original_name`
pub async fn save_view(State(state): State<Arc<AppState>>, Form(pairs): Form<Pairs>) -> Html<String> {
    let fields = FormFields::new(pairs);
    let form = ViewForm {
        original_name: fields.cleaned("original_name"),
        name: fields.get("view_name").unwrap_or_default().trim().to_string(),
        use_sql: fields.get("query_source") == Some("sql"),
        table: fields.get("table_name").unwrap_or_default().trim().to_string(),
        sql: fields.get("sql_query").unwrap_or_default().to_string(),
    };
    let request = SaveViewRequest {
        original_name: form.original_name.clone(),
        name: form.name.clone(),
        source: if form.use_sql {
            QuerySource::Sql(form.sql.clone())
        } else {
            QuerySource::Table(form.table.clone())
        },
    };

    match state.view_service.save(request).await {
        Ok(view) => {
            let notice = Notice::Success(format!(
                "View '{}' saved with {} rows",
                view.name,
                view.dataset.row_count()
            ));
            render_views(&state, ViewForm::default(), vec![notice]).await
        }
        Err(e) => render_views(&state, form, vec![Notice::Error(e.to_string())]).await,
    }
}

pub async fn delete_view(Path(name): Path<String>, State(state): State<Arc<AppState>>) -> Redirect {
    state.view_service.delete(&name);
    Redirect::to("/views")
}

/// Re-run a view's query; the service keeps the old data on failure
pub async fn refresh_view(Path(name): Path<String>, State(state): State<Arc<AppState>>) -> Redirect {
    if let Err(e) = state.view_service.refresh(&name).await {
        tracing::debug!("Refresh of {} did not complete: {}", name, e);
    }
    Redirect::to("/views")
}

pub async fn edit_view(Path(name): Path<String>, State(state): State<Arc<AppState>>) -> Redirect {
    match state.view_service.get_view(&name) {
        Some(view) => Redirect::to(&format!("/views?edit={}", urlencoding::encode(&view.name))),
        None => Redirect::to("/views"),
    }
}

fn render_duplicates(state: &AppState, fields: &FormFields, submitted: bool) -> Html<String> {
    let views = state.view_service.list_views();
    let view_name = fields.cleaned("view_name");
    let selected = view_name
        .as_deref()
        .and_then(|name| views.iter().find(|v| v.name == name));
    let columns: Vec<String> = fields
        .get_all("columns")
        .into_iter()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect();

    let mut notices = Vec::new();
    let mut report = None;
    match (view_name.as_deref(), selected) {
        (Some(name), None) => notices.push(Notice::Error(format!("view '{}' not found", name))),
        (Some(name), Some(_)) if submitted || !columns.is_empty() => {
            match state.view_service.duplicates(name, &columns) {
                Ok(found) => report = Some(found),
                Err(e) => notices.push(Notice::Error(e.to_string())),
            }
        }
        _ => {}
    }

    Html(duplicates_page(&DuplicatesPage {
        views: &views,
        selected_view: selected,
        selected_columns: &columns,
        report: report.as_ref(),
        notices,
    }))
}

pub async fn duplicates(Query(pairs): Query<Pairs>, State(state): State<Arc<AppState>>) -> Html<String> {
    render_duplicates(&state, &FormFields::new(pairs), false)
}

pub async fn find_duplicates(State(state): State<Arc<AppState>>, Form(pairs): Form<Pairs>) -> Html<String> {
    render_duplicates(&state, &FormFields::new(pairs), true)
}

/// Builder state from `edit_id` (item being edited) and `view_name`
fn builder_state(state: &AppState, fields: &FormFields) -> BuilderForm {
    let edit_item = fields
        .cleaned("edit_id")
        .and_then(|id| state.dashboard_service.get_item(&id));
    let mut form = match edit_item {
        Some(item) => BuilderForm {
            edit_id: Some(item.id),
            view_name: Some(item.view_name),
            viz_kind: item.viz_kind.as_str().to_string(),
            viz_name: item.name,
            columns: item.columns,
        },
        None => BuilderForm::default(),
    };
    if let Some(view_name) = fields.cleaned("view_name") {
        form.view_name = Some(view_name);
    }
    form
}

fn read_builder_fields(fields: &FormFields, form: &mut BuilderForm) {
    form.view_name = fields.cleaned("view_name");
    if let Some(kind) = fields.cleaned("viz_type") {
        form.viz_kind = kind;
    }
    if let Some(name) = fields.get("viz_name") {
        form.viz_name = name.trim().to_string();
    }
    form.columns = ColumnMapping {
        names: fields.cleaned("names_column"),
        values: fields.cleaned("value_column"),
        table_columns: fields.joined_list("table_columns"),
        filter_columns: fields.joined_list("filter_columns"),
    };
}

fn filter_inputs(fields: &FormFields) -> Vec<FilterInput> {
    let columns = fields.get_all("filter_column");
    let operators = fields.get_all("filter_operator");
    let values = fields.get_all("filter_value");
    let count = columns.len().max(operators.len()).max(values.len());
    (0..count)
        .map(|i| FilterInput {
            column: columns.get(i).copied().unwrap_or_default().to_string(),
            operator: operators.get(i).copied().unwrap_or_default().to_string(),
            value: values.get(i).copied().unwrap_or_default().to_string(),
        })
        .collect()
}

fn render_dashboard(
    state: &AppState,
    form: &BuilderForm,
    preview: Option<&Rendered>,
    notices: Vec<Notice>,
) -> Html<String> {
    let service = &state.dashboard_service;
    let views = state.view_service.list_views();
    let view_columns = form
        .view_name
        .as_deref()
        .map(|name| service.view_columns(name))
        .unwrap_or_default();
    let items: Vec<_> = service
        .list_items()
        .into_iter()
        .map(|item| {
            let metadata = service.filter_metadata(&item);
            (item, metadata)
        })
        .collect();

    Html(dashboard_page(&DashboardPage {
        views: &views,
        view_columns: &view_columns,
        form,
        preview,
        items: &items,
        notices,
    }))
}

pub async fn dashboard(Query(pairs): Query<Pairs>, State(state): State<Arc<AppState>>) -> Html<String> {
    let form = builder_state(&state, &FormFields::new(pairs));
    render_dashboard(&state, &form, None, Vec::new())
}

/// Builder and per-item filter form submissions, dispatched on `action`
pub async fn dashboard_action(State(state): State<Arc<AppState>>, Form(pairs): Form<Pairs>) -> Html<String> {
    let fields = FormFields::new(pairs);
    let service = &state.dashboard_service;
    let mut form = builder_state(&state, &fields);
    let action = fields.get("action").unwrap_or_default().trim();
    if action != "filter_saved" {
        read_builder_fields(&fields, &mut form);
    }

    let request = || VisualizationRequest {
        name: Some(form.viz_name.clone()),
        view_name: form.view_name.clone(),
        viz_kind: form.viz_kind.clone(),
        columns: form.columns.clone(),
        filters_text: form
            .edit_id
            .as_deref()
            .and_then(|id| service.get_item(id))
            .map(|item| item.filters_text)
            .unwrap_or_default(),
    };
    let item_id = fields.cleaned("item_id");
    let saved = |item: DashboardItem, verb: &str| Notice::Success(format!("{} '{}'", verb, item.name));

    let mut notices = Vec::new();
    let mut preview = None;
    match (action, item_id) {
        ("preview", _) | ("update", None) => match service.preview(request()) {
            Ok(rendered) => preview = Some(rendered),
            Err(e) => notices.push(Notice::Error(e.to_string())),
        },
        ("add", _) => match service.add(request()) {
            Ok(item) => notices.push(saved(item, "Added")),
            Err(e) => notices.push(Notice::Error(e.to_string())),
        },
        ("update", Some(id)) => match service.update(&id, request()) {
            Ok(item) => notices.push(saved(item, "Updated")),
            Err(e) => notices.push(Notice::Error(e.to_string())),
        },
        ("filter_saved", Some(id)) => match service.apply_filters(&id, &filter_inputs(&fields)) {
            Ok(item) => notices.push(saved(item, "Applied filters to")),
            Err(e) => notices.push(Notice::Error(e.to_string())),
        },
        ("filter_saved", None) => notices.push(Notice::Error("missing dashboard item".to_string())),
        _ => {}
    }

    render_dashboard(&state, &form, preview.as_ref(), notices)
}

pub async fn delete_dashboard_item(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> Redirect {
    state.dashboard_service.delete(&id);
    Redirect::to("/dashboard")
}

pub async fn edit_dashboard_item(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> Redirect {
    match state.dashboard_service.get_item(&id) {
        Some(item) => Redirect::to(&format!("/dashboard?edit_id={}", urlencoding::encode(&item.id))),
        None => Redirect::to("/dashboard"),
    }
}

pub async fn sandbox(State(state): State<Arc<AppState>>) -> Html<String> {
    let summaries = state.sandbox_service.view_summaries();
    Html(sandbox_page(&SandboxPage {
        summaries: &summaries,
        sql: "",
        result: None,
        new_view_name: "",
        notices: Vec::new(),
    }))
}

/// Run an ad-hoc query; `action=save` also keeps the result as a view
pub async fn run_sandbox(State(state): State<Arc<AppState>>, Form(pairs): Form<Pairs>) -> Html<String> {
    let fields = FormFields::new(pairs);
    let sql = fields.get("sql").unwrap_or_default();
    let new_view_name = fields.get("new_view_name").unwrap_or_default().trim();
    let mut notices = Vec::new();
    let mut result = None;

    match state.sandbox_service.run(sql).await {
        Ok(dataset) => {
            if fields.get("action") == Some("save") {
                if new_view_name.is_empty() {
                    notices.push(Notice::Error("enter a name for the new view".to_string()));
                } else {
                    match state.sandbox_service.save_result(new_view_name, sql, dataset.clone()) {
                        Ok(view) => notices.push(Notice::Success(format!("Saved result as view '{}'", view.name))),
                        Err(e) => notices.push(Notice::Error(e.to_string())),
                    }
                }
            }
            result = Some(dataset);
        }
        Err(e) => notices.push(Notice::Error(e.to_string())),
    }

    // summaries after a save so the new view is listed
    let summaries = state.sandbox_service.view_summaries();
    Html(sandbox_page(&SandboxPage {
        summaries: &summaries,
        sql,
        result: result.as_ref(),
        new_view_name,
        notices,
    }))
}
