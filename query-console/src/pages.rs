//! HTML page rendering.
//!
//! Templates are compiled into the binary and registered once at startup.
//! Their `.html` names switch on minijinja's HTML auto-escaping, so
//! connection names and row values are always escaped.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use minijinja::{context, Environment};

use common::errors::{AppError, AppResult};
use common::models::connection::RegistryState;
use common::models::query::QueryResultRow;

const TEMPLATES: [(&str, &str); 4] = [
    ("base.html", include_str!("../templates/base.html")),
    ("query.html", include_str!("../templates/query.html")),
    ("admin.html", include_str!("../templates/admin.html")),
    ("results.html", include_str!("../templates/results.html")),
];

/// Registered page templates.
pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    pub fn new() -> AppResult<Self> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source)
                .map_err(|e| AppError::Internal(format!("template {} failed to parse: {}", name, e)))?;
        }
        Ok(Self { env })
    }

    /// Query form listing the registered connections.
    pub fn query_page(&self, state: &RegistryState) -> AppResult<String> {
        self.render(
            "query.html",
            context! {
                connections => state.names(),
                selected => state.selected.as_deref(),
            },
        )
    }

    /// Connection registration form. `password` is carried into the form
    /// action; without one the page points to the JSON API instead, since a
    /// browser form cannot send a bearer token.
    pub fn admin_page(&self, password: Option<&str>) -> AppResult<String> {
        self.render("admin.html", context! { password => password })
    }

    /// Result table.
    pub fn results_page(&self, rows: &[QueryResultRow]) -> AppResult<String> {
        self.render("results.html", context! { rows => rows })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> AppResult<String> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .map_err(|e| AppError::Internal(format!("failed to render {}: {}", name, e)))
    }
}

/// Error returned from page handlers.
///
/// Answers with a plain-text body like the form routes always have, instead
/// of the JSON envelope used by the API.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<validator::ValidationErrors> for PageError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self(AppError::from(errors))
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status: StatusCode = self.0.status_code();
        self.0.log();
        (status, self.0.public_message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(names: &[&str], selected: Option<&str>) -> RegistryState {
        let mut state = RegistryState::default();
        for name in names {
            state.connections.insert(name.to_string(), format!("sqlite:{}.db", name));
        }
        state.selected = selected.map(String::from);
        state
    }

    #[test]
    fn test_query_page_lists_names_and_preselects() {
        let pages = Pages::new().unwrap();
        let html = pages
            .query_page(&state(&["replica", "primary"], Some("replica")))
            .unwrap();

        let primary = html.find(r#"<option value="primary">"#).unwrap();
        let replica = html.find(r#"<option value="replica" selected>"#).unwrap();
        assert!(primary < replica);
        assert!(!html.contains("sqlite:"));
    }

    #[test]
    fn test_connection_names_are_escaped() {
        let pages = Pages::new().unwrap();
        let html = pages.query_page(&state(&["<script>x</script>"], None)).unwrap();
        assert!(!html.contains("<script>x</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_admin_form_carries_password() {
        let pages = Pages::new().unwrap();
        let html = pages.admin_page(Some("a b&c")).unwrap();
        assert!(html.contains(r#"action="/save?password=a%20b%26c""#));
    }

    #[test]
    fn test_admin_page_without_password_has_no_form() {
        let pages = Pages::new().unwrap();
        let html = pages.admin_page(None).unwrap();
        assert!(!html.contains("<form"));
        assert!(html.contains("/api/admin/connections"));
    }

    #[test]
    fn test_results_page_renders_rows() {
        let pages = Pages::new().unwrap();
        let rows = vec![QueryResultRow {
            column1: "25".into(),
            column2: "0700000000".into(),
            column3: "<b>hi</b>".into(),
        }];
        let html = pages.results_page(&rows).unwrap();
        assert!(html.contains("<td>25</td>"));
        assert!(html.contains("&lt;b&gt;hi"));
        assert!(!html.contains("<b>hi</b>"));
        assert!(!html.contains("No rows."));

        let empty = pages.results_page(&[]).unwrap();
        assert!(empty.contains("No rows."));
    }
}
