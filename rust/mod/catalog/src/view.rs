use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde_json::{Map, Value};

use locallib_core::ServiceError;

/// What a controller decided to do with a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    /// Render `template` with `context`.
    Render {
        template: &'static str,
        context: Value,
    },
    /// Send the client to another URL.
    Redirect(String),
}

impl Page {
    pub fn render(template: &'static str, context: Value) -> Self {
        Page::Render { template, context }
    }

    pub fn redirect(url: impl Into<String>) -> Self {
        Page::Redirect(url.into())
    }

    pub fn template(&self) -> Option<&str> {
        match self {
            Page::Render { template, .. } => Some(template),
            Page::Redirect(_) => None,
        }
    }

    pub fn context(&self) -> Option<&Value> {
        match self {
            Page::Render { context, .. } => Some(context),
            Page::Redirect(_) => None,
        }
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Page::Redirect(url) => Some(url),
            Page::Render { .. } => None,
        }
    }

    /// Turn the page into an HTTP response. Redirects use 303 See Other.
    pub fn into_response_with(self, views: &dyn ViewRenderer) -> Result<Response, ServiceError> {
        match self {
            Page::Render { template, context } => views.render(template, &context),
            Page::Redirect(url) => Ok(Redirect::to(&url).into_response()),
        }
    }
}

/// Produces a response body from a template name and its payload.
pub trait ViewRenderer: Send + Sync {
    fn render(&self, template: &str, context: &Value) -> Result<Response, ServiceError>;
}

/// Renders the payload as JSON, with the template name under `"view"`.
pub struct JsonRenderer;

impl ViewRenderer for JsonRenderer {
    fn render(&self, template: &str, context: &Value) -> Result<Response, ServiceError> {
        let mut body = Map::new();
        body.insert("view".into(), Value::String(template.to_string()));
        match context {
            Value::Object(fields) => {
                for (k, v) in fields {
                    body.insert(k.clone(), v.clone());
                }
            }
            Value::Null => {}
            other => {
                body.insert("context".into(), other.clone());
            }
        }
        Ok(Json(Value::Object(body)).into_response())
    }
}
