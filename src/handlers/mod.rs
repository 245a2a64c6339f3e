// Request handlers, split by who may reach them:
// public (anonymous or any session) and protected (signed-in owners).
pub mod forms;
pub mod protected;
pub mod public;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tera::Context;

use crate::error::AppError;
use crate::state::AppState;

/// Query string shared by every page: record id, filters and the flash
/// flags set by the redirect after a write.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub id: Option<String>,
    pub property_id: Option<String>,
    pub token: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub deleted: Option<String>,
    pub reset: Option<String>,
    pub error: Option<String>,
}

impl PageQuery {
    pub fn id(&self) -> Option<i64> {
        parse_id(self.id.as_deref())
    }

    pub fn property_id(&self) -> Option<i64> {
        parse_id(self.property_id.as_deref())
    }

    /// Success and error banners for a listing of `noun` records.
    pub fn flash(&self, noun: &str) -> Flash {
        let success = if self.created.is_some() {
            Some(format!("{} created successfully", noun))
        } else if self.updated.is_some() {
            Some(format!("{} updated successfully", noun))
        } else if self.deleted.is_some() {
            Some(format!("{} deleted successfully", noun))
        } else {
            None
        };

        let error = self.error.as_deref().map(|code| match code {
            "delete_failed" => format!("Failed to delete {}. Please try again.", noun.to_lowercase()),
            "not_found" => format!("{} not found.", noun),
            _ => "Something went wrong. Please try again.".to_string(),
        });

        Flash { success, error }
    }
}

fn parse_id(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok()).filter(|id| *id > 0)
}

#[derive(Debug, Clone, Default)]
pub struct Flash {
    pub success: Option<String>,
    pub error: Option<String>,
}

impl Flash {
    pub fn apply(&self, context: &mut Context) {
        context.insert("success", &self.success);
        context.insert("error", &self.error);
    }
}

/// Render a page; `status` lets re-rendered forms report what happened.
pub fn render(state: &AppState, template: &str, context: &Context, status: StatusCode) -> Result<Response, AppError> {
    let page = state.views.page(template, context)?;
    Ok((status, page).into_response())
}

pub fn redirect_with_cookie(location: &str, cookie: String) -> Response {
    ([(header::SET_COOKIE, cookie)], Redirect::to(location)).into_response()
}

pub fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_messages_follow_flags() {
        let query = PageQuery {
            deleted: Some("1".into()),
            ..PageQuery::default()
        };
        let flash = query.flash("Tenant");
        assert_eq!(flash.success.as_deref(), Some("Tenant deleted successfully"));
        assert!(flash.error.is_none());

        let query = PageQuery {
            error: Some("delete_failed".into()),
            ..PageQuery::default()
        };
        assert_eq!(
            query.flash("Unit").error.as_deref(),
            Some("Failed to delete unit. Please try again.")
        );
    }

    #[test]
    fn ids_must_be_positive_integers() {
        let query = PageQuery {
            id: Some("12".into()),
            property_id: Some("-3".into()),
            ..PageQuery::default()
        };
        assert_eq!(query.id(), Some(12));
        assert_eq!(query.property_id(), None);
        assert_eq!(PageQuery::default().id(), None);
    }
}
