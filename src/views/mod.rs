//! Server-side HTML rendering. Templates are compiled into the binary and
//! registered once; handlers pass a [`tera::Context`] built from their
//! view-model.

mod filters;

use axum::response::Html;
use std::sync::Arc;
use tera::{Context, Tera};
use thiserror::Error;

use crate::auth::SessionContext;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

macro_rules! template {
    ($name:literal) => {
        ($name, include_str!(concat!("../../templates/", $name)))
    };
}

const TEMPLATES: &[(&str, &str)] = &[
    template!("layout.html"),
    template!("auth/login.html"),
    template!("auth/register.html"),
    template!("auth/register_success.html"),
    template!("auth/verify_email.html"),
    template!("auth/resend_verification.html"),
    template!("auth/forgot_password.html"),
    template!("auth/reset_password.html"),
    template!("dashboard.html"),
    template!("profile.html"),
    template!("properties/index.html"),
    template!("properties/form.html"),
    template!("units/index.html"),
    template!("units/form.html"),
    template!("tenants/index.html"),
    template!("tenants/form.html"),
    template!("payments/index.html"),
    template!("payments/form.html"),
    template!("emails/verification.html"),
    template!("emails/verification.txt"),
    template!("emails/password_reset.html"),
    template!("emails/password_reset.txt"),
];

#[derive(Clone)]
pub struct Views {
    tera: Arc<Tera>,
}

impl Views {
    pub fn new() -> Result<Self, ViewError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())?;
        tera.register_filter("money", filters::money);
        Ok(Self { tera: Arc::new(tera) })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<String, ViewError> {
        Ok(self.tera.render(name, context)?)
    }

    pub fn page(&self, name: &str, context: &Context) -> Result<Html<String>, ViewError> {
        self.render(name, context).map(Html)
    }
}

/// Context pre-populated with what the layout needs.
pub fn base_context(title: &str, session: Option<&SessionContext>) -> Context {
    let mut context = Context::new();
    context.insert("title", title);
    context.insert("session", &session);
    context
}
