use tera::Context;

use crate::views::{ViewError, Views};

pub const VERIFICATION_SUBJECT: &str = "Verify Your BomaTrack Account";
pub const PASSWORD_RESET_SUBJECT: &str = "Reset Your BomaTrack Password";

#[derive(Debug, Clone)]
pub struct EmailContent {
    pub subject: String,
    pub html: String,
    pub text: String,
}

fn link(base_url: &str, path: &str, token: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("token", token)
        .finish();
    format!("{}/{}?{}", base_url.trim_end_matches('/'), path, query)
}

pub fn verification_link(base_url: &str, token: &str) -> String {
    link(base_url, "verify-email", token)
}

pub fn password_reset_link(base_url: &str, token: &str) -> String {
    link(base_url, "reset-password", token)
}

fn render(views: &Views, template: &str, subject: &str, name: &str, link: &str) -> Result<EmailContent, ViewError> {
    let mut context = Context::new();
    context.insert("name", if name.trim().is_empty() { "there" } else { name });
    context.insert("link", link);

    Ok(EmailContent {
        subject: subject.to_string(),
        html: views.render(&format!("emails/{}.html", template), &context)?,
        text: views.render(&format!("emails/{}.txt", template), &context)?,
    })
}

pub fn verification(views: &Views, name: &str, link: &str) -> Result<EmailContent, ViewError> {
    render(views, "verification", VERIFICATION_SUBJECT, name, link)
}

pub fn password_reset(views: &Views, name: &str, link: &str) -> Result<EmailContent, ViewError> {
    render(views, "password_reset", PASSWORD_RESET_SUBJECT, name, link)
}
