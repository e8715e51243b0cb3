//! Dashboard pages and their form actions

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use tera::Context;

use super::{regenerate_blocking, ServerState, SharedState};
use crate::config::{DashboardConfig, Language, Profile, Settings, Theme};
use crate::error::{Error, Result};
use crate::templates::{dashboard_nav, PostData, SiteData};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub(super) struct PostForm {
    title: String,
    content: String,
}

impl PostForm {
    fn missing_field(&self) -> Option<&'static str> {
        if self.title.trim().is_empty() {
            Some("Title is required")
        } else if self.content.trim().is_empty() {
            Some("Content is required")
        } else {
            None
        }
    }
}

/// Checkboxes are only submitted when ticked
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct SettingsForm {
    theme: String,
    language: String,
    timezone: String,
    email_notifications: Option<String>,
    push_notifications: Option<String>,
    newsletter: Option<String>,
    two_factor_auth: Option<String>,
}

impl SettingsForm {
    fn into_settings(self) -> Result<Settings> {
        let settings = Settings {
            theme: self.theme.parse::<Theme>()?,
            language: self.language.parse::<Language>()?,
            email_notifications: self.email_notifications.is_some(),
            push_notifications: self.push_notifications.is_some(),
            newsletter: self.newsletter.is_some(),
            two_factor_auth: self.two_factor_auth.is_some(),
            timezone: self.timezone.trim().to_string(),
        };
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct ProfileForm {
    name: String,
    email: String,
    bio: String,
    avatar: String,
}

impl From<ProfileForm> for Profile {
    fn from(form: ProfileForm) -> Self {
        Profile {
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            bio: form.bio.trim().to_string(),
            avatar: form.avatar.trim().to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct SavedQuery {
    saved: Option<String>,
}

/// An entry of a `<select>`
#[derive(Debug, Serialize)]
struct SelectOption {
    value: &'static str,
    label: &'static str,
}

/// Page context shared by every dashboard page
fn page_context(state: &ServerState, current: &str) -> (Context, DashboardConfig) {
    let dashboard = state.blog().dashboard();
    let mut context = Context::new();
    context.insert("site", &SiteData::from_config(&state.blog().config));
    context.insert("settings", &dashboard.settings);
    context.insert("profile", &dashboard.profile);
    context.insert("nav", &dashboard_nav(current));
    context.insert("notice", "");
    context.insert("error", "");
    (context, dashboard)
}

fn render(state: &ServerState, template: &str, context: &Context) -> Result<Response> {
    let html = state.renderer().render(template, context)?;
    Ok(Html(html).into_response())
}

fn with_status(status: StatusCode, page: Result<Response>) -> Result<Response> {
    page.map(|response| (status, response).into_response())
}

/// Render an error inside the dashboard layout
pub(super) fn error_page(state: &ServerState, error: &Error) -> Result<Response> {
    let status = error.status_code();
    let (mut context, _) = page_context(state, "");
    context.insert("status", &status.as_u16());
    context.insert("message", &error.to_string());
    with_status(status, render(state, "dashboard/error.html", &context))
}

pub(super) async fn home(State(state): State<SharedState>) -> Response {
    state.respond(render_home(&state))
}

fn render_home(state: &ServerState) -> Result<Response> {
    let (mut context, dashboard) = page_context(state, "/dashboard");
    let posts: Vec<PostData> = state
        .blog()
        .posts()
        .list_all()
        .iter()
        .map(|p| PostData::from_post(p, &state.blog().config))
        .collect();
    context.insert("posts", &posts);
    context.insert("local_time", &dashboard.settings.local_now());
    render(state, "dashboard/home.html", &context)
}

fn render_post_form(
    state: &ServerState,
    form: &PostForm,
    editing: Option<&str>,
    error: Option<&str>,
) -> Result<Response> {
    let (mut context, _) = page_context(state, "/dashboard/posts/");
    let action = match editing {
        Some(slug) => format!(
            "/dashboard/posts/edit/{}",
            utf8_percent_encode(slug, NON_ALPHANUMERIC)
        ),
        None => "/dashboard/posts/".to_string(),
    };
    context.insert("form", form);
    context.insert("editing", &editing.is_some());
    context.insert("action", &action);
    if let Some(error) = error {
        context.insert("error", error);
    }
    let page = render(state, "dashboard/post_form.html", &context);
    if error.is_some() {
        with_status(StatusCode::BAD_REQUEST, page)
    } else {
        page
    }
}

pub(super) async fn new_post_page(State(state): State<SharedState>) -> Response {
    state.respond(render_post_form(&state, &PostForm::default(), None, None))
}

pub(super) async fn create_post(
    State(state): State<SharedState>,
    Form(form): Form<PostForm>,
) -> Response {
    if let Some(error) = form.missing_field() {
        return state.respond(render_post_form(&state, &form, None, Some(error)));
    }

    let result = state.blog().posts().create(&form.title, &form.content);
    state.respond(redirect_after_write(&state, result).await)
}

pub(super) async fn edit_post_page(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Response {
    let result = match state.blog().posts().find_by_slug(&slug) {
        Some(post) => {
            let form = PostForm {
                title: post.title,
                content: post.content,
            };
            render_post_form(&state, &form, Some(&slug), None)
        }
        None => Err(Error::NotFound(format!("post '{}'", slug))),
    };
    state.respond(result)
}

pub(super) async fn update_post(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
    Form(form): Form<PostForm>,
) -> Response {
    if let Some(error) = form.missing_field() {
        return state.respond(render_post_form(&state, &form, Some(&slug), Some(error)));
    }

    let result = state
        .blog()
        .posts()
        .overwrite(&slug, &form.title, &form.content);
    state.respond(redirect_after_write(&state, result).await)
}

pub(super) async fn delete_post(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Response {
    let result = state.blog().posts().delete(&slug);
    state.respond(redirect_after_write(&state, result).await)
}

/// Rebuild the site after a successful post write and go back to the list
async fn redirect_after_write<T>(state: &SharedState, written: Result<T>) -> Result<Response> {
    written?;
    regenerate_blocking(state).await;
    Ok(Redirect::to("/dashboard").into_response())
}

fn render_settings(
    state: &ServerState,
    notice: Option<&str>,
    error: Option<&str>,
) -> Result<Response> {
    let (mut context, _) = page_context(state, "/dashboard/settings");
    let themes: Vec<SelectOption> = Theme::ALL
        .iter()
        .map(|t| SelectOption {
            value: t.as_str(),
            label: t.label(),
        })
        .collect();
    let languages: Vec<SelectOption> = Language::ALL
        .iter()
        .map(|l| SelectOption {
            value: l.code(),
            label: l.label(),
        })
        .collect();
    context.insert("themes", &themes);
    context.insert("languages", &languages);
    if let Some(notice) = notice {
        context.insert("notice", notice);
    }
    if let Some(error) = error {
        context.insert("error", error);
    }
    render(state, "dashboard/settings.html", &context)
}

pub(super) async fn settings_page(
    State(state): State<SharedState>,
    Query(query): Query<SavedQuery>,
) -> Response {
    let notice = query.saved.map(|_| "Settings saved successfully!");
    state.respond(render_settings(&state, notice, None))
}

pub(super) async fn save_settings(
    State(state): State<SharedState>,
    Form(form): Form<SettingsForm>,
) -> Response {
    let result = match form.into_settings() {
        Ok(settings) => {
            let mut dashboard = state.blog().dashboard();
            dashboard.settings = settings;
            dashboard
                .save(&state.blog().base_dir)
                .map(|()| Redirect::to("/dashboard/settings?saved=1").into_response())
        }
        Err(e @ Error::InvalidField { .. }) => with_status(
            StatusCode::BAD_REQUEST,
            render_settings(&state, None, Some(&e.to_string())),
        ),
        Err(e) => Err(e),
    };
    state.respond(result)
}

pub(super) async fn profile_page(State(state): State<SharedState>) -> Response {
    let (mut context, _) = page_context(&state, "/dashboard/profile");
    context.insert("post_count", &state.blog().posts().list_all().len());
    state.respond(render(&state, "dashboard/profile.html", &context))
}

fn render_profile_form(
    state: &ServerState,
    form: &Profile,
    error: Option<&str>,
) -> Result<Response> {
    let (mut context, _) = page_context(state, "/dashboard/profile");
    context.insert("form", form);
    match error {
        Some(error) => {
            context.insert("error", error);
            with_status(
                StatusCode::BAD_REQUEST,
                render(state, "dashboard/profile_edit.html", &context),
            )
        }
        None => render(state, "dashboard/profile_edit.html", &context),
    }
}

pub(super) async fn edit_profile_page(State(state): State<SharedState>) -> Response {
    let profile = state.blog().dashboard().profile;
    state.respond(render_profile_form(&state, &profile, None))
}

pub(super) async fn save_profile(
    State(state): State<SharedState>,
    Form(form): Form<ProfileForm>,
) -> Response {
    let profile = Profile::from(form);
    let result = match profile.validate() {
        Ok(()) => {
            let mut dashboard = state.blog().dashboard();
            dashboard.profile = profile;
            dashboard
                .save(&state.blog().base_dir)
                .map(|()| Redirect::to("/dashboard/profile").into_response())
        }
        Err(e) => render_profile_form(&state, &profile, Some(&e.to_string())),
    };
    state.respond(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_form_checkboxes() {
        let form = SettingsForm {
            theme: "dark".to_string(),
            language: "fr".to_string(),
            timezone: " Europe/Paris ".to_string(),
            newsletter: Some("on".to_string()),
            ..Default::default()
        };
        let settings = form.into_settings().unwrap();
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.language, Language::Fr);
        assert!(settings.newsletter);
        assert!(!settings.email_notifications);
        assert_eq!(settings.timezone, "Europe/Paris");
    }

    #[test]
    fn test_settings_form_rejects_unknown_values() {
        let form = SettingsForm {
            theme: "neon".to_string(),
            language: "en".to_string(),
            timezone: "UTC".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            form.into_settings(),
            Err(Error::InvalidField { .. })
        ));

        let form = SettingsForm {
            theme: "light".to_string(),
            language: "en".to_string(),
            timezone: "Mars/Olympus".to_string(),
            ..Default::default()
        };
        assert!(form.into_settings().is_err());
    }

    #[test]
    fn test_post_form_missing_field() {
        let form = PostForm {
            title: "  ".to_string(),
            content: "x".to_string(),
        };
        assert_eq!(form.missing_field(), Some("Title is required"));
        let form = PostForm {
            title: "T".to_string(),
            content: String::new(),
        };
        assert_eq!(form.missing_field(), Some("Content is required"));
    }
}
