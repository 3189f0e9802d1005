/// Post handlers - listings, post pages and the create/edit form
use actix_web::{web, HttpResponse};
use tracing::{debug, info};

use super::{html, html_with_csrf, paginator, post_url, profile_url, redirect};
use crate::cache::{cached_page, index_page_key, store_page, PageCache};
use crate::config::SiteSettings;
use crate::db::{BlogStore, PostScope};
use crate::error::Result;
use crate::forms::{CommentForm, FormErrors, PostForm};
use crate::media::MediaStorage;
use crate::middleware::{check_post_ownership, CsrfForm, CsrfToken, LoginRequired, Viewer};
use crate::models::{Group, User};
use crate::pagination::PageQuery;
use crate::services::{CommentService, FollowService, PostService};
use crate::templates::{base_context, Templates};

const POST_FORM_FIELDS: &[&str] = &["text", "group", "image"];

/// Home page: every post, newest first. Rendered pages are served from the
/// page cache until they expire, so new posts show up with a delay.
pub async fn index(
    store: web::Data<dyn BlogStore>,
    cache: web::Data<dyn PageCache>,
    templates: web::Data<Templates>,
    settings: web::Data<SiteSettings>,
    viewer: Viewer,
    query: PageQuery,
) -> Result<HttpResponse> {
    let requested = query.page.as_deref();
    let key = index_page_key(viewer.id(), requested);
    if let Some(body) = cached_page(cache.get_ref(), &key).await {
        return Ok(html(body));
    }

    let page = PostService::new(store.get_ref(), paginator(&settings))
        .page(PostScope::All, requested)
        .await?;

    let mut context = base_context(&settings, viewer.user());
    context.insert("page", &page);
    let body = templates.render("posts/index.html", &context)?;

    store_page(cache.get_ref(), &key, &body).await;
    Ok(html(body))
}

pub async fn group_posts(
    store: web::Data<dyn BlogStore>,
    templates: web::Data<Templates>,
    settings: web::Data<SiteSettings>,
    viewer: Viewer,
    slug: web::Path<String>,
    query: PageQuery,
) -> Result<HttpResponse> {
    let service = PostService::new(store.get_ref(), paginator(&settings));
    let group = service.group(&slug).await?;
    let page = service
        .page(PostScope::Group(group.id), query.page.as_deref())
        .await?;

    let mut context = base_context(&settings, viewer.user());
    context.insert("group", &group);
    context.insert("page", &page);
    context.insert(
        "base_path",
        &format!("/group/{}/", urlencoding::encode(&group.slug)),
    );
    Ok(html(templates.render("posts/group_list.html", &context)?))
}

pub async fn profile(
    store: web::Data<dyn BlogStore>,
    templates: web::Data<Templates>,
    settings: web::Data<SiteSettings>,
    viewer: Viewer,
    username: web::Path<String>,
    query: PageQuery,
) -> Result<HttpResponse> {
    let posts = PostService::new(store.get_ref(), paginator(&settings));
    let follows = FollowService::new(store.get_ref());

    let author = posts.author(&username).await?;
    let page = posts
        .page(PostScope::Author(author.id), query.page.as_deref())
        .await?;
    let following = follows.is_following(viewer.id(), author.id).await?;
    let stats = follows.stats(author.id).await?;

    let mut context = base_context(&settings, viewer.user());
    context.insert("author", &author);
    context.insert("page", &page);
    context.insert("posts_count", &page.count);
    context.insert("following", &following);
    context.insert("followers_count", &stats.followers);
    context.insert("following_count", &stats.following);
    context.insert("is_self", &(viewer.id() == Some(author.id)));
    context.insert("base_path", &profile_url(&author.username));
    Ok(html(templates.render("posts/profile.html", &context)?))
}

pub async fn post_detail(
    store: web::Data<dyn BlogStore>,
    templates: web::Data<Templates>,
    settings: web::Data<SiteSettings>,
    viewer: Viewer,
    csrf: CsrfToken,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let posts = PostService::new(store.get_ref(), paginator(&settings));
    let post = posts.post(*post_id).await?;
    let comments = CommentService::new(store.get_ref())
        .for_post(post.id)
        .await?;
    let author_posts_count = posts.count_by_author(post.author_id).await?;

    let mut context = base_context(&settings, viewer.user());
    context.insert("post_title", post.title());
    context.insert("comments", &comments);
    context.insert("author_posts_count", &author_posts_count);
    context.insert(
        "can_edit",
        &viewer.id().map(|id| post.is_authored_by(id)).unwrap_or(false),
    );
    context.insert("form", &CommentForm::default());
    context.insert("csrf_token", csrf.value());
    context.insert("post", &post);

    let body = templates.render("posts/post_detail.html", &context)?;
    Ok(html_with_csrf(body, &csrf))
}

pub async fn post_create_form(
    store: web::Data<dyn BlogStore>,
    templates: web::Data<Templates>,
    settings: web::Data<SiteSettings>,
    user: LoginRequired,
    csrf: CsrfToken,
) -> Result<HttpResponse> {
    let groups = store.list_groups().await?;
    let page = PostFormPage {
        form: &PostForm::default(),
        errors: &FormErrors::new(),
        groups: &groups,
        action: "/create/".to_string(),
        is_edit: false,
        current_image: None,
    };
    render_post_form(&templates, &settings, &user.0, &csrf, page)
}

/// Persist a new post and send its author to their profile; an invalid
/// submission re-renders the form with errors.
pub async fn post_create(
    store: web::Data<dyn BlogStore>,
    templates: web::Data<Templates>,
    settings: web::Data<SiteSettings>,
    media: web::Data<MediaStorage>,
    user: LoginRequired,
    csrf: CsrfToken,
    payload: CsrfForm,
) -> Result<HttpResponse> {
    let LoginRequired(user) = user;
    let service = PostService::new(store.get_ref(), paginator(&settings));
    let groups = service.groups().await?;
    let form = PostForm::bind(payload.into_inner());

    match form.validate(&groups) {
        Ok(draft) => {
            service.create(&user, draft, &media).await?;
            Ok(redirect(&profile_url(&user.username)))
        }
        Err(errors) => {
            debug!(user = %user.username, ?errors, "Rejected post submission");
            let page = PostFormPage {
                form: &form,
                errors: &errors,
                groups: &groups,
                action: "/create/".to_string(),
                is_edit: false,
                current_image: None,
            };
            render_post_form(&templates, &settings, &user, &csrf, page)
        }
    }
}

pub async fn post_edit_form(
    store: web::Data<dyn BlogStore>,
    templates: web::Data<Templates>,
    settings: web::Data<SiteSettings>,
    user: LoginRequired,
    csrf: CsrfToken,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let LoginRequired(user) = user;
    let service = PostService::new(store.get_ref(), paginator(&settings));
    let post = service.post(*post_id).await?;
    if let Err(denied) = check_post_ownership(user.id, &post) {
        info!(%denied, "Edit refused");
        return Ok(redirect(&post_url(post.id)));
    }

    let groups = service.groups().await?;
    let page = PostFormPage {
        form: &PostForm::for_post(&post),
        errors: &FormErrors::new(),
        groups: &groups,
        action: edit_url(post.id),
        is_edit: true,
        current_image: post.image.as_deref(),
    };
    render_post_form(&templates, &settings, &user, &csrf, page)
}

/// Update a post in place. Only its author may do so; anyone else is sent
/// back to the post unchanged.
#[allow(clippy::too_many_arguments)]
pub async fn post_edit(
    store: web::Data<dyn BlogStore>,
    templates: web::Data<Templates>,
    settings: web::Data<SiteSettings>,
    media: web::Data<MediaStorage>,
    user: LoginRequired,
    csrf: CsrfToken,
    post_id: web::Path<i64>,
    payload: CsrfForm,
) -> Result<HttpResponse> {
    let LoginRequired(user) = user;
    let service = PostService::new(store.get_ref(), paginator(&settings));
    let post = service.post(*post_id).await?;
    if let Err(denied) = check_post_ownership(user.id, &post) {
        info!(%denied, "Edit refused");
        return Ok(redirect(&post_url(post.id)));
    }

    let groups = service.groups().await?;
    let form = PostForm::bind(payload.into_inner());
    match form.validate(&groups) {
        Ok(draft) => {
            service.update(&post, draft, &media).await?;
            Ok(redirect(&post_url(post.id)))
        }
        Err(errors) => {
            debug!(post_id = post.id, ?errors, "Rejected post edit");
            let page = PostFormPage {
                form: &form,
                errors: &errors,
                groups: &groups,
                action: edit_url(post.id),
                is_edit: true,
                current_image: post.image.as_deref(),
            };
            render_post_form(&templates, &settings, &user, &csrf, page)
        }
    }
}

fn edit_url(post_id: i64) -> String {
    format!("/posts/{}/edit/", post_id)
}

/// Everything the create/edit template shows besides the base context.
struct PostFormPage<'a> {
    form: &'a PostForm,
    errors: &'a FormErrors,
    groups: &'a [Group],
    action: String,
    is_edit: bool,
    /// Set when editing a post that has an image
    current_image: Option<&'a str>,
}

fn render_post_form(
    templates: &Templates,
    settings: &SiteSettings,
    user: &User,
    csrf: &CsrfToken,
    page: PostFormPage<'_>,
) -> Result<HttpResponse> {
    let mut context = base_context(settings, Some(user));
    context.insert("form", page.form);
    context.insert("errors", &page.errors.by_field(POST_FORM_FIELDS));
    context.insert("groups", page.groups);
    context.insert("selected_group", &page.form.selected_group());
    context.insert("is_edit", &page.is_edit);
    context.insert("form_action", &page.action);
    context.insert("current_image", &page.current_image);
    context.insert("csrf_token", csrf.value());

    let body = templates.render("posts/create_post.html", &context)?;
    Ok(html_with_csrf(body, csrf))
}
