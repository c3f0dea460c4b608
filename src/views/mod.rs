//! # Views
//!
//! Server-rendered HTML pages. Every value that came from a user or a
//! provider goes through [`escape`] before it is interpolated.

use axum::{http::StatusCode, response::Html};
use std::fmt::Write;

use crate::auth::models::{AuthContext, SignUpForm, User};
use crate::posts::models::{Category, NewPostForm, PostDetail, PostSummary};

/// Header data every page needs
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub auth: &'a AuthContext,
    pub providers: &'a [String],
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = r#"
    body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 860px; margin: 0 auto; padding: 20px; background: #f5f5f5; }
    header { display: flex; justify-content: space-between; align-items: center; margin-bottom: 20px; }
    .card { background: white; padding: 16px 20px; border-radius: 8px; margin-bottom: 12px; box-shadow: 0 1px 4px rgba(0,0,0,0.08); }
    .error { background: #fee; border: 1px solid #fcc; padding: 10px; border-radius: 6px; color: #c00; }
    .meta { color: #777; font-size: 0.9em; }
    .badge { background: #4CAF50; color: white; padding: 2px 6px; border-radius: 4px; font-size: 0.8em; }
    form.inline { display: inline; }
"#;

fn header(ctx: &PageContext<'_>) -> String {
    let mut nav = String::from(r#"<a href="/">Forum</a>"#);
    match &ctx.auth.user {
        Some(user) => {
            let _ = write!(
                nav,
                r#"<span>Signed in as <a href="/profile">{}</a>{} · <a href="/posts/new">New post</a> · <a href="/signout">Sign out</a></span>"#,
                escape(&user.name),
                if user.is_admin {
                    r#" <a class="badge" href="/admin/users">admin</a>"#
                } else {
                    ""
                }
            );
        }
        None => {
            let providers: Vec<String> = ctx
                .providers
                .iter()
                .map(|p| format!(r#"<a href="/oauth2_signin/{0}">{0}</a>"#, escape(p)))
                .collect();
            let _ = write!(
                nav,
                r#"<span><a href="/signin">Sign in</a> · <a href="/signup">Sign up</a>{}{}</span>"#,
                if providers.is_empty() { "" } else { " · Sign in with " },
                providers.join(" ")
            );
        }
    }
    format!("<header>{}</header>", nav)
}

fn document(title: &str, header: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{}</title>
    <style>{}</style>
</head>
<body>
{}
<main>
{}
</main>
</body>
</html>"#,
        escape(title),
        STYLE,
        header,
        body
    ))
}

fn layout(ctx: &PageContext<'_>, title: &str, body: &str) -> Html<String> {
    document(title, &header(ctx), body)
}

fn error_box(error: Option<&str>) -> String {
    error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape(e)))
        .unwrap_or_default()
}

/// Fixed page per status; carries no request-specific detail.
pub fn error_page(status: StatusCode) -> Html<String> {
    let message = match status {
        StatusCode::BAD_REQUEST => "The request could not be understood.",
        StatusCode::UNAUTHORIZED => "You need to sign in to see this page.",
        StatusCode::FORBIDDEN => "You are not allowed to do that.",
        StatusCode::NOT_FOUND => "The page you are looking for does not exist.",
        StatusCode::METHOD_NOT_ALLOWED => "That method is not allowed here.",
        StatusCode::CONFLICT => "That conflicts with existing data.",
        StatusCode::REQUEST_TIMEOUT => "The request took too long.",
        _ => "Something went wrong on our side. Please try again later.",
    };
    let title = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );
    document(
        &title,
        r#"<header><a href="/">Forum</a></header>"#,
        &format!(
            r#"<div class="card error"><h1>{}</h1><p>{}</p><p><a href="/">Back to the forum</a></p></div>"#,
            escape(&title),
            message
        ),
    )
}

// ============================================================================
// Forum pages
// ============================================================================

pub fn index_page(
    ctx: &PageContext<'_>,
    posts: &[PostSummary],
    categories: &[Category],
    selected: Option<i64>,
) -> Html<String> {
    let mut body = String::from(r#"<div class="card">Categories: <a href="/">All</a>"#);
    for category in categories {
        let marker = if selected == Some(category.id) { " ✓" } else { "" };
        let _ = write!(
            body,
            r#" · <a href="/?category={}">{}{}</a>"#,
            category.id,
            escape(&category.name),
            marker
        );
    }
    body.push_str("</div>");

    if posts.is_empty() {
        body.push_str(r#"<div class="card">No posts yet.</div>"#);
    }
    for post in posts {
        let _ = write!(
            body,
            r#"<div class="card"><h3><a href="/posts/{}">{}</a></h3><p class="meta">by {} · {} · 👍 {} 👎 {} · {} comments</p></div>"#,
            post.id,
            escape(&post.title),
            escape(&post.author),
            escape(&post.created_at),
            post.likes,
            post.dislikes,
            post.comment_count
        );
    }
    layout(ctx, "Forum", &body)
}

fn reaction_buttons(action: &str, likes: i64, dislikes: i64, enabled: bool) -> String {
    if !enabled {
        return format!(r#"<span class="meta">👍 {} 👎 {}</span>"#, likes, dislikes);
    }
    format!(
        r#"<form class="inline" method="post" action="{0}"><input type="hidden" name="kind" value="like"><button>👍 {1}</button></form>
<form class="inline" method="post" action="{0}"><input type="hidden" name="kind" value="dislike"><button>👎 {2}</button></form>"#,
        action, likes, dislikes
    )
}

pub fn post_page(ctx: &PageContext<'_>, detail: &PostDetail) -> Html<String> {
    let post = &detail.post;
    let signed_in = ctx.auth.is_authenticated();
    let categories: Vec<String> = detail
        .categories
        .iter()
        .map(|c| format!(r#"<a href="/?category={}">{}</a>"#, c.id, escape(&c.name)))
        .collect();

    let mut body = format!(
        r#"<div class="card"><h2>{}</h2><p class="meta">by {} · {} · {}</p><p>{}</p>{}"#,
        escape(&post.title),
        escape(&post.author),
        escape(&post.created_at),
        categories.join(", "),
        escape(&post.content).replace('\n', "<br>"),
        reaction_buttons(
            &format!("/posts/{}/react", post.id),
            post.likes,
            post.dislikes,
            signed_in
        )
    );
    let may_delete = ctx.auth.is_admin() || ctx.auth.user_id() == Some(post.user_id);
    if may_delete {
        let _ = write!(
            body,
            r#" <form class="inline" method="post" action="/posts/{}/delete"><button>Delete</button></form>"#,
            post.id
        );
    }
    body.push_str("</div>");

    let _ = write!(body, "<h3>Comments ({})</h3>", detail.comments.len());
    for comment in &detail.comments {
        let _ = write!(
            body,
            r#"<div class="card"><p class="meta">{} · {}</p><p>{}</p>{}</div>"#,
            escape(&comment.author),
            escape(&comment.created_at),
            escape(&comment.content).replace('\n', "<br>"),
            reaction_buttons(
                &format!("/comments/{}/react", comment.id),
                comment.likes,
                comment.dislikes,
                signed_in
            )
        );
    }

    if signed_in {
        let _ = write!(
            body,
            r#"<div class="card"><form method="post" action="/posts/{}/comments"><textarea name="content" rows="3" cols="60"></textarea><br><button>Comment</button></form></div>"#,
            post.id
        );
    } else {
        body.push_str(r#"<div class="card"><a href="/signin">Sign in</a> to comment.</div>"#);
    }

    layout(ctx, &post.title, &body)
}

pub fn new_post_page(
    ctx: &PageContext<'_>,
    categories: &[Category],
    form: &NewPostForm,
    error: Option<&str>,
) -> Html<String> {
    let mut boxes = String::new();
    for category in categories {
        let checked = if form.categories.contains(&category.id) {
            " checked"
        } else {
            ""
        };
        let _ = write!(
            boxes,
            r#"<label><input type="checkbox" name="categories" value="{}"{}> {}</label> "#,
            category.id,
            checked,
            escape(&category.name)
        );
    }

    let body = format!(
        r#"<div class="card"><h2>New post</h2>{}
<form method="post" action="/posts">
<p><input name="title" size="60" placeholder="Title" value="{}"></p>
<p><textarea name="content" rows="10" cols="60">{}</textarea></p>
<p>{}</p>
<button>Publish</button>
</form></div>"#,
        error_box(error),
        escape(&form.title),
        escape(&form.content),
        boxes
    );
    layout(ctx, "New post", &body)
}

// ============================================================================
// Account pages
// ============================================================================

pub fn signup_page(ctx: &PageContext<'_>, form: &SignUpForm, error: Option<&str>) -> Html<String> {
    let body = format!(
        r#"<div class="card"><h2>Sign up</h2>{}
<form method="post" action="/signup">
<p><input name="user" placeholder="Name" value="{}"></p>
<p><input name="email" type="email" placeholder="Email" value="{}"></p>
<p><input name="password" type="password" placeholder="Password"></p>
<p><input name="confirm_password" type="password" placeholder="Confirm password"></p>
<p><input name="date_of_birth" type="date" value="{}"></p>
<button>Create account</button>
</form></div>"#,
        error_box(error),
        escape(&form.user),
        escape(&form.email),
        escape(&form.date_of_birth)
    );
    layout(ctx, "Sign up", &body)
}

pub fn signin_page(ctx: &PageContext<'_>, user: &str, error: Option<&str>) -> Html<String> {
    let body = format!(
        r#"<div class="card"><h2>Sign in</h2>{}
<form method="post" action="/signin">
<p><input name="user" placeholder="Name or email" value="{}"></p>
<p><input name="password" type="password" placeholder="Password"></p>
<button>Sign in</button>
</form></div>"#,
        error_box(error),
        escape(user)
    );
    layout(ctx, "Sign in", &body)
}

pub fn profile_page(ctx: &PageContext<'_>, user: &User) -> Html<String> {
    let optional = |v: &Option<String>| escape(v.as_deref().unwrap_or("-"));
    let body = format!(
        r#"<div class="card"><h2>{}</h2>
<p>Email: {}</p>
<p>Registered: {}</p>
<p>Date of birth: {}</p>
<p>City: {}</p>
<p>Sign-in method: {}</p>
</div>"#,
        escape(&user.name),
        escape(&user.email),
        escape(&user.registered_at),
        optional(&user.birth_date),
        optional(&user.city),
        if user.password_hash.is_empty() {
            "external provider"
        } else {
            "password"
        }
    );
    layout(ctx, "Profile", &body)
}

pub fn admin_users_page(ctx: &PageContext<'_>, users: &[User]) -> Html<String> {
    let mut rows = String::new();
    for user in users {
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            user.id,
            escape(&user.name),
            escape(&user.email),
            escape(&user.registered_at),
            if user.session_token.is_some() { "yes" } else { "no" }
        );
    }
    let body = format!(
        r#"<div class="card"><h2>Users ({})</h2>
<table><tr><th>ID</th><th>Name</th><th>Email</th><th>Registered</th><th>Session</th></tr>
{}
</table></div>"#,
        users.len(),
        rows
    );
    layout(ctx, "Users", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::SessionUser;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x")</script> & 'y'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#39;y&#39;"
        );
    }

    #[test]
    fn test_error_page_is_generic() {
        let Html(html) = error_page(StatusCode::INTERNAL_SERVER_ERROR);
        assert!(html.contains("500 Internal Server Error"));
        assert!(html.contains("Something went wrong"));
    }

    #[test]
    fn test_header_reflects_sign_in_state() {
        let providers = vec!["github".to_string(), "google".to_string()];
        let guest = AuthContext::guest();
        let Html(html) = index_page(
            &PageContext {
                auth: &guest,
                providers: &providers,
            },
            &[],
            &[],
            None,
        );
        assert!(html.contains(r#"href="/oauth2_signin/github""#));
        assert!(html.contains(r#"href="/signin""#));

        let admin = AuthContext::signed_in(SessionUser {
            id: 1,
            name: "<root>".to_string(),
            is_admin: true,
        });
        let Html(html) = index_page(
            &PageContext {
                auth: &admin,
                providers: &providers,
            },
            &[],
            &[],
            None,
        );
        assert!(html.contains("&lt;root&gt;"));
        assert!(html.contains(r#"href="/admin/users""#));
        assert!(!html.contains("oauth2_signin"));
    }
}
