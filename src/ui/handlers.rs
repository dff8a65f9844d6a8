//! Web UI handlers
//!
//! Presentation only. Every page here consumes the auth core through the
//! guard's decision and the session it forwards; nothing below this layer
//! makes its own auth calls.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Html,
};
use serde::Deserialize;

use crate::api::server::AppState;
use crate::auth::guard::{CurrentUser, LOGIN_PAGE_HEADER};
use crate::auth::provider::IdentityProvider;

/// Minimal HTML escape for user-controlled values interpolated into pages
fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn page_shell(site_title: &str, title: &str, nav: bool, body: &str) -> Html<String> {
    let nav_html = if nav {
        r#"
        <nav class="mb-10 flex space-x-6 text-sm">
            <a href="/" class="text-blue-400 hover:underline">Home</a>
            <a href="/blog" class="text-blue-400 hover:underline">Blog</a>
            <a href="/contact" class="text-blue-400 hover:underline">Contact</a>
        </nav>
        "#
    } else {
        ""
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en" class="dark">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - {}</title>
    <script src="https://cdn.tailwindcss.com"></script>
</head>
<body class="bg-gray-900 text-gray-100 min-h-screen">
    <div class="container mx-auto px-4 py-10 max-w-3xl">
        {}
        {}
    </div>
</body>
</html>
"#,
        escape(title),
        escape(site_title),
        nav_html,
        body
    ))
}

/// Landing page
pub async fn home<P: IdentityProvider>(State(state): State<AppState<P>>) -> Html<String> {
    let body = format!(
        r#"
        <header class="mb-8">
            <h1 class="text-4xl font-bold mb-2">{}</h1>
            <p class="text-gray-400">Notes on software, side projects, and whatever else.</p>
        </header>
        <p class="text-gray-300">Start with the <a href="/blog" class="text-blue-400 hover:underline">blog</a>,
        or <a href="/contact" class="text-blue-400 hover:underline">get in touch</a>.</p>
        "#,
        escape(&state.site.title)
    );
    page_shell(&state.site.title, "Home", true, &body)
}

/// Blog index. Posts live in the hosted backend; this shell renders
/// whatever the content layer provides.
pub async fn blog_index<P: IdentityProvider>(State(state): State<AppState<P>>) -> Html<String> {
    let body = r#"
        <h1 class="text-3xl font-bold mb-6">Blog</h1>
        <div class="bg-gray-800 rounded-lg p-6 text-gray-400">
            No posts published yet.
        </div>
    "#;
    page_shell(&state.site.title, "Blog", true, body)
}

/// Single post page
pub async fn blog_post<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    Path(slug): Path<String>,
) -> Html<String> {
    let body = format!(
        r#"
        <a href="/blog" class="text-blue-400 hover:underline mb-4 inline-block">&larr; All posts</a>
        <h1 class="text-3xl font-bold mb-6">{}</h1>
        <div class="bg-gray-800 rounded-lg p-6 text-gray-400">
            This post is not available.
        </div>
        "#,
        escape(&slug)
    );
    page_shell(&state.site.title, &slug, true, &body)
}

/// Contact form
pub async fn contact_page<P: IdentityProvider>(State(state): State<AppState<P>>) -> Html<String> {
    let body = r#"
        <h1 class="text-3xl font-bold mb-6">Contact</h1>
        <form id="contact-form" class="bg-gray-800 rounded-lg p-6 space-y-4">
            <input type="text" name="name" placeholder="Your name"
                class="w-full px-4 py-2 bg-gray-700 border border-gray-600 rounded text-white" />
            <input type="email" name="email" placeholder="Your email" required
                class="w-full px-4 py-2 bg-gray-700 border border-gray-600 rounded text-white" />
            <textarea name="message" placeholder="Message" rows="5" required
                class="w-full px-4 py-2 bg-gray-700 border border-gray-600 rounded text-white"></textarea>
            <button type="submit" class="px-4 py-2 bg-blue-600 hover:bg-blue-700 rounded font-medium">Send</button>
            <p id="contact-status" class="text-sm text-gray-400"></p>
        </form>
        <script>
            document.getElementById('contact-form').addEventListener('submit', async (e) => {
                e.preventDefault();
                const form = e.target;
                const status = document.getElementById('contact-status');
                const payload = {
                    name: form.name.value,
                    email: form.email.value,
                    message: form.message.value,
                };
                const response = await fetch('/api/contact', {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify(payload),
                });
                const data = await response.json();
                status.textContent = data.success ? 'Thanks, message sent.' : (data.error || 'Something went wrong.');
                if (data.success) form.reset();
            });
        </script>
    "#;
    page_shell(&state.site.title, "Contact", true, body)
}

#[derive(Debug, Deserialize)]
pub struct LoginPageParams {
    pub error: Option<String>,
    pub sent: Option<String>,
    pub redirect: Option<String>,
}

/// Message shown for a redirect reason. Short and generic; provider error
/// text never reaches this page.
fn error_message(reason: &str) -> &'static str {
    match reason {
        "login_required" => "Please sign in to continue.",
        "admin_required" | "not_admin" => "This account does not have admin access.",
        "invalid_credentials" => "Invalid email or password.",
        "invalid_code" => "That login link is expired or invalid. Request a new one.",
        _ => "Sign-in failed. Please try again.",
    }
}

/// Login form
pub async fn login_page<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    headers: HeaderMap,
    Query(params): Query<LoginPageParams>,
) -> Html<String> {
    // Guard marker selects the bare layout; never a security signal
    let bare = headers.contains_key(LOGIN_PAGE_HEADER);

    let notice = if params.sent.is_some() {
        r#"<p class="mb-4 p-3 bg-green-900 text-green-200 rounded text-sm">Check your email for a login link.</p>"#
            .to_string()
    } else if let Some(reason) = &params.error {
        format!(
            r#"<p class="mb-4 p-3 bg-red-900 text-red-200 rounded text-sm">{}</p>"#,
            error_message(reason)
        )
    } else {
        String::new()
    };

    let redirect_field = params
        .redirect
        .as_deref()
        .filter(|r| r.starts_with('/'))
        .map(|r| {
            format!(
                r#"<input type="hidden" name="redirect" value="{}" />"#,
                escape(r)
            )
        })
        .unwrap_or_default();

    let body = format!(
        r#"
        <div class="max-w-sm mx-auto mt-16">
            <h1 class="text-2xl font-bold mb-6">Sign in</h1>
            {}
            <form method="post" action="/admin/login" class="bg-gray-800 rounded-lg p-6 space-y-4">
                {}
                <input type="email" name="email" placeholder="Email" required
                    class="w-full px-4 py-2 bg-gray-700 border border-gray-600 rounded text-white" />
                <input type="password" name="password" placeholder="Password" required
                    class="w-full px-4 py-2 bg-gray-700 border border-gray-600 rounded text-white" />
                <button type="submit" class="w-full px-4 py-2 bg-blue-600 hover:bg-blue-700 rounded font-medium">Sign in</button>
            </form>
            <form method="post" action="/admin/login/magic" class="mt-4 bg-gray-800 rounded-lg p-6 space-y-4">
                <input type="email" name="email" placeholder="Email for magic link" required
                    class="w-full px-4 py-2 bg-gray-700 border border-gray-600 rounded text-white" />
                <button type="submit" class="w-full px-4 py-2 bg-gray-700 hover:bg-gray-600 rounded font-medium">Email me a login link</button>
            </form>
        </div>
        "#,
        notice, redirect_field
    );

    page_shell(&state.site.title, "Sign in", !bare, &body)
}

/// Admin landing page
pub async fn dashboard<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    CurrentUser(session): CurrentUser,
) -> Html<String> {
    let who = session
        .user
        .display_name
        .as_deref()
        .unwrap_or(&session.user.email);

    let body = format!(
        r#"
        <header class="mb-8 flex justify-between items-center">
            <div>
                <h1 class="text-3xl font-bold mb-1">Dashboard</h1>
                <p class="text-gray-400">Signed in as {}</p>
            </div>
            <form method="post" action="/auth/logout">
                <button type="submit" class="px-3 py-2 text-sm bg-gray-700 hover:bg-gray-600 rounded">Sign out</button>
            </form>
        </header>
        <div class="grid grid-cols-1 md:grid-cols-2 gap-6">
            <a href="/admin/posts" class="bg-gray-800 rounded-lg p-6 hover:bg-gray-700">
                <h2 class="text-xl font-semibold mb-2">Posts</h2>
                <p class="text-gray-400 text-sm">Write, edit, and publish blog posts.</p>
            </a>
            <a href="/admin/messages" class="bg-gray-800 rounded-lg p-6 hover:bg-gray-700">
                <h2 class="text-xl font-semibold mb-2">Messages</h2>
                <p class="text-gray-400 text-sm">Read contact form submissions.</p>
            </a>
        </div>
        "#,
        escape(who)
    );
    page_shell(&state.site.title, "Dashboard", false, &body)
}

/// Post management shell
pub async fn admin_posts<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    CurrentUser(_session): CurrentUser,
) -> Html<String> {
    let body = r#"
        <a href="/admin" class="text-blue-400 hover:underline mb-4 inline-block">&larr; Dashboard</a>
        <h1 class="text-3xl font-bold mb-6">Posts</h1>
        <div class="bg-gray-800 rounded-lg p-6 text-gray-400">
            No posts yet.
        </div>
    "#;
    page_shell(&state.site.title, "Posts", false, body)
}

/// Contact message shell
pub async fn admin_messages<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    CurrentUser(_session): CurrentUser,
) -> Html<String> {
    let body = r#"
        <a href="/admin" class="text-blue-400 hover:underline mb-4 inline-block">&larr; Dashboard</a>
        <h1 class="text-3xl font-bold mb-6">Messages</h1>
        <div class="bg-gray-800 rounded-lg p-6 text-gray-400">
            No messages yet.
        </div>
    "#;
    page_shell(&state.site.title, "Messages", false, body)
}
