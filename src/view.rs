//! Server-rendered pages
//!
//! `GET /` shows the create form, `GET /{slug}` shows a clip. Both are plain
//! HTML strings; the form submits to the JSON API with a small inline script
//! and renders API errors inline.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
};
use chrono::Utc;

use crate::database::AppState;
use crate::handler::read_clip;
use crate::model::{Clip, FileMeta};
use crate::validation::{Ttl, SLUG_MAX_LEN, SLUG_MIN_LEN};

const STYLE: &str = "body{font-family:system-ui,sans-serif;background:#f9fafb;margin:0}\
main{max-width:48rem;margin:0 auto;padding:2rem 1rem}\
h1 a{color:#2563eb;text-decoration:none}\
label{display:block;font-weight:600;margin:1rem 0 .25rem}\
input[type=text],textarea,select{width:100%;padding:.5rem;box-sizing:border-box}\
pre{background:#f3f4f6;border:1px solid #e5e7eb;padding:1rem;white-space:pre-wrap}\
.error{background:#fef2f2;border:1px solid #fecaca;color:#b91c1c;padding:.75rem}\
.notice{background:#eff6ff;border:1px solid #bfdbfe;color:#1d4ed8;padding:.5rem}\
.muted{color:#6b7280;font-size:.875rem}";

const FORM_SCRIPT: &str = r#"
document.getElementById('clip-form').addEventListener('submit', async (event) => {
  event.preventDefault();
  const form = event.target;
  const error = document.getElementById('error');
  error.hidden = true;
  const data = new FormData(form);
  data.set('destroyOnRead', form.destroyOnRead.checked ? 'true' : 'false');
  try {
    const response = await fetch('/clips', { method: 'POST', body: data });
    const body = await response.json();
    if (!response.ok) {
      error.textContent = body.error || 'Failed to create clip';
      error.hidden = false;
      return;
    }
    window.location.href = '/' + body.slug;
  } catch (err) {
    error.textContent = 'An unexpected error occurred';
    error.hidden = false;
  }
});
"#;

/// Escapes text for use in HTML element content and attribute values
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Human-readable file size: bytes, KB, or MB with two decimals
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    }
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
<title>{title}</title><style>{STYLE}</style></head><body><main>\
<header><h1><a href=\"/\">cl1p</a></h1>\
<p class=\"muted\">Internet clipboard - share text and files instantly</p></header>\
{body}\
<footer class=\"muted\"><p>Share data across devices with a simple URL</p></footer>\
</main></body></html>",
        title = escape_html(title),
    )
}

/// `GET /` - the create form
pub async fn index() -> Html<String> {
    let ttl_options: String = Ttl::ALL
        .iter()
        .map(|ttl| format!("<option value=\"{}\">{}</option>", ttl.token(), ttl.label()))
        .collect();

    let body = format!(
        "<h2>Create a new clip</h2>\
<p>Create a unique URL to share text or files. Access it from any device by visiting the same URL.</p>\
<form id=\"clip-form\" enctype=\"multipart/form-data\">\
<label for=\"slug\">Slug (URL identifier)</label>\
<input type=\"text\" id=\"slug\" name=\"slug\" placeholder=\"my-clip\" pattern=\"[a-zA-Z0-9_-]+\" \
minlength=\"{SLUG_MIN_LEN}\" maxlength=\"{SLUG_MAX_LEN}\" required>\
<p class=\"muted\">Letters, numbers, hyphens, and underscores only ({SLUG_MIN_LEN}-{SLUG_MAX_LEN} characters)</p>\
<label for=\"content\">Content (optional if file is provided)</label>\
<textarea id=\"content\" name=\"content\" rows=\"10\" placeholder=\"Paste your text here...\"></textarea>\
<label for=\"file\">File (optional if content is provided)</label>\
<input type=\"file\" id=\"file\" name=\"file\">\
<label for=\"ttl\">Time to Live (optional)</label>\
<select id=\"ttl\" name=\"ttl\"><option value=\"\">No expiration</option>{ttl_options}</select>\
<label><input type=\"checkbox\" id=\"destroyOnRead\" name=\"destroyOnRead\" value=\"true\" checked> \
Destroy on read (default: enabled)</label>\
<div id=\"error\" class=\"error\" hidden></div>\
<p><button type=\"submit\">Create Clip</button></p>\
</form><script>{FORM_SCRIPT}</script>"
    );

    Html(layout("cl1p - Internet Clipboard", &body))
}

/// `GET /{slug}` - renders a clip
///
/// Uses the same read path as the JSON API, so viewing a destroy-on-read
/// clip consumes it and viewing an expired clip deletes it.
pub async fn view_clip(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> (StatusCode, Html<String>) {
    match read_clip(&state, &slug) {
        Ok(clip) => (StatusCode::OK, Html(render_clip(&clip))),
        Err(err) => {
            let body = format!(
                "<div class=\"error\"><p><strong>Error</strong></p><p>{}</p></div>\
<p><a href=\"/\">Create a new clip</a></p>",
                escape_html(&err.to_string())
            );
            (err.status(), Html(layout("cl1p - Error", &body)))
        }
    }
}

fn render_clip(clip: &Clip) -> String {
    let mut body = format!(
        "<h2>Clip: {}</h2><p class=\"muted\">Created: {}</p>",
        escape_html(&clip.slug),
        clip.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
    );

    if let Some(expires_at) = clip.expires_at {
        body.push_str(&format!(
            "<p class=\"muted\">Expires: {} (in {} minutes)</p>",
            expires_at.format("%Y-%m-%d %H:%M:%S UTC"),
            (expires_at - Utc::now()).num_minutes().max(0),
        ));
    }

    if clip.destroy_on_read {
        body.push_str(
            "<p class=\"notice\">This clip will be deleted after you view it. \
Refresh the page and it will be gone.</p>",
        );
    }

    if let Some(content) = &clip.content {
        body.push_str(&format!("<h3>Content:</h3><pre>{}</pre>", escape_html(content)));
    }

    if let Some(file) = &clip.file {
        body.push_str(&render_file(file));
    }

    if clip.content.is_none() && clip.file.is_none() {
        body.push_str("<p class=\"muted\">This clip has no content</p>");
    }

    body.push_str("<p><a href=\"/\">Create a new clip</a></p>");
    layout(&format!("cl1p - {}", clip.slug), &body)
}

fn render_file(file: &FileMeta) -> String {
    let url = escape_html(&file.url);
    let name = escape_html(&file.name);

    let (heading, preview) = if file.content_type.starts_with("image/") {
        ("Image:", format!("<img src=\"{url}\" alt=\"{name}\" style=\"max-width:100%;max-height:600px\">"))
    } else if file.content_type.starts_with("video/") {
        ("Video:", format!("<video src=\"{url}\" controls style=\"max-width:100%;max-height:600px\"></video>"))
    } else {
        ("File:", String::new())
    };

    format!(
        "<h3>{heading}</h3>{preview}\
<p><a href=\"{url}\" download=\"{name}\">{name}</a> \
<span class=\"muted\">{} - {}</span></p>",
        escape_html(&file.content_type),
        format_file_size(file.size),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<script>alert('x') & \"y\"</script>"),
            "&lt;script&gt;alert(&#39;x&#39;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(2048), "2.00 KB");
        assert_eq!(format_file_size(3 * 1024 * 1024 / 2), "1.50 MB");
    }

    #[test]
    fn test_render_clip_escapes_content_and_previews_images() {
        let clip = Clip {
            slug: "demo-1".to_string(),
            content: Some("<b>hi</b>".to_string()),
            file: Some(FileMeta {
                url: "http://localhost:8080/uploads/demo-1-1-cat.png".to_string(),
                name: "cat.png".to_string(),
                content_type: "image/png".to_string(),
                size: 2048,
            }),
            created_at: Utc::now(),
            expires_at: None,
            destroy_on_read: true,
            read_at: None,
        };

        let html = render_clip(&clip);
        assert!(html.contains("&lt;b&gt;hi&lt;/b&gt;"));
        assert!(html.contains("<img src=\"http://localhost:8080/uploads/demo-1-1-cat.png\""));
        assert!(html.contains("2.00 KB"));
        assert!(html.contains("will be deleted after you view it"));
    }
}
