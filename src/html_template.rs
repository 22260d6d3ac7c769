use axum::response::Html;

use crate::database::{MediaFile, Travel};
use crate::geocoding::location_label;

// Shared page shell; placeholders are replaced per page
const LAYOUT_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title><!-- PAGE_TITLE --> - Travel Diary</title>
    <link rel="stylesheet" href="/assets/style.css">
<!-- PAGE_HEAD -->
</head>
<body>
    <header class="site-header">
        <a class="brand" href="/">Travel Diary</a>
        <nav><a href="/">Journal</a> <a class="button" href="/add">New entry</a></nav>
    </header>
    <main>
<!-- PAGE_BODY -->
    </main>
<!-- PAGE_SCRIPTS -->
</body>
</html>
"#;

const ADD_FORM_HTML: &str = r#"<h1>New travel entry</h1>
<form id="travel-form" class="travel-form" action="/api/upload" method="post" enctype="multipart/form-data">
    <label>Photos and videos
        <input id="media" type="file" name="media" accept="image/*,video/*" multiple required>
    </label>
    <p class="hint">Up to <!-- MAX_FILES --> files. Location is read from photo metadata when available.</p>
    <div id="preview" class="preview"></div>
    <div class="row">
        <label>Latitude <input id="latitude" type="text" name="latitude" inputmode="decimal"></label>
        <label>Longitude <input id="longitude" type="text" name="longitude" inputmode="decimal"></label>
    </div>
    <div id="map" class="map-picker"></div>
    <p class="hint">Click the map to set or correct the location.</p>
    <p id="location-name" class="hint"></p>
    <label>Title
        <input id="title" type="text" name="title" placeholder="Untitled">
    </label>
    <button id="suggest-title" type="button">Suggest a title</button>
    <ul id="title-suggestions" class="suggestions"></ul>
    <label>Description <textarea name="description" rows="5"></textarea></label>
    <label>Tags <input type="text" name="tags" placeholder="food, beach, night view"></label>
    <button type="submit" class="button">Save entry</button>
    <p id="status" class="status"></p>
</form>"#;

const ADD_HEAD_HTML: &str = r#"    <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />"#;

const ADD_SCRIPTS_HTML: &str = r#"    <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
    <script src="https://cdn.jsdelivr.net/npm/exif-js@2.3.0/exif.min.js"></script>
    <script src="/assets/add.js"></script>"#;

fn render_page(title: &str, head: &str, body: &str, scripts: &str) -> Html<String> {
    let html = LAYOUT_HTML
        .replace("<!-- PAGE_TITLE -->", &escape_html(title))
        .replace("<!-- PAGE_HEAD -->", head)
        .replace("<!-- PAGE_BODY -->", body)
        .replace("<!-- PAGE_SCRIPTS -->", scripts);
    Html(html)
}

/// Escapes text for use inside HTML element content and quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn media_element(media: &MediaFile) -> String {
    let src = escape_html(&media.path);
    let alt = escape_html(&media.original_name);
    if media.mime_type.starts_with("video/") {
        format!(r#"<video src="{src}" controls preload="metadata"></video>"#)
    } else {
        format!(r#"<img src="{src}" alt="{alt}" loading="lazy">"#)
    }
}

fn tag_list(tags: &[String]) -> String {
    if tags.is_empty() {
        return String::new();
    }
    let items: String = tags
        .iter()
        .map(|t| format!("<li>#{}</li>", escape_html(t)))
        .collect();
    format!(r#"<ul class="tags">{items}</ul>"#)
}

/// Journal index, newest entry first.
pub fn index_page(travels: &[Travel]) -> Html<String> {
    let mut sorted: Vec<&Travel> = travels.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let body = if sorted.is_empty() {
        r#"<p class="empty">No entries yet. <a href="/add">Add your first trip</a>.</p>"#.to_string()
    } else {
        let cards: String = sorted
            .iter()
            .map(|travel| {
                let cover = travel.media.first().map(media_element).unwrap_or_default();
                format!(
                    r#"<article class="card">
    <a href="/travel/{id}">{cover}</a>
    <h2><a href="/travel/{id}">{title}</a></h2>
    <p class="meta">{location} &middot; {date} &middot; {count} file(s)</p>
    {tags}
</article>"#,
                    id = escape_html(&travel.id),
                    cover = cover,
                    title = escape_html(&travel.title),
                    location = escape_html(&location_label(travel.latitude, travel.longitude)),
                    date = escape_html(&travel.upload_date),
                    count = travel.media.len(),
                    tags = tag_list(&travel.tags),
                )
            })
            .collect();
        format!(r#"<section class="grid">{cards}</section>"#)
    };

    render_page("Journal", "", &format!("<h1>Journal</h1>\n{body}"), "")
}

pub fn add_page(max_files: usize) -> Html<String> {
    let body = ADD_FORM_HTML.replace("<!-- MAX_FILES -->", &max_files.to_string());
    render_page("New entry", ADD_HEAD_HTML, &body, ADD_SCRIPTS_HTML)
}

pub fn detail_page(travel: &Travel) -> Html<String> {
    let gallery: String = travel
        .media
        .iter()
        .map(|media| {
            let coords = match (media.latitude, media.longitude) {
                (Some(lat), Some(lon)) => format!(r#"<figcaption>{lat:.4}, {lon:.4}</figcaption>"#),
                _ => String::new(),
            };
            format!("<figure>{}{}</figure>", media_element(media), coords)
        })
        .collect();

    let description = if travel.description.trim().is_empty() {
        String::new()
    } else {
        format!(r#"<p class="description">{}</p>"#, escape_html(&travel.description))
    };

    let body = format!(
        r#"<article class="detail" data-id="{id}">
    <h1>{title}</h1>
    <p class="meta">{location} &middot; {date}</p>
    {tags}
    {description}
    <section class="gallery">{gallery}</section>
    <button class="danger" type="button" onclick="deleteTravel('{id}')">Delete entry</button>
</article>"#,
        id = escape_html(&travel.id),
        title = escape_html(&travel.title),
        location = escape_html(&location_label(travel.latitude, travel.longitude)),
        date = escape_html(&travel.upload_date),
        tags = tag_list(&travel.tags),
        description = description,
        gallery = gallery,
    );

    let scripts = r#"    <script>
    async function deleteTravel(id) {
        if (!confirm('Delete this entry and its files?')) return;
        const res = await fetch('/api/travel/' + encodeURIComponent(id), { method: 'DELETE' });
        if (res.ok) window.location.href = '/';
        else alert('Delete failed');
    }
    </script>"#;

    render_page(&travel.title, "", &body, scripts)
}

pub fn not_found_page() -> Html<String> {
    render_page(
        "Not found",
        "",
        r#"<h1>Entry not found</h1><p><a href="/">Back to the journal</a></p>"#,
        "",
    )
}
