//! Server-rendered HTML form.

use uuid::Uuid;

use crate::controller::Outcome;
use crate::prompt::Language;
use crate::scraper::MAX_INPUT_CHARS;

/// Everything the page needs to render one view.
#[derive(Debug, Default)]
pub struct PageView<'a> {
    pub session_id: Option<Uuid>,
    pub text_mode: bool,
    pub url: &'a str,
    pub text: &'a str,
    pub language: Language,
    pub outcome: Option<&'a Outcome>,
    /// Request-level problem (busy, empty input) shown above the form.
    pub notice: Option<&'a str>,
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn selected(flag: bool) -> &'static str {
    if flag { " selected" } else { "" }
}

pub fn render(view: &PageView<'_>) -> String {
    let session_field = view
        .session_id
        .map(|id| format!(r#"<input type="hidden" name="session_id" value="{}">"#, id))
        .unwrap_or_default();

    let language_options: String = Language::ALL
        .iter()
        .map(|lang| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                lang.tag(),
                selected(*lang == view.language),
                lang.label()
            )
        })
        .collect();

    // Both fields are always rendered; the source selector decides which one is read.
    let input_field = format!(
        r#"<label for="url">URL</label>
        <input id="url" name="url" type="url" value="{}">
        <label for="text">Text</label>
        <textarea id="text" name="text" rows="14" maxlength="{}">{}</textarea>"#,
        html_escape(view.url),
        MAX_INPUT_CHARS,
        html_escape(view.text)
    );

    let mut result_section = String::new();
    if let Some(notice) = view.notice {
        result_section.push_str(&format!(r#"<div class="error">{}</div>"#, html_escape(notice)));
    }
    match view.outcome {
        Some(Outcome::Failure { error }) => {
            result_section.push_str(&format!(r#"<div class="error">{}</div>"#, html_escape(error)));
        }
        Some(Outcome::Success { summary }) => {
            let label = if view.text_mode { "Raw text summary" } else { "URL summary" };
            result_section.push_str(&format!(
                r#"<label for="summary">{label}</label>
        <textarea id="summary" rows="8" readonly>{summary}</textarea>
        <form method="post" action="/">
            {session_field}
            <input type="hidden" name="source" value="{source}">
            <input type="hidden" name="url" value="{url}">
            <input type="hidden" name="text" value="{text}">
            <input type="hidden" name="language" value="{language}">
            <input type="hidden" name="action" value="regenerate">
            <button type="submit" class="secondary">Regenerate summary</button>
        </form>
        <hr>"#,
                label = label,
                summary = html_escape(summary),
                session_field = session_field,
                source = if view.text_mode { "text" } else { "url" },
                url = html_escape(view.url),
                text = html_escape(view.text),
                language = view.language.tag(),
            ));
        }
        None => {}
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Concept Summariser</title>
    <style>
        body {{ font-family: sans-serif; max-width: 46rem; margin: 2rem auto; padding: 0 1rem; }}
        label {{ display: block; margin-top: 1rem; font-weight: bold; }}
        input[type=url], textarea, select {{ width: 100%; box-sizing: border-box; }}
        .error {{ background: #fde8e8; color: #9b1c1c; padding: .75rem; margin: 1rem 0; }}
        button {{ margin-top: 1rem; }}
    </style>
</head>
<body>
    <h1>Generate Concept from URL</h1>
    <p>Please enter the product or service URL below and press ENTER
    to generate its concept description.</p>
    <p>You may also select Unstructured Text from the dropdown.</p>
    <form method="post" action="/">
        {session_field}
        <input type="hidden" name="action" value="submit">
        <label for="source">URL or Unstructured Text source</label>
        <select id="source" name="source">
            <option value="url"{url_selected}>URL</option>
            <option value="text"{text_selected}>Unstructured Text</option>
        </select>
        <label for="language">Output language</label>
        <select id="language" name="language">{language_options}</select>
        {input_field}
        <button type="submit">Generate concept</button>
    </form>
    {result_section}
</body>
</html>"#,
        session_field = session_field,
        url_selected = selected(!view.text_mode),
        text_selected = selected(view.text_mode),
        language_options = language_options,
        input_field = input_field,
        result_section = result_section,
    )
}
