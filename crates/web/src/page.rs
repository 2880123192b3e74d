use multilens_core::form::{Mode, AUDIO_EXTENSIONS, IMAGE_EXTENSIONS};
use multilens_core::languages::{Language, SOURCE_LANGUAGES, TARGET_LANGUAGES};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    Error(String),
}

/// Everything one render needs; inputs are echoed back so a rejected form keeps its values.
#[derive(Debug, Clone)]
pub struct PageView {
    pub mode: Mode,
    pub source: String,
    pub target: String,
    pub text: String,
    pub outcome: Option<Outcome>,
}

impl PageView {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            source: SOURCE_LANGUAGES[0].name().to_string(),
            target: TARGET_LANGUAGES[0].name().to_string(),
            text: String::new(),
            outcome: None,
        }
    }

    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\"', "&quot;")
        .replace('\'', "&#39;")
}

fn form_action(mode: Mode) -> &'static str {
    match mode {
        Mode::Translation => "/translate",
        Mode::ImageOcr => "/ocr",
        Mode::AudioToText => "/transcribe",
        Mode::Sentiment => "/sentiment",
    }
}

fn render_mode_nav(active: Mode) -> String {
    let mut out = String::from("<nav><h2>Select a Feature</h2><ul>");
    for mode in Mode::ALL {
        let class = if mode == active { " class=\"active\"" } else { "" };
        out.push_str(&format!(
            "<li><a href=\"/?mode={}\"{}>{}</a></li>",
            mode.slug(),
            class,
            mode.title()
        ));
    }
    out.push_str("</ul></nav>");
    out
}

fn render_language_select(name: &str, label: &str, options: &[Language], selected: &str) -> String {
    let mut out = format!("<label for=\"{name}\">{label}</label><select id=\"{name}\" name=\"{name}\">");
    for lang in options {
        let flag = if lang.name().eq_ignore_ascii_case(selected.trim()) {
            " selected"
        } else {
            ""
        };
        out.push_str(&format!("<option value=\"{0}\"{1}>{0}</option>", lang.name(), flag));
    }
    out.push_str("</select>");
    out
}

fn render_inputs(view: &PageView) -> String {
    match view.mode {
        Mode::Translation => format!(
            "<h3>Select Languages</h3>{}{}<label for=\"text\">Enter text to translate:</label><textarea id=\"text\" name=\"text\" rows=\"6\">{}</textarea>",
            render_language_select("source", "Source Language:", &SOURCE_LANGUAGES, &view.source),
            render_language_select("target", "Target Language:", &TARGET_LANGUAGES, &view.target),
            escape_html(&view.text)
        ),
        Mode::Sentiment => format!(
            "<label for=\"text\">Enter text for sentiment analysis:</label><textarea id=\"text\" name=\"text\" rows=\"6\">{}</textarea>",
            escape_html(&view.text)
        ),
        Mode::ImageOcr => render_file_input("Upload an Image:", &IMAGE_EXTENSIONS),
        Mode::AudioToText => render_file_input("Upload an Audio File:", &AUDIO_EXTENSIONS),
    }
}

fn render_file_input(label: &str, extensions: &[&str]) -> String {
    let accept = extensions
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "<label for=\"file\">{label}</label><input id=\"file\" type=\"file\" name=\"file\" accept=\"{accept}\"/><p class=\"hint\">{}</p>",
        extensions.join(", ").to_ascii_uppercase()
    )
}

fn render_outcome(outcome: Option<&Outcome>) -> String {
    match outcome {
        Some(Outcome::Success(text)) => {
            format!("<div class=\"result success\">{}</div>", escape_html(text))
        }
        Some(Outcome::Error(text)) => {
            format!("<div class=\"result error\">{}</div>", escape_html(text))
        }
        None => String::new(),
    }
}

pub fn render_page(view: &PageView) -> String {
    let enctype = match view.mode {
        Mode::ImageOcr | Mode::AudioToText => " enctype=\"multipart/form-data\"",
        Mode::Translation | Mode::Sentiment => "",
    };
    format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8"/>
    <meta name="viewport" content="width=device-width, initial-scale=1"/>
    <title>Lightweight Multimodal Analysis App</title>
    <style>
      body {{ font-family: ui-sans-serif, system-ui, -apple-system, Segoe UI, Roboto, Helvetica, Arial; margin: 0; display: flex; min-height: 100vh; color: #111; }}
      nav {{ width: 220px; background: #f3f4f6; padding: 24px 16px; }}
      nav ul {{ list-style: none; padding: 0; }}
      nav a {{ display: block; padding: 6px 8px; border-radius: 6px; color: #1f2937; text-decoration: none; }}
      nav a.active {{ background: #2563eb; color: #fff; }}
      main {{ flex: 1; padding: 32px 40px; max-width: 860px; }}
      label {{ display: block; margin: 14px 0 6px; font-weight: 600; }}
      select, textarea {{ width: 100%; padding: 8px; border: 1px solid #d1d5db; border-radius: 8px; box-sizing: border-box; }}
      button {{ margin-top: 16px; padding: 8px 18px; border: 0; border-radius: 8px; background: #2563eb; color: #fff; cursor: pointer; }}
      .hint {{ color: #6b7280; font-size: 13px; }}
      .result {{ margin-top: 20px; padding: 12px 16px; border-radius: 8px; white-space: pre-wrap; }}
      .success {{ background: #ecfdf5; border: 1px solid #10b981; }}
      .error {{ background: #fef2f2; border: 1px solid #ef4444; }}
    </style>
  </head>
  <body>
    {nav}
    <main>
      <h1>Lightweight Multimodal Analysis App</h1>
      <h2>{title}</h2>
      <form method="post" action="{action}"{enctype}>
        {inputs}
        <button type="submit">{submit}</button>
      </form>
      {outcome}
    </main>
  </body>
</html>
"#,
        nav = render_mode_nav(view.mode),
        title = view.mode.title(),
        action = form_action(view.mode),
        enctype = enctype,
        inputs = render_inputs(view),
        submit = view.mode.submit_label(),
        outcome = render_outcome(view.outcome.as_ref()),
    )
}
