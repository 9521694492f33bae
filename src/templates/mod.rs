//! HTML shells for the landing page and the editor.
//!
//! Pages are loaded once at startup from `STATIC_DIR`, falling back to the
//! copies compiled into the binary. Placeholders look like `{{Name}}` and are
//! substituted in a single pass with HTML-escaped values.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

const BUILTIN_INDEX: &str = include_str!("../../static/index.html");
const BUILTIN_EDITOR: &str = include_str!("../../static/editor.html");

#[derive(Debug, Clone)]
pub struct TemplateStore {
    index: String,
    editor: String,
}

/// Values substituted into the editor shell.
#[derive(Debug, Clone)]
pub struct EditorPage<'a> {
    pub text: &'a str,
    pub ws_url: &'a str,
    pub username: &'a str,
    pub room_id: &'a str,
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self {
            index: BUILTIN_INDEX.to_string(),
            editor: BUILTIN_EDITOR.to_string(),
        }
    }
}

impl TemplateStore {
    /// Load overrides from `dir`; missing files keep the built-in page.
    pub fn load(dir: &Path) -> Self {
        Self {
            index: load_page(dir, "index.html", BUILTIN_INDEX),
            editor: load_page(dir, "editor.html", BUILTIN_EDITOR),
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn render_editor(&self, page: &EditorPage<'_>) -> String {
        let values = HashMap::from([
            ("Text", page.text),
            ("Host", page.ws_url),
            ("Username", page.username),
            ("RoomID", page.room_id),
        ]);
        render(&self.editor, &values)
    }
}

fn load_page(dir: &Path, name: &str, builtin: &str) -> String {
    let path = dir.join(name);
    match std::fs::read_to_string(&path) {
        Ok(page) => {
            info!(path = %path.display(), "Loaded page template");
            page
        }
        Err(e) => {
            debug!(path = %path.display(), "Using built-in {}: {}", name, e);
            builtin.to_string()
        }
    }
}

/// Replace each known `{{Name}}` with its escaped value; unknown ones are left as is.
pub fn render(template: &str, values: &HashMap<&str, &str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let name = after[..end].trim();
                match values.get(name) {
                    Some(value) => out.push_str(&escape_html(value)),
                    None => out.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
