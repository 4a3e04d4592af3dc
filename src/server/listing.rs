use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use std::fs;
use std::path::Path;

/// Characters escaped in listing hrefs.
const HREF: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

struct Entry {
    name: String,
    is_dir: bool,
    is_symlink: bool,
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

/// Renders an HTML index of `dir`. `display_path` is the decoded URL path.
pub fn render(dir: &Path, display_path: &str) -> std::io::Result<String> {
    let mut entries = Vec::new();
    for item in fs::read_dir(dir)? {
        let item = item?;
        let file_type = item.file_type()?;
        let is_symlink = file_type.is_symlink();
        let is_dir = if is_symlink {
            item.path().is_dir()
        } else {
            file_type.is_dir()
        };
        entries.push(Entry {
            name: item.file_name().to_string_lossy().into_owned(),
            is_dir,
            is_symlink,
        });
    }
    entries.sort_by_key(|e| e.name.to_lowercase());

    let title = format!("Directory listing for {}", escape_html(display_path));
    let mut html = String::new();
    html.push_str("<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n</head>\n<body>\n", title));
    html.push_str(&format!("<h1>{}</h1>\n<hr>\n<ul>\n", title));

    for entry in &entries {
        let mut display = entry.name.clone();
        let mut link = entry.name.clone();
        if entry.is_dir {
            display.push('/');
            link.push('/');
        }
        if entry.is_symlink {
            display.push('@');
        }
        html.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            utf8_percent_encode(&link, HREF),
            escape_html(&display)
        ));
    }

    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    Ok(html)
}
