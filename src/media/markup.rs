//! HTML fragments and editor scripts
//!
//! Everything that ends up inside the note's HTML or is evaluated in the
//! editor document is produced here, so the attribute vocabulary lives in
//! one place.

use crate::config::MediaConfig;
use crate::media::naming::{MediaIdentifier, MediaKind};

/// Class carried by every inline media element.
pub const MEDIA_CLASS: &str = "inline-media";

/// Boolean attributes toggled by the attribute editor.
pub const BOOLEAN_ATTRIBUTES: [&str; 4] = ["auto_front", "auto_back", "loop", "mute"];

/// Attributes read back by [`query_element_script`], in result order.
pub const QUERIED_ATTRIBUTES: [&str; 6] = ["auto_front", "auto_back", "loop", "mute", "height", "width"];

/// Containers of the editor's rich text fields.
const EDITABLE_SELECTOR: &str = "div.rich-text-editable";

/// Autoplay only outside an editing surface, when visible, and when the
/// front/back flag matches the side of the card being shown.
const CANPLAY_HANDLER: &str = concat!(
    "if(this.getRootNode().querySelector('anki-editable') === null",
    " && this.offsetParent !== null",
    " && ((this.hasAttribute('auto_front') && !document.body.classList.contains('back'))",
    " || (this.hasAttribute('auto_back') && document.body.classList.contains('back'))))",
    " {this.play();}"
);

/// Tells the host which element was right-clicked.
const CONTEXTMENU_HANDLER: &str = "pycmd(this.id); return true;";

/// Escape text for use inside a double-quoted HTML attribute.
pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Quote a string as a JavaScript string literal.
pub fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Build the `<audio>`/`<video>` element for a stored media file.
pub fn media_element(
    kind: MediaKind,
    id: &MediaIdentifier,
    stored_name: &str,
    config: &MediaConfig,
) -> String {
    let mut dims = String::new();
    if kind == MediaKind::Video {
        if let Some(height) = config.height() {
            dims.push_str(&format!(r#" height="{height}""#));
        }
        if let Some(width) = config.width() {
            dims.push_str(&format!(r#" width="{width}""#));
        }
    }

    format!(
        r#"<{tag} id="{id}" class="{MEDIA_CLASS}" src="{src}" controls{attribs}{dims} oncanplay="{CANPLAY_HANDLER}" oncontextmenu="{CONTEXTMENU_HANDLER}"></{tag}>"#,
        tag = kind.as_str(),
        src = escape_attribute(stored_name),
        attribs = config.default_attributes(),
    )
}

/// Join converted elements for insertion, separated by non-breaking spaces.
pub fn insertion_html(fragments: &[String]) -> String {
    format!("&nbsp;{}&nbsp;", fragments.join("&nbsp;&nbsp;"))
}

/// Script body that binds `el` to the element with `element_id` in any
/// editing surface, or leaves it `null`.
fn locate_element(element_id: &str) -> String {
    format!(
        r#"let el = null;
    for (const container of document.querySelectorAll('{EDITABLE_SELECTOR}')) {{
        if (container.shadowRoot && (el = container.shadowRoot.getElementById({id}))) {{
            break;
        }}
    }}"#,
        id = js_string(element_id),
    )
}

/// Read the tag name and the queried attributes of an element.
pub fn query_element_script(element_id: &str) -> String {
    format!(
        r#"(function () {{
    {locate}
    if (!el) {{
        return null;
    }}
    return [el.tagName, {attrs}];
}})();"#,
        locate = locate_element(element_id),
        attrs = QUERIED_ATTRIBUTES
            .iter()
            .map(|name| format!("el.getAttribute('{name}')"))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Wrap `statements` (which may use `el`) so they only run when the element
/// exists. The script evaluates to `true` when it ran.
pub fn with_element_script(element_id: &str, statements: &str) -> String {
    format!(
        r#"(function () {{
    {locate}
    if (!el) {{
        return false;
    }}
    {statements}
    return true;
}})();"#,
        locate = locate_element(element_id),
    )
}

/// Insert an empty marker node at the end of the current selection of the
/// focused editing surface.
pub fn create_marker_script(marker_id: &str) -> String {
    format!(
        r#"(function () {{
    const root = document.activeElement && document.activeElement.shadowRoot;
    if (!root) {{
        return false;
    }}
    const sel = root.getSelection();
    if (!sel || sel.rangeCount === 0) {{
        return false;
    }}
    sel.collapseToEnd();
    const el = document.createElement('div');
    el.id = {id};
    sel.getRangeAt(0).insertNode(el);
    return true;
}})();"#,
        id = js_string(marker_id),
    )
}

/// Insert `html` in front of the marker, then drop the marker.
pub fn splice_at_marker_script(marker_id: &str, html: &str) -> String {
    format!(
        r#"(function () {{
    let pos = null;
    for (const container of document.querySelectorAll('{EDITABLE_SELECTOR}')) {{
        if (container.shadowRoot && (pos = container.shadowRoot.getElementById({id}))) {{
            break;
        }}
    }}
    if (!pos) {{
        return false;
    }}
    pos.insertAdjacentHTML('beforebegin', {html});
    pos.remove();
    return true;
}})();"#,
        id = js_string(marker_id),
        html = js_string(html),
    )
}

/// Remove one marker node, wherever it ended up. Other markers belong to
/// batches still in flight and are left alone.
pub fn remove_marker_script(marker_id: &str) -> String {
    format!(
        r#"(function () {{
    for (const container of document.querySelectorAll('{EDITABLE_SELECTOR}')) {{
        const pos = container.shadowRoot && container.shadowRoot.getElementById({id});
        if (pos) {{
            pos.remove();
            return true;
        }}
    }}
    return false;
}})();"#,
        id = js_string(marker_id),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_id() -> MediaIdentifier {
        MediaIdentifier::parse("im-media-0b6c2f1e-2a44-4c1d-9a55-1f0e2d3c4b5a").unwrap()
    }

    #[test]
    fn test_audio_element_has_fixed_vocabulary() {
        let html = media_element(MediaKind::Audio, &fixed_id(), "_x.ogg", &MediaConfig::default());
        assert!(html.starts_with(
            r#"<audio id="im-media-0b6c2f1e-2a44-4c1d-9a55-1f0e2d3c4b5a" class="inline-media" src="_x.ogg" controls oncanplay=""#
        ));
        assert!(html.contains(r#"oncontextmenu="pycmd(this.id); return true;""#));
        assert!(html.ends_with("></audio>"));
        assert!(!html.contains("height="));
    }

    #[test]
    fn test_video_element_dimensions_and_defaults() {
        let config = MediaConfig {
            video_height: 240,
            video_width: -1,
            auto_back: true,
            mute: true,
            ..MediaConfig::default()
        };
        let html = media_element(MediaKind::Video, &fixed_id(), "_x.webm", &config);
        assert!(html.contains(r#"controls auto_back="true" mute="true" height="240" oncanplay"#));
        assert!(!html.contains("width="));

        // Dimensions never apply to audio
        let html = media_element(MediaKind::Audio, &fixed_id(), "_x.ogg", &config);
        assert!(!html.contains("height="));
    }

    #[test]
    fn test_stored_name_is_escaped() {
        let html = media_element(MediaKind::Audio, &fixed_id(), r#"a"b&c.ogg"#, &MediaConfig::default());
        assert!(html.contains(r#"src="a&quot;b&amp;c.ogg""#));
    }

    #[test]
    fn test_insertion_html() {
        let html = insertion_html(&["<a></a>".to_string(), "<b></b>".to_string()]);
        assert_eq!(html, "&nbsp;<a></a>&nbsp;&nbsp;<b></b>&nbsp;");
    }

    #[test]
    fn test_scripts_quote_their_inputs() {
        let script = splice_at_marker_script("im-tmp-1", "<audio src=\"`${x}`\"></audio>");
        assert!(script.contains(r#"getElementById("im-tmp-1")"#));
        assert!(script.contains(r#""<audio src=\"`${x}`\"></audio>""#));

        let script = query_element_script("im-media-x");
        assert!(script.contains("el.getAttribute('width')"));
        assert!(script.contains("return null;"));

        let script = remove_marker_script("im-tmp-1");
        assert!(script.contains(r#"getElementById("im-tmp-1")"#));
        assert!(!script.contains("querySelectorAll(\"div"));
    }
}
