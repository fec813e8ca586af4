//! Minimal viewer page for runtimes that cannot download directly.
//!
//! The page shows the image with instructions for saving it manually, a
//! download link pointing at the same data URL and a copy button. Copying
//! needs the async clipboard API; without it the page falls back to the
//! long-press instructions.

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

pub fn render_viewer_page(data_url: &str, file_name: &str) -> String {
    let name = escape_html(file_name);
    let src = escape_html(data_url);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{name}</title>
<style>
body {{ margin: 0; padding: 16px; font-family: sans-serif; text-align: center; background: #f5f5f5; }}
img {{ max-width: 100%; height: auto; box-shadow: 0 2px 8px rgba(0,0,0,0.2); }}
.tip {{ margin: 12px 0; color: #555; }}
a.save, button.copy {{ display: inline-block; margin-top: 12px; padding: 10px 20px; background: #1677ff; color: #fff; border: 0; border-radius: 6px; font-size: 1em; text-decoration: none; }}
#copy-status {{ min-height: 1.2em; color: #555; }}
</style>
</head>
<body>
<p class="tip">Long-press the image and choose "Save Image" to keep it.</p>
<p class="tip">On a computer, right-click the image and choose "Save image as".</p>
<img id="watermarked" src="{src}" alt="{name}">
<br>
<a class="save" href="{src}" download="{name}">Download {name}</a>
<button class="copy" type="button" onclick="copyImage()">Copy image</button>
<p id="copy-status"></p>
<script>
function showStatus(message) {{
  document.getElementById('copy-status').textContent = message;
}}
function copyImage() {{
  var img = document.getElementById('watermarked');
  if (!navigator.clipboard || !window.ClipboardItem) {{
    showStatus('Copying is not supported here. Long-press the image to save it.');
    return;
  }}
  fetch(img.src)
    .then(function (res) {{ return res.blob(); }})
    .then(function (blob) {{
      return navigator.clipboard.write([new ClipboardItem({{ 'image/png': blob }})]);
    }})
    .then(function () {{ showStatus('Image copied to clipboard'); }})
    .catch(function () {{ showStatus('Copy failed. Long-press the image to save it.'); }});
}}
window.onload = function () {{
  document.getElementById('watermarked').scrollIntoView();
}};
</script>
</body>
</html>
"#
    )
}
