//! Page shown in place of the app while the last build is broken.

use crate::dev::SSE_PATH;
use crate::render::html::escape_attr;

/// HTML page showing `error`. Reloads itself when the next build succeeds.
pub fn render_error_overlay(error: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <title>Build Error</title>
    <style>
      body {{ margin: 0; background: #1e1e1e; color: #e8e8e8; font-family: ui-monospace, Menlo, monospace; }}
      main {{ padding: 2rem; }}
      h1 {{ color: #ff5555; font-size: 1.4rem; }}
      pre {{ background: #2a2a2a; padding: 1rem; border-radius: 4px; white-space: pre-wrap; }}
    </style>
  </head>
  <body>
    <main>
      <h1>Build Error</h1>
      <pre>{error}</pre>
      <p>Fix the error and save; the page reloads once the build succeeds.</p>
    </main>
    <script>
      new EventSource("{sse}").onmessage = function (e) {{
        try {{
          if (JSON.parse(e.data).type === "BuildCompleted") location.reload();
        }} catch (_) {{}}
      }};
    </script>
  </body>
</html>
"#,
        error = escape_attr(error),
        sse = SSE_PATH,
    )
}
