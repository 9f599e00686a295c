//! The bootstrap script carried by runtime bundles, and the module wrappers
//! every other bundle is made of.

/// Module registry shared by all bundles of a page.
const BOOTSTRAP: &str = r#"(function (global) {
  if (global.__kiln__) return;
  var definitions = Object.create(null);
  var cache = Object.create(null);
  function require(key) {
    if (cache[key]) return cache[key].exports;
    var factory = definitions[key];
    if (!factory) throw new Error("kiln: module not found: " + key);
    var module = (cache[key] = { exports: {} });
    factory(module, module.exports, require);
    return module.exports;
  }
  global.__kiln__ = {
    define: function (key, factory) { definitions[key] = factory; },
    require: require,
    run: function (key) { return require(key); },
    style: function (key, css) {
      var el = document.querySelector('style[data-kiln="' + key + '"]');
      if (!el) {
        el = document.createElement("style");
        el.setAttribute("data-kiln", key);
        document.head.appendChild(el);
      }
      el.textContent = css;
    },
    hot: false
  };
})(typeof window !== "undefined" ? window : globalThis);
"#;

/// Body of a runtime-only bundle.
pub fn bootstrap(hot_reload: bool) -> String {
    let mut out = String::from(BOOTSTRAP);
    if hot_reload {
        out.push_str("__kiln__.hot = true;\n");
    }
    out
}

/// Register a script module.
pub fn define_script(key: &str, source: &str) -> String {
    format!(
        "__kiln__.define({}, function (module, exports, require) {{\n{}\n}});\n",
        js_string(key),
        source.trim_end()
    )
}

/// Register a module whose value is a URL.
pub fn define_url(key: &str, url: &str) -> String {
    format!(
        "__kiln__.define({}, function (module) {{ module.exports = {}; }});\n",
        js_string(key),
        js_string(url)
    )
}

/// Register a style module that injects its CSS when required.
pub fn define_style(key: &str, css: &str) -> String {
    format!(
        "__kiln__.define({key_js}, function () {{ __kiln__.style({key_js}, {css}); }});\n",
        key_js = js_string(key),
        css = js_string(css)
    )
}

/// Run an entry module once its bundle has loaded.
pub fn run_entry(key: &str) -> String {
    format!("__kiln__.run({});\n", js_string(key))
}

/// Quote `value` as a JavaScript string literal.
pub fn js_string(value: &str) -> String {
    // JSON string literals are valid JavaScript once U+2028/2029 are escaped.
    serde_json::Value::String(value.to_string())
        .to_string()
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}
