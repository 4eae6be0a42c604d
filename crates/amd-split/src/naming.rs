//! Output file names for the primary build and for each bundle.

/// Prefix and suffix applied to every bundle name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleNaming {
    pub prefix: String,
    pub suffix: String,
}

impl BundleNaming {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Final `.js` file name for a logical name.
    ///
    /// A trailing `.js` (any case) is dropped before decorating, so `app.js`
    /// and `app` resolve to the same file. An empty name is returned as is.
    ///
    /// ```
    /// use amd_split::BundleNaming;
    ///
    /// let naming = BundleNaming::new("pre_", "_v1");
    /// assert_eq!(naming.resolve("app.JS"), "pre_app_v1.js");
    /// assert_eq!(naming.resolve(""), "");
    /// ```
    pub fn resolve(&self, name: &str) -> String {
        if name.is_empty() {
            return String::new();
        }
        format!("{}{}{}.js", self.prefix, strip_js_extension(name), self.suffix)
    }

    /// Resolve the primary output name, where absent means "bundler default".
    pub fn resolve_primary(&self, out: Option<&str>) -> Option<String> {
        out.filter(|name| !name.is_empty())
            .map(|name| self.resolve(name))
    }

    /// Manifest key for a bundle. The logical name is used verbatim, without
    /// extension stripping.
    pub fn decorate(&self, name: &str) -> String {
        format!("{}{}{}", self.prefix, name, self.suffix)
    }
}

fn strip_js_extension(name: &str) -> &str {
    let split = name.len().saturating_sub(3);
    match name.get(split..) {
        Some(ext) if ext.eq_ignore_ascii_case(".js") => &name[..split],
        _ => name,
    }
}
