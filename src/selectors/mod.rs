use anyhow::Result;
use std::fmt;

/// A declarative reference to a page element.
///
/// Locators are rendered to JavaScript expressions and resolved fresh on
/// every evaluation, so a locator never goes stale when the page re-renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// `document.getElementById`
    Id(String),
    Css(String),
    Xpath(String),
    /// Elements matching `css` whose trimmed text contains `text`.
    Text { css: String, text: String },
    /// First match of `css` inside the element `scope` resolves to.
    Within { scope: Box<Locator>, css: String },
    /// Nearest ancestor-or-self of `origin` matching `css`.
    Ancestor { origin: Box<Locator>, css: String },
}

impl Locator {
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::Xpath(expr.into())
    }

    pub fn text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Text {
            css: css.into(),
            text: text.into(),
        }
    }

    pub fn within(self, css: impl Into<String>) -> Self {
        Self::Within {
            scope: Box::new(self),
            css: css.into(),
        }
    }

    pub fn ancestor(self, css: impl Into<String>) -> Self {
        Self::Ancestor {
            origin: Box::new(self),
            css: css.into(),
        }
    }

    /// JS expression evaluating to the first matching element or `null`.
    pub fn to_js(&self) -> Result<String> {
        Ok(match self {
            Self::Id(id) => format!("document.getElementById({})", serde_json::to_string(id)?),
            Self::Css(sel) => format!("document.querySelector({})", serde_json::to_string(sel)?),
            Self::Xpath(expr) => format!(
                r#"document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue"#,
                serde_json::to_string(expr)?
            ),
            Self::Text { .. } => format!("({}[0] || null)", self.to_js_all()?),
            Self::Within { scope, css } => format!(
                r#"(() => {{ const scope = {}; return scope ? scope.querySelector({}) : null; }})()"#,
                scope.to_js()?,
                serde_json::to_string(css)?
            ),
            Self::Ancestor { origin, css } => format!(
                r#"(() => {{ const origin = {}; return origin ? origin.closest({}) : null; }})()"#,
                origin.to_js()?,
                serde_json::to_string(css)?
            ),
        })
    }

    /// JS expression evaluating to an array of every matching element.
    pub fn to_js_all(&self) -> Result<String> {
        Ok(match self {
            Self::Css(sel) => format!(
                "Array.from(document.querySelectorAll({}))",
                serde_json::to_string(sel)?
            ),
            Self::Xpath(expr) => format!(
                r#"(() => {{
                    const result = document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
                    const out = [];
                    for (let i = 0; i < result.snapshotLength; i++) {{
                        const node = result.snapshotItem(i);
                        if (node.nodeType === Node.ELEMENT_NODE) out.push(node);
                    }}
                    return out;
                }})()"#,
                serde_json::to_string(expr)?
            ),
            Self::Text { css, text } => format!(
                r#"Array.from(document.querySelectorAll({})).filter(el => (el.textContent || '').trim().includes({}))"#,
                serde_json::to_string(css)?,
                serde_json::to_string(text)?
            ),
            Self::Within { scope, css } => format!(
                r#"(() => {{ const scope = {}; return scope ? Array.from(scope.querySelectorAll({})) : []; }})()"#,
                scope.to_js()?,
                serde_json::to_string(css)?
            ),
            Self::Id(_) | Self::Ancestor { .. } => format!(
                r#"(() => {{ const el = {}; return el ? [el] : []; }})()"#,
                self.to_js()?
            ),
        })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{}", id),
            Self::Css(sel) => write!(f, "{}", sel),
            Self::Xpath(expr) => write!(f, "xpath={}", expr),
            Self::Text { css, text } => write!(f, "{}:has-text({:?})", css, text),
            Self::Within { scope, css } => write!(f, "{} >> {}", scope, css),
            Self::Ancestor { origin, css } => write!(f, "{} << {}", origin, css),
        }
    }
}

/// Quote `value` as an XPath string literal, falling back to `concat()`
/// when it contains both quote characters.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value
            .split('\'')
            .map(|part| format!("'{}'", part))
            .collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}
