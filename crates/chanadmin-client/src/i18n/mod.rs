//! JSON-backed translations with an English fallback.

use serde_json::Value;
use std::str::FromStr;
use std::sync::LazyLock;

/// Supported locale codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum LocaleCode {
    /// English.
    #[default]
    En,
    /// Chinese (Simplified).
    Zh,
}

impl LocaleCode {
    /// All supported locales in display order.
    #[must_use]
    pub const fn all() -> [Self; 2] {
        [Self::En, Self::Zh]
    }

    /// Two-letter code for the locale.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Zh => "zh",
        }
    }

    /// Human-friendly label for selectors.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Zh => "中文",
        }
    }

    /// Map a language tag such as `zh-CN` or `en_US.UTF-8` to a supported locale.
    #[must_use]
    pub fn from_lang_tag(tag: &str) -> Option<Self> {
        let lowered = tag.trim().to_ascii_lowercase();
        let base = lowered
            .split(['-', '_', '.'])
            .next()
            .unwrap_or_default();
        Self::all()
            .iter()
            .copied()
            .find(|locale| locale.code() == base)
    }
}

impl FromStr for LocaleCode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_lang_tag(value).ok_or_else(|| format!("unsupported locale '{value}'"))
    }
}

/// Default fallback locale.
pub const DEFAULT_LOCALE: LocaleCode = LocaleCode::En;

/// Parsed dictionary for one locale.
#[derive(Clone, Debug)]
pub struct TranslationBundle {
    locale: LocaleCode,
    tree: Value,
}

impl PartialEq for TranslationBundle {
    fn eq(&self, other: &Self) -> bool {
        self.locale == other.locale
    }
}

impl Default for TranslationBundle {
    fn default() -> Self {
        Self::new(DEFAULT_LOCALE)
    }
}

impl TranslationBundle {
    /// Build the bundle for `locale`.
    #[must_use]
    pub fn new(locale: LocaleCode) -> Self {
        let tree: Value = serde_json::from_str(raw_locale(locale)).unwrap_or(Value::Null);
        Self { locale, tree }
    }

    /// Locale backing this bundle.
    #[must_use]
    pub const fn locale(&self) -> LocaleCode {
        self.locale
    }

    /// Resolve a dotted key (`section.key`).
    ///
    /// Missing keys fall back to English, then to the key itself.
    #[must_use]
    pub fn text(&self, path: &str) -> String {
        self.lookup(path).unwrap_or_else(|| path.to_string())
    }

    /// Resolve a dotted key with a caller-supplied default instead of the key.
    #[must_use]
    pub fn text_or(&self, path: &str, default: &str) -> String {
        self.lookup(path).unwrap_or_else(|| default.to_string())
    }

    /// Resolve a key and substitute `{name}` placeholders.
    #[must_use]
    pub fn format(&self, path: &str, args: &[(&str, &str)]) -> String {
        let mut rendered = self.text(path);
        for (name, value) in args {
            rendered = rendered.replace(&format!("{{{name}}}"), value);
        }
        rendered
    }

    fn lookup(&self, path: &str) -> Option<String> {
        resolve(&self.tree, path).or_else(|| {
            if self.locale == DEFAULT_LOCALE {
                None
            } else {
                resolve(&EN_FALLBACK.tree, path)
            }
        })
    }
}

static EN_FALLBACK: LazyLock<TranslationBundle> =
    LazyLock::new(|| TranslationBundle::new(LocaleCode::En));

fn resolve(tree: &Value, path: &str) -> Option<String> {
    let mut node = tree;
    for segment in path.split('.') {
        node = node.get(segment)?;
    }
    node.as_str().map(ToString::to_string)
}

const fn raw_locale(locale: LocaleCode) -> &'static str {
    match locale {
        LocaleCode::En => include_str!("../../i18n/en.json"),
        LocaleCode::Zh => include_str!("../../i18n/zh.json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lang_tags_map_to_supported_locales() {
        assert_eq!(LocaleCode::from_lang_tag("zh-CN"), Some(LocaleCode::Zh));
        assert_eq!(LocaleCode::from_lang_tag("en_US.UTF-8"), Some(LocaleCode::En));
        assert_eq!(LocaleCode::from_lang_tag("fr"), None);
        assert!("de".parse::<LocaleCode>().is_err());
    }

    #[test]
    fn missing_key_falls_back_to_english_then_key() {
        let zh = TranslationBundle::new(LocaleCode::Zh);
        assert_eq!(zh.text("channels.title"), "频道");
        assert_eq!(zh.text("errors.invalidDays"), "Days must be at least 1");
        assert_eq!(zh.text("nonexistent.key"), "nonexistent.key");
        assert_eq!(zh.text_or("nonexistent.key", "fallback"), "fallback");
    }

    #[test]
    fn format_substitutes_placeholders() {
        let en = TranslationBundle::new(LocaleCode::En);
        assert_eq!(
            en.format("toast.daysAdded", &[("days", "7"), ("channel", "C1")]),
            "Added 7 days to channel C1"
        );
        assert_eq!(en.format("channels.priority", &[("weight", "3")]), "Priority 3");
    }

    #[test]
    fn bundles_load_all_locales() {
        for locale in LocaleCode::all() {
            let bundle = TranslationBundle::new(locale);
            assert_eq!(bundle.locale(), locale);
            assert_ne!(bundle.text("common.save"), "common.save");
            assert_eq!(bundle.text("meta.label"), locale.label());
        }
    }
}
