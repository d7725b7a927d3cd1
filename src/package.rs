//! Package classification - file path → owning plugin or theme
//!
//! A package is an independently-authored unit of code identified purely by
//! directory convention: the path segment after `wp-content/plugins/`,
//! `wp-content/mu-plugins/` or `wp-content/themes/`. Everything else,
//! WordPress core included, collapses into the `__other__` sentinel group.
//!
//! The same rule is used at ingestion time and at resolve time; a split-brain
//! classification here would silently corrupt the dependency grouping.

use regex::Regex;
use std::sync::OnceLock;

/// Sentinel group for files outside any recognized package root
pub const OTHER_PACKAGE: &str = "__other__";

fn package_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"wp-content/(?:(?:mu-)?plugins|themes)/([^/]+)").unwrap()
    })
}

fn package_prefix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^.*wp-content/(?:(?:mu-)?plugins|themes)/").unwrap()
    })
}

/// Map a root-relative file path to its owning package name.
///
/// The package-root pattern may match at any depth; a path with no match
/// classifies as [`OTHER_PACKAGE`].
pub fn classify(path: &str) -> String {
    package_pattern()
        .captures(path)
        .map(|captures| captures[1].to_string())
        .unwrap_or_else(|| OTHER_PACKAGE.to_string())
}

/// Trim everything through the package-root directory, for display grouping.
///
/// Paths outside any package root are returned unchanged.
pub fn strip_package_prefix(path: &str) -> String {
    package_prefix_pattern().replace(path, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_plugin() {
        assert_eq!(
            classify("wp-content/plugins/woocommerce/includes/class-wc-cart.php"),
            "woocommerce"
        );
    }

    #[test]
    fn test_classify_mu_plugin_and_theme() {
        assert_eq!(classify("wp-content/mu-plugins/loader/loader.php"), "loader");
        assert_eq!(
            classify("wp-content/themes/twentytwenty/functions.php"),
            "twentytwenty"
        );
    }

    #[test]
    fn test_classify_matches_at_any_depth() {
        assert_eq!(
            classify("sites/blog/wp-content/plugins/seo/seo.php"),
            "seo"
        );
    }

    #[test]
    fn test_classify_other() {
        assert_eq!(classify("wp-includes/plugin.php"), OTHER_PACKAGE);
        assert_eq!(classify("wp-admin/admin.php"), OTHER_PACKAGE);
        assert_eq!(classify("wp-content/uploads/2024/img.php"), OTHER_PACKAGE);
    }

    #[test]
    fn test_strip_package_prefix() {
        assert_eq!(
            strip_package_prefix("wp-content/plugins/seo/includes/meta.php"),
            "seo/includes/meta.php"
        );
        assert_eq!(
            strip_package_prefix("wp-includes/plugin.php"),
            "wp-includes/plugin.php"
        );
    }
}
