//! Rewriting of `registryDependencies` identifiers into published URLs.

use serde_json::Value;

/// Maps registry-internal dependency names to the absolute URL of their published descriptor.
///
/// Identifiers starting with the internal prefix become `<base-url>/<identifier>.json`.
/// Identifiers that are already URLs, and bare names of external items, pass through. Applying
/// the rewrite to its own output changes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyRewriter<'a> {
  prefix: &'a str,
  base_url: &'a str,
}

impl<'a> DependencyRewriter<'a> {
  /// Create a rewriter; a trailing slash on `base_url` is ignored.
  pub fn new(prefix: &'a str, base_url: &'a str) -> Self {
    Self {
      prefix,
      base_url: base_url.trim_end_matches('/'),
    }
  }

  /// Whether the identifier is already an absolute `http(s)` URL.
  pub fn is_url(identifier: &str) -> bool {
    identifier.starts_with("http://") || identifier.starts_with("https://")
  }

  /// Whether the identifier names an item of this registry.
  pub fn is_internal(&self, identifier: &str) -> bool {
    !Self::is_url(identifier) && !self.prefix.is_empty() && identifier.starts_with(self.prefix)
  }

  /// Rewrite a single identifier.
  pub fn rewrite_one(&self, identifier: &str) -> String {
    if self.is_internal(identifier) {
      format!("{}/{}.json", self.base_url, identifier)
    } else {
      identifier.to_string()
    }
  }

  /// Rewrite a list of identifiers, preserving order and length.
  pub fn rewrite<S: AsRef<str>>(&self, identifiers: &[S]) -> Vec<String> {
    identifiers
      .iter()
      .map(|identifier| self.rewrite_one(identifier.as_ref()))
      .collect()
  }

  /// Rewrite an arbitrary JSON value.
  ///
  /// Only string elements of an array are touched; any other value is returned unchanged.
  pub fn rewrite_value(&self, value: &Value) -> Value {
    match value {
      Value::Array(entries) => Value::Array(
        entries
          .iter()
          .map(|entry| match entry {
            Value::String(identifier) => Value::String(self.rewrite_one(identifier)),
            other => other.clone(),
          })
          .collect(),
      ),
      other => other.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  const BASE: &str =
    "https://raw.githubusercontent.com/RMNCLDYO/coderabbit-shadcn-registry/main/public/r";

  fn rewriter() -> DependencyRewriter<'static> {
    DependencyRewriter::new("coderabbit-", BASE)
  }

  #[test]
  fn rewrites_prefixed_identifiers() {
    assert_eq!(
      rewriter().rewrite(&["button", "coderabbit-types"]),
      vec![
        "button".to_string(),
        format!("{BASE}/coderabbit-types.json"),
      ]
    );
  }

  #[test]
  fn leaves_urls_untouched() {
    let url = "https://example.com/r/coderabbit-types.json";
    assert_eq!(rewriter().rewrite_one(url), url);
    assert_eq!(rewriter().rewrite_one("http://x/y.json"), "http://x/y.json");
  }

  #[test]
  fn rewriting_is_idempotent() {
    let once = rewriter().rewrite(&["coderabbit-form", "card", "coderabbit-types"]);
    let twice = rewriter().rewrite(&once);
    assert_eq!(once, twice);
  }

  #[test]
  fn ignores_trailing_slash_on_base_url() {
    let rewriter = DependencyRewriter::new("coderabbit-", "https://host/r/");
    assert_eq!(
      rewriter.rewrite_one("coderabbit-a"),
      "https://host/r/coderabbit-a.json"
    );
  }

  #[test]
  fn empty_prefix_matches_nothing() {
    let rewriter = DependencyRewriter::new("", BASE);
    assert_eq!(rewriter.rewrite_one("button"), "button");
  }

  #[test]
  fn rewrite_value_passes_non_arrays_through() {
    let rewriter = rewriter();
    assert_eq!(rewriter.rewrite_value(&json!(null)), json!(null));
    assert_eq!(
      rewriter.rewrite_value(&json!("coderabbit-a")),
      json!("coderabbit-a")
    );
    assert_eq!(
      rewriter.rewrite_value(&json!(["coderabbit-a", 3, "b"])),
      json!([format!("{BASE}/coderabbit-a.json"), 3, "b"])
    );
  }

  #[test]
  fn input_is_not_mutated() {
    let input = vec!["coderabbit-a".to_string()];
    let _ = rewriter().rewrite(&input);
    assert_eq!(input, vec!["coderabbit-a".to_string()]);
  }
}
