use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static CAMEL_BOUNDARY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"([\p{Ll}\d])(\p{Lu})").ok());

/// Humanize a data key: `per_conoscenza` -> `Per Conoscenza`, `dataInizio` -> `Data Inizio`.
pub fn prettify_label(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let spaced = match CAMEL_BOUNDARY.as_ref() {
        Some(pattern) => pattern.replace_all(raw, "$1 $2"),
        None => Cow::Borrowed(raw),
    };

    let mut result = String::with_capacity(spaced.len());
    let mut capitalize = true;
    for ch in spaced.chars() {
        if ch == '_' || ch == '-' || ch == ' ' {
            if !result.ends_with(' ') {
                result.push(' ');
            }
            capitalize = true;
            continue;
        }

        if capitalize {
            result.extend(ch.to_uppercase());
            capitalize = false;
        } else {
            result.push(ch);
        }
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humanizes_snake_kebab_and_camel_case() {
        assert_eq!(prettify_label("per_conoscenza"), "Per Conoscenza");
        assert_eq!(prettify_label("data-fine"), "Data Fine");
        assert_eq!(prettify_label("dataInizio"), "Data Inizio");
        assert_eq!(prettify_label("giorniTotali2"), "Giorni Totali2");
        assert_eq!(prettify_label("città"), "Città");
        assert_eq!(prettify_label("__pec__"), "Pec");
    }
}
