//! Shared label normalization for the resolution pipeline.
//!
//! Every taxonomy-store key goes through [`normalize_name`]; the per-database
//! adapters additionally strip their own header decorations and run
//! [`correct_synonym`] as the final step before resolution.

/// Title-cases every alphabetic run: first letter uppercased, the rest
/// lowercased. Non-alphabetic characters act as boundaries, so
/// `beta-lactam` becomes `Beta-Lactam` and `macrolide/lincosamide` becomes
/// `Macrolide/Lincosamide`.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

/// Canonical node-name normalization: spaces and hyphens folded to
/// underscore, then title-cased. `Beta-Lactam` and `beta lactam` both map
/// to `Beta_Lactam`.
pub fn normalize_name(value: &str) -> String {
    let folded: String = value
        .trim()
        .chars()
        .map(|ch| if ch == ' ' || ch == '-' { '_' } else { ch })
        .collect();
    title_case(&folded)
}

/// Known cross-database synonym corrections, applied after title casing and
/// before resolution.
pub fn correct_synonym(label: &str) -> &str {
    match label {
        "Betalactam" => "Beta-Lactam",
        "Zink" => "Zinc",
        "Ionophores" => "Ionophore",
        "Aluminum" => "Aluminium",
        "Mls" => "Macrolide/Lincosamide/Streptogramin B",
        _ => label,
    }
}

/// Strips a single trailing plural `s`, as the source tables pluralize
/// phenotype names inconsistently.
pub fn strip_plural(label: &str) -> &str {
    label.strip_suffix('s').unwrap_or(label)
}

/// Removes the decorations CARD attaches to drug-class strings.
pub fn strip_card_decorations(label: &str) -> String {
    label.replace("-like", "").replace(" antibiotic", "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_case_python_semantics() {
        assert_eq!(title_case("beta-lactam"), "Beta-Lactam");
        assert_eq!(title_case("MACROLIDE/lincosamide"), "Macrolide/Lincosamide");
        assert_eq!(title_case("clavulanic acid"), "Clavulanic Acid");
        assert_eq!(title_case("beta_lactam"), "Beta_Lactam");
    }

    #[test]
    fn normalize_name_folds_separators() {
        assert_eq!(normalize_name("Beta-Lactam"), "Beta_Lactam");
        assert_eq!(normalize_name("beta lactam"), "Beta_Lactam");
        assert_eq!(normalize_name(" clavulanic acid "), "Clavulanic_Acid");
        assert_eq!(
            normalize_name("Amoxicillin+Clavulanic acid"),
            "Amoxicillin+Clavulanic_Acid"
        );
    }

    #[test]
    fn synonyms_resolve_to_canonical_spelling() {
        assert_eq!(correct_synonym("Betalactam"), "Beta-Lactam");
        assert_eq!(correct_synonym("Zink"), "Zinc");
        assert_eq!(correct_synonym("Aluminum"), "Aluminium");
        assert_eq!(correct_synonym("Tetracycline"), "Tetracycline");
    }

    #[test]
    fn card_decorations_removed() {
        assert_eq!(strip_card_decorations("penam antibiotic"), "penam");
        assert_eq!(strip_card_decorations("tetracycline-like"), "tetracycline");
    }
}
