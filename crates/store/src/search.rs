//! Stateless substring matcher over the Dictionary table.
//!
//! A row matches when any of its five textual fields contains the query as a
//! case-insensitive substring. Results come back in table order, unranked and
//! unlimited. Minimum-length validation happens upstream in the dispatcher;
//! this function assumes a pre-validated, non-empty query.

use ordbok_core::record::VerbEntry;

/// All rows whose fields contain `query`, in table order.
pub fn matches<'a>(verbs: &'a [VerbEntry], query: &str) -> Vec<&'a VerbEntry> {
    let needle = query.to_lowercase();
    verbs
        .iter()
        .filter(|v| v.fields().iter().any(|f| f.to_lowercase().contains(&needle)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary() -> Vec<VerbEntry> {
        vec![
            VerbEntry::new("å legge", "legger", "la", "har lagt", "to lay"),
            VerbEntry::new("å danse", "danser", "danset", "har danset", "to dance"),
            VerbEntry::new("å gå", "går", "gikk", "har gått", "to walk"),
        ]
    }

    #[test]
    fn matches_are_substring_not_prefix() {
        let verbs = dictionary();
        let hits = matches(&verbs, "legg");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].infinitive, "å legge");

        // "egg" is an inner substring of "legge" and must still match.
        let hits = matches(&verbs, "egg");
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let verbs = dictionary();
        assert_eq!(matches(&verbs, "DANS").len(), 1);
        assert_eq!(matches(&verbs, "Gikk").len(), 1);
    }

    #[test]
    fn any_field_matches_including_translation() {
        let verbs = dictionary();
        let hits = matches(&verbs, "walk");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].infinitive, "å gå");
    }

    #[test]
    fn results_keep_table_order() {
        let verbs = dictionary();
        // "har" appears in every past participle.
        let hits = matches(&verbs, "har");
        let keys: Vec<&str> = hits.iter().map(|v| v.infinitive.as_str()).collect();
        assert_eq!(keys, vec!["å legge", "å danse", "å gå"]);
    }

    #[test]
    fn no_hits_yields_empty() {
        let verbs = dictionary();
        assert!(matches(&verbs, "xyz").is_empty());
    }
}
