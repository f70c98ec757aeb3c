use esglens_store::IndicatorDefinition;

/// Words too generic to sharpen a retrieval query.
const STOPWORDS: [&str; 20] = [
    "the", "and", "for", "from", "with", "during", "total", "number", "share", "their", "that",
    "this", "are", "was", "were", "has", "have", "been", "under", "into",
];

const MAX_KEYWORDS: usize = 8;

/// Retrieval query for one indicator:
/// `"{parameter_name} {measurement_unit} {keywords-from-description}"`.
pub fn build_search_query(indicator: &IndicatorDefinition) -> String {
    let mut keywords: Vec<String> = Vec::new();
    for word in indicator.description.split_whitespace() {
        let cleaned: String = word
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        if cleaned.len() < 4 || STOPWORDS.contains(&cleaned.as_str()) {
            continue;
        }
        if keywords.contains(&cleaned) {
            continue;
        }
        keywords.push(cleaned);
        if keywords.len() >= MAX_KEYWORDS {
            break;
        }
    }

    format!(
        "{} {} {}",
        indicator.parameter_name,
        indicator.measurement_unit,
        keywords.join(" ")
    )
    .trim()
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indicator(name: &str, unit: &str, description: &str) -> IndicatorDefinition {
        IndicatorDefinition {
            id: 0,
            indicator_code: "TEST".to_string(),
            attribute_number: 1,
            parameter_name: name.to_string(),
            measurement_unit: unit.to_string(),
            description: description.to_string(),
            pillar: "E".to_string(),
            weight: 1.0,
            polarity: "lower_is_better".to_string(),
            ref_min: Some(0.0),
            ref_max: Some(100.0),
            industry_baseline: None,
        }
    }

    #[test]
    fn query_leads_with_name_and_unit() {
        let ind = indicator(
            "Total Scope 1 emissions",
            "MT CO2e",
            "Total direct greenhouse gas emissions from owned or controlled sources",
        );
        let query = build_search_query(&ind);
        assert!(query.starts_with("Total Scope 1 emissions MT CO2e"));
        assert!(query.contains("greenhouse"));
        assert!(query.contains("emissions"));
    }

    #[test]
    fn stopwords_and_short_words_are_dropped() {
        let ind = indicator("X", "u", "the total from and for gas use");
        let query = build_search_query(&ind);
        assert!(!query.contains("the"));
        assert!(!query.contains("from"));
        assert!(!query.contains(" gas"));
    }

    #[test]
    fn keywords_are_deduplicated_and_capped() {
        let description = "emissions emissions water water energy waste carbon methane nitrogen sulphur particulate chlorine";
        let ind = indicator("Name", "unit", description);
        let query = build_search_query(&ind);
        let keyword_part = query.strip_prefix("Name unit ").unwrap();
        let words: Vec<&str> = keyword_part.split_whitespace().collect();
        assert!(words.len() <= MAX_KEYWORDS);
        assert_eq!(words.iter().filter(|w| **w == "emissions").count(), 1);
    }
}
