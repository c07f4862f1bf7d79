use std::collections::HashSet;

/// Make raw header cells usable as column names: trimmed, never blank,
/// never repeated. Blank headers become `column_<n>` (1-based position);
/// repeats get `_2`, `_3`, ... appended.
pub fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut columns = Vec::with_capacity(raw.len());

    for (index, header) in raw.into_iter().enumerate() {
        let trimmed = header.trim();
        let base = if trimmed.is_empty() {
            format!("column_{}", index + 1)
        } else {
            trimmed.to_string()
        };

        let mut candidate = base.clone();
        let mut suffix = 2;
        while seen.contains(&candidate) {
            candidate = format!("{}_{}", base, suffix);
            suffix += 1;
        }

        seen.insert(candidate.clone());
        columns.push(candidate);
    }

    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_blank_and_duplicate_headers() {
        let normalized = normalize_headers(headers(&[" id ", "", "name", "name", "name_2", "name"]));
        assert_eq!(
            normalized,
            vec!["id", "column_2", "name", "name_2", "name_2_2", "name_3"]
        );
    }

    #[test]
    fn test_clean_headers_pass_through() {
        let normalized = normalize_headers(headers(&["email", "e-mail", "Full Name"]));
        assert_eq!(normalized, vec!["email", "e-mail", "Full Name"]);
    }
}
