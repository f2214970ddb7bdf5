// Fuzzy matching utilities for stage and project name suggestions

/// Calculate Levenshtein distance between two strings
/// Returns the minimum number of single-character edits (insertions, deletions, substitutions)
/// needed to transform one string into another
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();

    if s1_chars.is_empty() {
        return s2_chars.len();
    }
    if s2_chars.is_empty() {
        return s1_chars.len();
    }

    // Single rolling row of the edit matrix
    let mut previous: Vec<usize> = (0..=s2_chars.len()).collect();
    let mut current = vec![0; s2_chars.len() + 1];

    for (i, c1) in s1_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, c2) in s2_chars.iter().enumerate() {
            let cost = if c1 == c2 { 0 } else { 1 };
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[s2_chars.len()]
}

/// Find names close to `search` (case-insensitive).
///
/// Names within `max_distance` edits match, as do names containing `search`
/// (prefix matches rank ahead of other substrings). Returns up to 5 matches,
/// closest first.
pub fn find_near_matches(search: &str, names: &[&str], max_distance: usize) -> Vec<(String, usize)> {
    let search_lower = search.trim().to_lowercase();
    let mut matches: Vec<(String, usize)> = Vec::new();

    for name in names {
        let name_lower = name.to_lowercase();
        let distance = levenshtein_distance(&search_lower, &name_lower);

        if distance <= max_distance {
            matches.push((name.to_string(), distance));
        } else if !search_lower.is_empty() && name_lower.contains(&search_lower) {
            let extra = name_lower.chars().count() - search_lower.chars().count();
            let penalty = if name_lower.starts_with(&search_lower) { 0 } else { 1 };
            matches.push((name.to_string(), (extra + penalty).min(max_distance)));
        }
    }

    matches.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    matches.dedup_by(|a, b| a.0 == b.0);
    matches.into_iter().take(5).collect()
}

/// "Did you mean ..." suffix for a not-found message, empty when nothing is close
pub fn did_you_mean(search: &str, names: &[&str]) -> String {
    let matches = find_near_matches(search, names, 3);
    if matches.is_empty() {
        String::new()
    } else {
        let quoted: Vec<String> = matches.iter().map(|(name, _)| format!("'{}'", name)).collect();
        format!(" Did you mean {}?", quoted.join(", "))
    }
}
