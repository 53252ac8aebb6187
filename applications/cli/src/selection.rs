//! Numbered-choice parsing for console prompts

/// 1-based numbers from input like `"1, 3 4"`, as 0-based indices below `len`
///
/// Non-numeric tokens and out-of-range numbers are ignored; duplicates are
/// kept once, in first-seen order.
pub fn parse_indices(input: &str, len: usize) -> Vec<usize> {
    let mut indices = Vec::new();
    for token in input.replace(',', " ").split_whitespace() {
        let Ok(n) = token.parse::<usize>() else {
            continue;
        };
        if n == 0 || n > len {
            continue;
        }
        if !indices.contains(&(n - 1)) {
            indices.push(n - 1);
        }
    }
    indices
}

/// Single 1-based choice; `None` for cancel, blanks, or out-of-range input
pub fn parse_choice(input: &str, len: usize) -> Option<usize> {
    match input.trim().parse::<usize>() {
        Ok(n) if n >= 1 && n <= len => Some(n - 1),
        _ => None,
    }
}

/// Pick the items at `indices`
pub fn pick<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().filter_map(|&i| items.get(i).cloned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_indices() {
        assert_eq!(parse_indices("1, 3 4", 4), vec![0, 2, 3]);
        assert_eq!(parse_indices("2,2 x 9 0", 3), vec![1]);
        assert!(parse_indices("", 3).is_empty());
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice(" 2 ", 3), Some(1));
        assert_eq!(parse_choice("0", 3), None);
        assert_eq!(parse_choice("4", 3), None);
        assert_eq!(parse_choice("abc", 3), None);
    }

    #[test]
    fn test_pick_skips_missing() {
        assert_eq!(pick(&["a", "b"], &[1, 5]), vec!["b"]);
    }
}
