//! Level letters and sibling numbering.
//!
//! A node ID is `<Level><Number>`: the level is the leading run of uppercase
//! letters, the number is a positive integer unique among siblings.

use std::collections::BTreeSet;

pub const ROOT_LEVEL: &str = "A";

/// Leading letter run of an ID (`"BC12"` -> `"BC"`).
pub fn level_of(id: &str) -> &str {
    let end = id
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_uppercase())
        .map(|(idx, _)| idx)
        .unwrap_or(id.len());
    &id[..end]
}

/// Numeric suffix of an ID, if it is a well-formed `<Level><Number>`.
pub fn number_of(id: &str) -> Option<u32> {
    let level = level_of(id);
    if level.is_empty() {
        return None;
    }
    let digits = &id[level.len()..];
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|n| *n > 0)
}

/// Advance a level by one: `A -> B`, `Z -> ZA`, `ZA -> ZB`, `ZZ -> ZZA`.
pub fn next_level(level: &str) -> String {
    match level.chars().last() {
        None => ROOT_LEVEL.to_string(),
        Some(last) if last.is_ascii_uppercase() && last != 'Z' => {
            let mut next = level[..level.len() - last.len_utf8()].to_string();
            next.push(char::from(last as u8 + 1));
            next
        }
        Some(_) => format!("{level}A"),
    }
}

/// Level of the children of a node with ID `parent_id`.
pub fn child_level(parent_id: &str) -> String {
    next_level(level_of(parent_id))
}

/// `count` consecutive IDs of `level` starting at `starting_number`.
///
/// `None` when the last number would not fit in a `u32`.
pub fn generate_sibling_ids(level: &str, starting_number: u32, count: usize) -> Option<Vec<String>> {
    if count == 0 {
        return Some(Vec::new());
    }
    let span = u32::try_from(count - 1).ok()?;
    let last = starting_number.checked_add(span)?;
    Some(
        (starting_number..=last)
            .map(|number| format!("{level}{number}"))
            .collect(),
    )
}

/// First number free for a new sibling of `level`: one past the highest
/// number already used at that level, or `1` when none exist. `None` once
/// the level has used `u32::MAX`.
pub fn next_sibling_number<'a, I>(level: &str, existing_ids: I) -> Option<u32>
where
    I: IntoIterator<Item = &'a str>,
{
    match existing_ids
        .into_iter()
        .filter(|id| level_of(id) == level)
        .filter_map(number_of)
        .max()
    {
        Some(max) => max.checked_add(1),
        None => Some(1),
    }
}

/// Smallest positive root number not already in use, formatted as `A<n>`.
pub fn find_next_available_root_id<I>(existing_root_numbers: I) -> String
where
    I: IntoIterator<Item = u32>,
{
    let used: BTreeSet<u32> = existing_root_numbers.into_iter().collect();
    let mut candidate = 1;
    while used.contains(&candidate) {
        candidate += 1;
    }
    format!("{ROOT_LEVEL}{candidate}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_level_and_number() {
        assert_eq!(level_of("B12"), "B");
        assert_eq!(level_of("ZA3"), "ZA");
        assert_eq!(level_of("7"), "");
        assert_eq!(number_of("B12"), Some(12));
        assert_eq!(number_of("ZA3"), Some(3));
        assert_eq!(number_of("B"), None);
        assert_eq!(number_of("B0"), None);
        assert_eq!(number_of("B1x"), None);
    }

    #[test]
    fn next_level_wraps_after_z() {
        assert_eq!(next_level("A"), "B");
        assert_eq!(next_level("Y"), "Z");
        assert_eq!(next_level("Z"), "ZA");
        assert_eq!(next_level("ZA"), "ZB");
        assert_eq!(next_level("ZZ"), "ZZA");
        assert_eq!(child_level("C4"), "D");
    }

    #[test]
    fn generates_consecutive_ids() {
        assert_eq!(
            generate_sibling_ids("B", 1, 3),
            Some(vec!["B1".to_string(), "B2".to_string(), "B3".to_string()])
        );
        assert_eq!(generate_sibling_ids("B", 1, 0), Some(Vec::new()));
    }

    #[test]
    fn next_number_continues_after_existing_siblings() {
        let start = next_sibling_number("B", ["B1", "B2"]).unwrap();
        assert_eq!(
            generate_sibling_ids("B", start, 3).unwrap(),
            vec!["B3", "B4", "B5"]
        );
        assert_eq!(next_sibling_number("B", std::iter::empty()), Some(1));
    }

    #[test]
    fn next_number_skips_gaps_and_other_levels() {
        assert_eq!(next_sibling_number("B", ["B1", "B4", "C9"]), Some(5));
        assert_eq!(next_sibling_number("C", ["B1", "B4"]), Some(1));
    }

    #[test]
    fn numbering_stops_at_the_top_of_u32() {
        let top = format!("B{}", u32::MAX);
        assert_eq!(next_sibling_number("B", [top.as_str()]), None);
        assert_eq!(next_sibling_number("B", ["B1", "B4294967294"]), Some(u32::MAX));
        assert_eq!(
            generate_sibling_ids("B", u32::MAX, 1),
            Some(vec![top.clone()])
        );
        assert_eq!(generate_sibling_ids("B", u32::MAX, 2), None);
        assert_eq!(generate_sibling_ids("B", u32::MAX - 1, 3), None);
    }

    #[test]
    fn root_ids_reuse_the_lowest_gap() {
        assert_eq!(find_next_available_root_id([1, 3]), "A2");
        assert_eq!(find_next_available_root_id(Vec::new()), "A1");
        assert_eq!(find_next_available_root_id([1, 2, 3]), "A4");
        assert_eq!(find_next_available_root_id([2]), "A1");
    }
}
