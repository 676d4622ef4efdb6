use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::{ChapterBucket, ChapterEntry};

/// Leading numeric prefix of a chapter label, the way `parseFloat` reads it:
/// `"10.5"` -> 10.5, `"12a"` -> 12, `" 7"` -> 7, `"Extra"` -> `None`.
pub fn parse_chapter_number(label: &str) -> Option<f64> {
    let s = label.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    if s[end..].starts_with("Infinity") {
        let value = f64::INFINITY;
        return Some(if s.starts_with('-') { -value } else { value });
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end.min(bytes.len())..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    s[..end].parse::<f64>().ok()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Numbers ascending; labels without a number after every numbered one.
pub fn compare_chapter_numbers(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Bucket entries by their exact label. Buckets come out in ascending
/// numeric order; equal values keep the order their labels were first seen.
pub fn group_by_number(entries: Vec<ChapterEntry>) -> Vec<ChapterBucket> {
    let mut buckets: Vec<ChapterBucket> = Vec::new();
    let mut index_by_label: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        match index_by_label.get(&entry.number) {
            Some(&idx) => buckets[idx].entries.push(entry),
            None => {
                index_by_label.insert(entry.number.clone(), buckets.len());
                buckets.push(ChapterBucket {
                    number: entry.number.clone(),
                    value: parse_chapter_number(&entry.number),
                    entries: vec![entry],
                });
            }
        }
    }

    buckets.sort_by(|a, b| compare_chapter_numbers(a.value, b.value));
    buckets
}
