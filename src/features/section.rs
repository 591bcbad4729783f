//! Coarse spatial partition of the depth frame.

/// Section id for every pixel of a `w × h` frame split into `sx` columns
/// and `sy` rows of sections: `row_section + col_section · sy`.
pub fn section_map(w: usize, h: usize, sx: usize, sy: usize) -> Vec<usize> {
    let mut map = Vec::with_capacity(w * h);
    for y in 0..h {
        let row_section = y * sy / h.max(1);
        for x in 0..w {
            let col_section = x * sx / w.max(1);
            map.push(row_section + col_section * sy);
        }
    }
    map
}

/// Sum of `weights` per section id, `section_count` entries.
///
/// Ids outside `0..section_count` are ignored.
pub fn sum_per_section(sections: &[usize], weights: &[f64], section_count: usize) -> Vec<f64> {
    let mut sums = vec![0.0; section_count];
    for (&s, &w) in sections.iter().zip(weights) {
        if let Some(slot) = sums.get_mut(s) {
            *slot += w;
        }
    }
    sums
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadrants_are_numbered_column_major() {
        let map = section_map(4, 4, 2, 2);
        assert_eq!(map[0], 0); // top-left
        assert_eq!(map[3 * 4], 1); // bottom-left
        assert_eq!(map[3], 2); // top-right
        assert_eq!(map[15], 3); // bottom-right
        assert!(map.iter().all(|&s| s < 4));
    }

    #[test]
    fn sums_group_by_section() {
        let sums = sum_per_section(&[0, 2, 2, 3, 9], &[1.0, 2.0, 3.0, 4.0, 100.0], 4);
        assert_eq!(sums, vec![1.0, 0.0, 5.0, 4.0]);
    }
}
