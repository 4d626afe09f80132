use std::cmp::Ordering;

use super::Note;

/// Pinned notes first, then most recently edited. Callers must use a stable
/// sort so equal keys keep insertion order.
pub fn compare(a: &Note, b: &Note) -> Ordering {
    b.pinned()
        .cmp(&a.pinned())
        .then_with(|| b.timestamp().cmp(&a.timestamp()))
}

pub fn sort_notes(notes: &mut [&Note]) {
    // slice::sort_by is stable
    notes.sort_by(|a, b| compare(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use time::OffsetDateTime;

    fn note(content: &str, timestamp: OffsetDateTime, pinned: bool) -> Note {
        Note::restored(content.to_string(), timestamp, pinned)
    }

    fn contents<'a>(notes: &[&'a Note]) -> Vec<&'a str> {
        notes.iter().map(|note| note.content()).collect()
    }

    #[test]
    fn newest_first_within_partition() {
        let old = note("old", datetime!(2024-01-01 00:00 UTC), false);
        let new = note("new", datetime!(2024-02-01 00:00 UTC), false);
        let mut notes = vec![&old, &new];
        sort_notes(&mut notes);
        assert_eq!(contents(&notes), vec!["new", "old"]);
    }

    #[test]
    fn pinned_notes_precede_newer_unpinned_notes() {
        let ts = |day| {
            datetime!(2024-01-01 00:00 UTC) + time::Duration::days(day)
        };
        let a = note("a", ts(5), false);
        let b = note("b", ts(1), true);
        let c = note("c", ts(9), false);
        let d = note("d", ts(3), true);
        let mut notes = vec![&a, &b, &c, &d];
        sort_notes(&mut notes);
        assert_eq!(contents(&notes), vec!["d", "b", "c", "a"]);

        let last_pinned = notes.iter().rposition(|note| note.pinned()).unwrap();
        let first_unpinned = notes.iter().position(|note| !note.pinned()).unwrap();
        assert!(last_pinned < first_unpinned);
    }

    #[test]
    fn ties_keep_insertion_order_across_repeated_sorts() {
        let ts = datetime!(2024-03-03 12:00 UTC);
        let first = note("first", ts, false);
        let second = note("second", ts, false);
        let pinned_a = note("pinned-a", ts, true);
        let pinned_b = note("pinned-b", ts, true);
        let mut notes = vec![&first, &pinned_a, &second, &pinned_b];
        for _ in 0..5 {
            sort_notes(&mut notes);
            assert_eq!(
                contents(&notes),
                vec!["pinned-a", "pinned-b", "first", "second"]
            );
        }
    }
}
