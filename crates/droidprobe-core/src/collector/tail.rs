//! Bounded tail window over a line stream.
//!
//! Keeps the most recent N lines of a possibly unbounded source in a fixed
//! arena of N slots. Memory use does not depend on how many lines pass
//! through.

use std::io;
use std::num::NonZeroUsize;

/// The last `capacity` lines seen, oldest first when iterated.
#[derive(Debug, Clone)]
pub struct TailWindow {
    slots: Box<[Option<String>]>,
    /// Slot the next line is written to.
    next: usize,
    len: usize,
    seen: u64,
}

impl TailWindow {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            slots: vec![None; capacity.get()].into_boxed_slice(),
            next: 0,
            len: 0,
            seen: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of retained lines, `min(seen, capacity)`.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total lines consumed, including evicted ones.
    pub fn seen(&self) -> u64 {
        self.seen
    }

    /// Appends a line, overwriting the oldest one when full.
    pub fn push(&mut self, line: String) {
        let cap = self.slots.len();
        self.slots[self.next] = Some(line);
        self.next = (self.next + 1) % cap;
        if self.len < cap {
            self.len += 1;
        }
        self.seen += 1;
    }

    /// Index of the logically oldest retained line.
    fn start(&self) -> usize {
        if self.len == self.slots.len() {
            self.next
        } else {
            0
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        let cap = self.slots.len();
        let start = self.start();
        (0..self.len).filter_map(move |i| self.slots[(start + i) % cap].as_deref())
    }

    pub fn into_lines(self) -> Vec<String> {
        let start = self.start();
        let mut slots = self.slots.into_vec();
        slots.rotate_left(start);
        slots.into_iter().flatten().collect()
    }
}

/// Consumes `lines` and keeps the last `capacity` of them.
pub fn tail<I>(lines: I, capacity: NonZeroUsize) -> TailWindow
where
    I: IntoIterator<Item = String>,
{
    let mut window = TailWindow::new(capacity);
    for line in lines {
        window.push(line);
    }
    window
}

/// Like [`tail`] for fallible sources.
///
/// Stops at the first read error and returns it alongside whatever was
/// retained up to that point.
pub fn tail_fallible<I>(lines: I, capacity: NonZeroUsize) -> (TailWindow, Option<io::Error>)
where
    I: IntoIterator<Item = io::Result<String>>,
{
    let mut window = TailWindow::new(capacity);
    for line in lines {
        match line {
            Ok(line) => window.push(line),
            Err(e) => return (window, Some(e)),
        }
    }
    (window, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cap(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn numbered(k: usize) -> Vec<String> {
        (0..k).map(|i| format!("line {i}")).collect()
    }

    #[test]
    fn test_tail_fewer_lines_than_capacity() {
        let window = tail(numbered(3), cap(5));
        assert_eq!(window.len(), 3);
        assert_eq!(window.into_lines(), vec!["line 0", "line 1", "line 2"]);
    }

    #[test]
    fn test_tail_wraps_and_keeps_order() {
        let window = tail(numbered(12), cap(5));
        assert_eq!(window.len(), 5);
        assert_eq!(window.seen(), 12);
        let expected = vec!["line 7", "line 8", "line 9", "line 10", "line 11"];
        assert_eq!(window.iter().collect::<Vec<_>>(), expected);
        assert_eq!(window.into_lines(), expected);
    }

    #[test]
    fn test_tail_exact_capacity() {
        let window = tail(numbered(4), cap(4));
        assert_eq!(window.iter().next(), Some("line 0"));
        assert_eq!(window.len(), 4);
    }

    #[test]
    fn test_tail_capacity_one() {
        let window = tail(numbered(100), cap(1));
        assert_eq!(window.into_lines(), vec!["line 99"]);
    }

    #[test]
    fn test_tail_empty_source() {
        let window = tail(Vec::<String>::new(), cap(10));
        assert!(window.is_empty());
        assert_eq!(window.seen(), 0);
        assert!(window.into_lines().is_empty());
    }

    #[test]
    fn test_tail_unbounded_source_memory_is_fixed() {
        let lines = (0..100_000u32).map(|i| i.to_string());
        let window = tail(lines, cap(3));
        assert_eq!(window.capacity(), 3);
        assert_eq!(window.into_lines(), vec!["99997", "99998", "99999"]);
    }

    #[test]
    fn test_tail_fallible_stops_at_error() {
        let source = vec![
            Ok("a".to_string()),
            Ok("b".to_string()),
            Err(io::Error::other("pipe broke")),
            Ok("never".to_string()),
        ];
        let (window, err) = tail_fallible(source, cap(5));
        assert!(err.is_some());
        assert_eq!(window.into_lines(), vec!["a", "b"]);
    }

    proptest! {
        #[test]
        fn prop_tail_keeps_last_min_k_n(n in 1usize..64, k in 0usize..400) {
            let input = numbered(k);
            let window = tail(input.clone(), cap(n));
            let kept = k.min(n);
            prop_assert_eq!(window.len(), kept);
            prop_assert_eq!(window.seen(), k as u64);
            let from_iter: Vec<String> = window.iter().map(str::to_string).collect();
            prop_assert_eq!(&from_iter[..], &input[k - kept..]);
            prop_assert_eq!(window.into_lines(), input[k - kept..].to_vec());
        }
    }
}
