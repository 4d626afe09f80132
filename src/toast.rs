use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(2_000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToastEvent {
    Shown(String),
    Dismissed(String),
}

/// FIFO of transient messages, shown one at a time.
///
/// Showing a toast arms a single dismissal deadline; [`ToastQueue::poll`]
/// fires it and advances to the next message.
#[derive(Debug)]
pub struct ToastQueue {
    duration: Duration,
    waiting: VecDeque<String>,
    current: Option<Toast>,
    deadline: Option<Instant>,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_DURATION)
    }
}

impl ToastQueue {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            waiting: VecDeque::new(),
            current: None,
            deadline: None,
        }
    }

    /// Shows the message straight away if nothing is on screen, otherwise
    /// queues it behind the others.
    pub fn enqueue(&mut self, message: impl Into<String>, now: Instant) -> Option<ToastEvent> {
        self.waiting.push_back(message.into());
        if self.current.is_some() {
            return None;
        }
        self.show_next(now)
    }

    pub fn poll(&mut self, now: Instant) -> Vec<ToastEvent> {
        let mut events = Vec::new();
        match self.deadline {
            Some(deadline) if now >= deadline => {}
            _ => return events,
        }
        self.deadline = None;
        if let Some(toast) = self.current.take() {
            events.push(ToastEvent::Dismissed(toast.message));
        }
        events.extend(self.show_next(now));
        events
    }

    /// Every message not yet dismissed, in display order. Leaves the queue
    /// idle; for front ends without an event loop.
    pub fn drain(&mut self) -> Vec<String> {
        self.deadline = None;
        self.current
            .take()
            .map(|toast| toast.message)
            .into_iter()
            .chain(self.waiting.drain(..))
            .collect()
    }

    pub fn current(&self) -> Option<&Toast> {
        self.current.as_ref()
    }

    pub fn pending_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Messages waiting behind the current one.
    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.waiting.is_empty()
    }

    fn show_next(&mut self, now: Instant) -> Option<ToastEvent> {
        let message = self.waiting.pop_front()?;
        self.current = Some(Toast {
            message: message.clone(),
            duration: self.duration,
        });
        self.deadline = Some(now + self.duration);
        Some(ToastEvent::Shown(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(100);

    #[test]
    fn first_message_shows_immediately() {
        let start = Instant::now();
        let mut queue = ToastQueue::new(Duration::from_secs(2));
        assert_eq!(
            queue.enqueue("Note pinned", start),
            Some(ToastEvent::Shown("Note pinned".into()))
        );
        assert_eq!(queue.pending_deadline(), Some(start + Duration::from_secs(2)));
        assert!(queue.poll(start + TICK).is_empty());
    }

    #[test]
    fn messages_wait_their_turn_in_order() {
        let start = Instant::now();
        let duration = Duration::from_secs(2);
        let mut queue = ToastQueue::new(duration);
        queue.enqueue("one", start);
        assert_eq!(queue.enqueue("two", start + TICK), None);
        assert_eq!(queue.enqueue("three", start + TICK * 2), None);
        assert_eq!(queue.current().unwrap().message, "one");
        assert_eq!(queue.len(), 2);

        let events = queue.poll(start + duration);
        assert_eq!(
            events,
            vec![
                ToastEvent::Dismissed("one".into()),
                ToastEvent::Shown("two".into())
            ]
        );
        // the next toast gets its full duration from when it was shown
        assert_eq!(queue.pending_deadline(), Some(start + duration * 2));

        queue.poll(start + duration * 2);
        let events = queue.poll(start + duration * 3);
        assert_eq!(events, vec![ToastEvent::Dismissed("three".into())]);
        assert!(queue.is_idle());
        assert_eq!(queue.pending_deadline(), None);
    }

    #[test]
    fn refilling_while_showing_keeps_a_single_deadline() {
        let start = Instant::now();
        let duration = Duration::from_secs(1);
        let mut queue = ToastQueue::new(duration);
        queue.enqueue("a", start);
        let armed = queue.pending_deadline();
        for i in 0..5 {
            queue.enqueue(format!("late {i}"), start + TICK);
            assert_eq!(queue.pending_deadline(), armed);
        }

        let mut shown = vec!["a".to_string()];
        let mut now = start;
        while !queue.is_idle() {
            now += duration;
            for event in queue.poll(now) {
                if let ToastEvent::Shown(message) = event {
                    assert!(queue.current().is_some());
                    shown.push(message);
                }
            }
        }
        assert_eq!(shown, vec!["a", "late 0", "late 1", "late 2", "late 3", "late 4"]);
    }

    #[test]
    fn drain_returns_everything_once() {
        let start = Instant::now();
        let mut queue = ToastQueue::default();
        queue.enqueue("x", start);
        queue.enqueue("y", start);
        assert_eq!(queue.drain(), vec!["x", "y"]);
        assert!(queue.is_idle());
        assert!(queue.drain().is_empty());
        assert_eq!(queue.enqueue("z", start), Some(ToastEvent::Shown("z".into())));
    }
}
