//! Parse/lower pipeline for one compilation unit
//!
//! The parser runs on a producer thread and hands declarations to the
//! lowering side through a [`BoundedQueue`]. A full queue blocks the parser;
//! an empty one blocks the lowerer. The producer closes the queue exactly once
//! when it finishes or fails, which ends the consumer's loop.

use super::lower::ModuleLowerer;
use super::{CompileOptions, CompiledUnit};
use crate::error::{Error, Result};
use crate::lexer::Token;
use crate::parser::Parser;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use tracing::{debug, trace};

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Blocking single-producer/single-consumer queue with a fixed capacity
pub struct BoundedQueue<T> {
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Creates an open queue holding at most `capacity` items (at least one)
    pub fn new(capacity: usize) -> Self {
        BoundedQueue {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity.max(1)),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity: capacity.max(1),
        }
    }

    /// Appends an item, waiting while the queue is full
    ///
    /// Hands the item back if the queue has been closed.
    pub fn push(&self, item: T) -> std::result::Result<(), T> {
        let mut state = self.state.lock();
        while state.items.len() >= self.capacity && !state.closed {
            self.not_full.wait(&mut state);
        }
        if state.closed {
            return Err(item);
        }
        state.items.push_back(item);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Takes the oldest item, waiting while the queue is empty
    ///
    /// Returns `None` once the queue is closed and drained.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                self.not_full.notify_one();
                return Some(item);
            }
            if state.closed {
                return None;
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Marks end of stream. Only the first call has an effect and returns `true`.
    pub fn close(&self) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        state.closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
        true
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Items currently queued
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// True when nothing is queued
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of queued items
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Closes the queue when the producer exits, including by panic
struct CloseOnDrop<'q, T>(&'q BoundedQueue<T>);

impl<T> Drop for CloseOnDrop<'_, T> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Parses and lowers one unit's tokens
///
/// A parse error is fatal for the unit and comes back as `Err`, even if some
/// declarations before it were already lowered. Lowering errors are recorded
/// in [`CompiledUnit::diagnostics`].
pub fn compile_unit(tokens: Vec<Token>, options: &CompileOptions) -> Result<CompiledUnit> {
    let mut lowerer = ModuleLowerer::new(options.clone());

    if !options.pipelined {
        let program = Parser::new(tokens).parse()?;
        for decl in program.declarations {
            lowerer.accept(decl);
        }
        return Ok(lowerer.finish());
    }

    let queue = BoundedQueue::new(options.queue_capacity);
    let parsed = std::thread::scope(|s| {
        let queue = &queue;
        let producer = s.spawn(move || -> Result<usize> {
            let _close = CloseOnDrop(queue);
            let mut parser = Parser::new(tokens);
            let mut count = 0;
            while let Some(decl) = parser.next_declaration()? {
                trace!(declaration = decl.name(), "queued");
                if queue.push(decl).is_err() {
                    break;
                }
                count += 1;
            }
            Ok(count)
        });

        while let Some(decl) = queue.pop() {
            lowerer.accept(decl);
        }

        producer
            .join()
            .unwrap_or_else(|_| Err(Error::compiler("parser thread panicked")))
    });

    let count = parsed?;
    debug!(declarations = count, file = %options.source_filename, "parsed unit");
    Ok(lowerer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_close_is_once() {
        let queue: BoundedQueue<u32> = BoundedQueue::new(4);
        assert!(queue.close());
        assert!(!queue.close());
        assert!(queue.is_closed());
    }

    #[test]
    fn test_drains_after_close() {
        let queue = BoundedQueue::new(4);
        queue.push(1).unwrap();
        queue.push(2).unwrap();
        queue.close();
        assert_eq!(queue.push(3), Err(3));
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_producer_blocks_when_full() {
        let queue = Arc::new(BoundedQueue::new(2));
        let producer = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || {
                for i in 0..100 {
                    queue.push(i).unwrap();
                    assert!(queue.len() <= queue.capacity());
                }
                queue.close();
            })
        };

        let mut received = Vec::new();
        while let Some(item) = queue.pop() {
            received.push(item);
        }
        producer.join().unwrap();
        assert_eq!(received, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let queue: BoundedQueue<()> = BoundedQueue::new(0);
        assert_eq!(queue.capacity(), 1);
        assert!(queue.is_empty());
    }
}
