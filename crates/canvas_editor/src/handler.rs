use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tracing::{debug, info, warn};

use crate::commands::{Command, CommandContext};
use crate::{CommandError, DEFAULT_HISTORY_CAPACITY};

type History = VecDeque<Box<dyn Command>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases the in-flight flag when the operation settles or is dropped.
#[derive(Debug)]
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool, operation: &str) -> Result<Self, CommandError> {
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("[UndoRedoHandler] Rejected {} while another operation is in flight", operation);
            return Err(CommandError::Busy);
        }
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Undo,
    Redo,
}

impl Side {
    fn opposite(self) -> Self {
        match self {
            Side::Undo => Side::Redo,
            Side::Redo => Side::Undo,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Side::Undo => "undo",
            Side::Redo => "redo",
        }
    }
}

/// The command an undo or redo is running, taken off the top of its stack.
///
/// Until [`Taken::settle`] is called, dropping it puts the command back on
/// top of the stack it came from, so a failed or abandoned call leaves the
/// history as it was.
struct Taken<'a> {
    handler: &'a UndoRedoHandler,
    side: Side,
    command: Option<Box<dyn Command>>,
}

impl<'a> Taken<'a> {
    fn top(handler: &'a UndoRedoHandler, side: Side) -> Option<Self> {
        let mut stack = lock(handler.stack(side));
        let command = stack.pop_back()?;
        *lock(&handler.held) = Some(side);
        Some(Self {
            handler,
            side,
            command: Some(command),
        })
    }

    fn label(&self) -> String {
        self.command.as_ref().map(|c| c.label()).unwrap_or_default()
    }

    /// Undoes the command taken from the undo stack, re-executes one taken
    /// from the redo stack.
    async fn run(&mut self, ctx: &CommandContext<'_>) -> Result<(), CommandError> {
        let Some(command) = self.command.as_mut() else {
            return Ok(());
        };
        match self.side {
            Side::Undo => command.undo(ctx).await,
            Side::Redo => command.execute(ctx).await,
        }
    }

    fn settle(mut self) -> Option<Box<dyn Command>> {
        self.command.take()
    }
}

impl Drop for Taken<'_> {
    fn drop(&mut self) {
        let mut stack = lock(self.handler.stack(self.side));
        if let Some(command) = self.command.take() {
            stack.push_back(command);
        }
        *lock(&self.handler.held) = None;
    }
}

/// Exclusive use of a handler for work outside the command flow, such as
/// loading a project. Every handler call made while it is alive gets
/// [`CommandError::Busy`].
#[derive(Debug)]
pub struct HistoryHold<'a> {
    handler: &'a UndoRedoHandler,
    _in_flight: InFlight<'a>,
}

impl HistoryHold<'_> {
    /// Forgets the whole history.
    pub fn reset(&self) {
        self.handler.clear();
    }
}

/// Runs commands and keeps the bounded undo and redo history.
///
/// A command is only pushed or moved between the stacks once its own
/// `execute` or `undo` has settled successfully. On failure the error is
/// returned and both stacks are left exactly as they were. Only one
/// operation may be in flight at a time, overlapping calls get
/// [`CommandError::Busy`]. A command being undone or redone still counts
/// towards the stack it was taken from until the call settles.
pub struct UndoRedoHandler {
    undo_stack: Mutex<History>,
    redo_stack: Mutex<History>,
    held: Mutex<Option<Side>>,
    capacity: usize,
    in_flight: AtomicBool,
}

impl std::fmt::Debug for UndoRedoHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UndoRedoHandler")
            .field("undo", &self.undo_len())
            .field("redo", &self.redo_len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl Default for UndoRedoHandler {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

static SHARED: OnceLock<Mutex<Option<Arc<UndoRedoHandler>>>> = OnceLock::new();

impl UndoRedoHandler {
    /// A handler keeping at most `capacity` commands per stack.
    pub fn new(capacity: usize) -> Self {
        Self {
            undo_stack: Mutex::new(VecDeque::new()),
            redo_stack: Mutex::new(VecDeque::new()),
            held: Mutex::new(None),
            capacity: capacity.max(1),
            in_flight: AtomicBool::new(false),
        }
    }

    /// The process-wide handler, created on first use.
    ///
    /// Asking again returns the same handler with its history intact. Use
    /// [`UndoRedoHandler::reset_shared`] to start over.
    pub fn shared() -> Arc<UndoRedoHandler> {
        let cell = SHARED.get_or_init(|| Mutex::new(None));
        let mut slot = cell.lock().unwrap_or_else(PoisonError::into_inner);
        slot.get_or_insert_with(|| Arc::new(UndoRedoHandler::default()))
            .clone()
    }

    /// Discards the process-wide handler. Holders of the old one keep it.
    pub fn reset_shared() {
        if let Some(cell) = SHARED.get() {
            cell.lock().unwrap_or_else(PoisonError::into_inner).take();
        }
    }

    /// Executes `command` and records it. Clears the redo history.
    pub async fn execute_command(
        &self,
        ctx: &CommandContext<'_>,
        mut command: Box<dyn Command>,
    ) -> Result<(), CommandError> {
        let _in_flight = InFlight::acquire(&self.in_flight, "execute")?;
        command.execute(ctx).await?;
        debug!("[UndoRedoHandler] Executed '{}'", command.label());
        self.push(&self.undo_stack, command, "undo");
        lock(&self.redo_stack).clear();
        Ok(())
    }

    /// Undoes the most recent command. Returns false if there was nothing to undo.
    pub async fn undo(&self, ctx: &CommandContext<'_>) -> Result<bool, CommandError> {
        let _in_flight = InFlight::acquire(&self.in_flight, "undo")?;
        self.step(ctx, Side::Undo).await
    }

    /// Re-executes the most recently undone command. Returns false if there
    /// was nothing to redo.
    pub async fn redo(&self, ctx: &CommandContext<'_>) -> Result<bool, CommandError> {
        let _in_flight = InFlight::acquire(&self.in_flight, "redo")?;
        self.step(ctx, Side::Redo).await
    }

    /// Takes exclusive use of the handler until the returned hold is dropped.
    pub fn hold(&self, operation: &str) -> Result<HistoryHold<'_>, CommandError> {
        Ok(HistoryHold {
            handler: self,
            _in_flight: InFlight::acquire(&self.in_flight, operation)?,
        })
    }

    async fn step(&self, ctx: &CommandContext<'_>, from: Side) -> Result<bool, CommandError> {
        let Some(mut taken) = Taken::top(self, from) else {
            return Ok(false);
        };
        let label = taken.label();
        if let Err(err) = taken.run(ctx).await {
            warn!("[UndoRedoHandler] The {} of '{}' failed: {}", from.name(), label, err);
            return Err(err);
        }
        debug!("[UndoRedoHandler] Finished the {} of '{}'", from.name(), label);
        if let Some(command) = taken.settle() {
            let to = from.opposite();
            self.push(self.stack(to), command, to.name());
        }
        Ok(true)
    }

    fn stack(&self, side: Side) -> &Mutex<History> {
        match side {
            Side::Undo => &self.undo_stack,
            Side::Redo => &self.redo_stack,
        }
    }

    fn len(&self, side: Side) -> usize {
        let stack = lock(self.stack(side));
        stack.len() + usize::from(*lock(&self.held) == Some(side))
    }

    fn push(&self, stack: &Mutex<History>, command: Box<dyn Command>, name: &str) {
        let mut stack = lock(stack);
        stack.push_back(command);
        while stack.len() > self.capacity {
            if let Some(evicted) = stack.pop_front() {
                debug!(
                    "[UndoRedoHandler] {} history full, dropped '{}'",
                    name,
                    evicted.label()
                );
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.undo_len() > 0
    }

    pub fn can_redo(&self) -> bool {
        self.redo_len() > 0
    }

    pub fn undo_len(&self) -> usize {
        self.len(Side::Undo)
    }

    pub fn redo_len(&self) -> usize {
        self.len(Side::Redo)
    }

    /// Labels of the undo history, oldest first.
    pub fn undo_labels(&self) -> Vec<String> {
        lock(&self.undo_stack).iter().map(|c| c.label()).collect()
    }

    /// Labels of the redo history, oldest first.
    pub fn redo_labels(&self) -> Vec<String> {
        lock(&self.redo_stack).iter().map(|c| c.label()).collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Forgets the whole history. Rejected while another operation is in
    /// flight.
    pub fn reset(&self) -> Result<(), CommandError> {
        self.hold("reset")?.reset();
        Ok(())
    }

    fn clear(&self) {
        lock(&self.undo_stack).clear();
        lock(&self.redo_stack).clear();
        info!("[UndoRedoHandler] History cleared");
    }
}
