//! The application: the active toolkit and the UI-thread queue.
//!
//! Widgets and drawing contexts may only be used on the thread that created the
//! [`Application`]. Other threads hand work to it through an [`Invoker`]; queued callbacks and
//! due timers run when the UI thread calls [`Application::dispatch_pending`].

use crate::config::AppConfig;
use crate::registry::ToolkitRegistry;
use crate::widget::Widget;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};
use weft_core::{DrawingContext, Error, Result, TextLayout, Toolkit, WidgetKind};

type Task = Box<dyn FnOnce() + Send>;

/// Sends callbacks to the UI thread. Cheap to clone and usable from any thread.
#[derive(Clone)]
pub struct Invoker {
    sender: Sender<Task>,
}

impl core::fmt::Debug for Invoker {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "Invoker {{ pending: {} }}", self.sender.len())
    }
}

impl Invoker {
    /// Queues a callback to run on the UI thread.
    pub fn invoke<F: FnOnce() + Send + 'static>(&self, f: F) -> Result<()> {
        self.sender
            .send(Box::new(f))
            .map_err(|_| Error::Disconnected)
    }

    /// Queues a callback and returns a handle to its result.
    pub fn invoke_async<T, F>(&self, f: F) -> Result<Reply<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (reply, receiver) = channel::bounded(1);
        self.invoke(move || {
            // the reply handle may have been dropped
            let _ = reply.send(f());
        })?;
        Ok(Reply { receiver })
    }
}

/// The result of an [`Invoker::invoke_async`] callback.
#[derive(Debug)]
pub struct Reply<T> {
    receiver: Receiver<T>,
}

impl<T> Reply<T> {
    /// Blocks until the callback has run. Must not be called on the UI thread, which would wait
    /// for itself.
    pub fn wait(self) -> Result<T> {
        self.receiver.recv().map_err(|_| Error::Disconnected)
    }

    /// Waits at most `timeout`; returns `Ok(None)` if the callback has not run yet.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<Option<T>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(value) => Ok(Some(value)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(Error::Disconnected),
        }
    }

    /// Returns the result if the callback has already run.
    pub fn try_get(&self) -> Result<Option<T>> {
        match self.receiver.try_recv() {
            Ok(value) => Ok(Some(value)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(Error::Disconnected),
        }
    }
}

/// Cancels a repeating timeout.
///
/// Cancellation is best-effort: a callback that is already running completes, but it is not
/// run again.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

struct Timer {
    due: Instant,
    interval: Duration,
    callback: Box<dyn FnMut() -> bool>,
    cancelled: Arc<AtomicBool>,
}

/// A running application.
pub struct Application {
    config: AppConfig,
    toolkit: Box<dyn Toolkit>,
    ui_thread: ThreadId,
    sender: Sender<Task>,
    receiver: Receiver<Task>,
    timers: Vec<Timer>,
}

impl core::fmt::Debug for Application {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("Application")
            .field("toolkit", &self.toolkit)
            .field("pending", &self.receiver.len())
            .field("timers", &self.timers.len())
            .finish()
    }
}

impl Application {
    /// Starts an application on the current thread with the toolkit selected by `config`.
    pub fn new(config: AppConfig, registry: &ToolkitRegistry) -> Result<Application> {
        let toolkit = registry.create(config.selected_toolkit())?;
        Ok(Application::with_toolkit(config, toolkit))
    }

    pub fn with_toolkit(config: AppConfig, toolkit: Box<dyn Toolkit>) -> Application {
        let (sender, receiver) = channel::unbounded();
        Application {
            config,
            toolkit,
            ui_thread: thread::current().id(),
            sender,
            receiver,
            timers: Vec::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn toolkit(&self) -> &dyn Toolkit {
        &*self.toolkit
    }

    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.ui_thread
    }

    pub fn invoker(&self) -> Invoker {
        Invoker {
            sender: self.sender.clone(),
        }
    }

    /// Runs `f` after `delay`, and again every `delay` for as long as it returns true.
    pub fn timeout_invoke<F>(&mut self, delay: Duration, f: F) -> TimerHandle
    where
        F: FnMut() -> bool + 'static,
    {
        self.timeout_invoke_at(Instant::now(), delay, f)
    }

    /// [`Application::timeout_invoke`] with an explicit start time.
    pub fn timeout_invoke_at<F>(&mut self, now: Instant, delay: Duration, f: F) -> TimerHandle
    where
        F: FnMut() -> bool + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.timers.push(Timer {
            due: now + delay,
            interval: delay,
            callback: Box::new(f),
            cancelled: Arc::clone(&cancelled),
        });
        TimerHandle { cancelled }
    }

    /// Runs queued callbacks and due timers. Returns the number of callbacks run.
    pub fn dispatch_pending(&mut self) -> Result<usize> {
        self.dispatch_pending_at(Instant::now())
    }

    /// [`Application::dispatch_pending`] with timers evaluated at `now`.
    pub fn dispatch_pending_at(&mut self, now: Instant) -> Result<usize> {
        if !self.is_ui_thread() {
            return Err(Error::WrongThread);
        }
        let mut count = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(task) => {
                    task();
                    count += 1;
                }
                Err(TryRecvError::Empty) => break,
                // unreachable while self holds a sender
                Err(TryRecvError::Disconnected) => return Err(Error::Disconnected),
            }
        }

        self.timers.retain(|t| !t.cancelled.load(Ordering::SeqCst));
        let mut i = 0;
        while i < self.timers.len() {
            let timer = &mut self.timers[i];
            if timer.due > now {
                i += 1;
                continue;
            }
            let again = (timer.callback)();
            count += 1;
            if again && !timer.cancelled.load(Ordering::SeqCst) {
                timer.due = now + timer.interval;
                i += 1;
            } else {
                self.timers.remove(i);
            }
        }
        if count > 0 {
            log::trace!("dispatched {} callbacks", count);
        }
        Ok(count)
    }

    /// The time the next timer is due, if any.
    pub fn next_timeout(&self) -> Option<Instant> {
        self.timers
            .iter()
            .filter(|t| !t.cancelled.load(Ordering::SeqCst))
            .map(|t| t.due)
            .min()
    }

    /// Creates a widget on the active toolkit.
    pub fn create_widget(&self, kind: WidgetKind) -> Result<Widget> {
        Widget::new(self.toolkit(), kind)
    }

    /// Creates a text layout in the configured font and ellipsis.
    pub fn create_text_layout(&self) -> TextLayout {
        let mut layout = self.toolkit.create_text_layout();
        layout.set_font(self.config.font.to_font());
        layout.set_ellipsis(&self.config.ellipsis);
        layout
    }

    /// Creates a drawing context that renders into an offscreen bitmap.
    pub fn create_image_context(&self, width: u32, height: u32) -> Result<DrawingContext> {
        self.toolkit.create_image_context(width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::cell::Cell;
    use std::rc::Rc;
    use weft_core::ToolkitType;

    fn app(toolkit: ToolkitType) -> Application {
        crate::logging::init_for_tests();
        let config = AppConfig {
            toolkit: Some(toolkit),
            ..AppConfig::default()
        };
        Application::new(config, &ToolkitRegistry::headless()).unwrap()
    }

    #[test]
    fn invokes_in_order_on_dispatch() {
        let mut app = app(ToolkitType::Gtk);
        let log = Arc::new(Mutex::new(Vec::new()));
        let invoker = app.invoker();
        for i in 0..3 {
            let log = Arc::clone(&log);
            invoker.invoke(move || log.lock().push(i)).unwrap();
        }
        assert!(log.lock().is_empty());
        assert_eq!(app.dispatch_pending().unwrap(), 3);
        assert_eq!(*log.lock(), vec![0, 1, 2]);
        assert_eq!(app.dispatch_pending().unwrap(), 0);
    }

    #[test]
    fn async_invocations_reply_across_threads() {
        let mut app = app(ToolkitType::Cocoa);
        let invoker = app.invoker();
        let worker = thread::spawn(move || invoker.invoke_async(|| 6 * 7).unwrap().wait());

        let deadline = Instant::now() + Duration::from_secs(5);
        while app.dispatch_pending().unwrap() == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(worker.join().unwrap(), Ok(42));

        let reply = app.invoker().invoke_async(|| "later").unwrap();
        assert_eq!(reply.try_get(), Ok(None));
        app.dispatch_pending().unwrap();
        assert_eq!(reply.wait_timeout(Duration::from_millis(10)), Ok(Some("later")));
    }

    #[test]
    fn invoking_after_the_application_is_gone_fails() {
        let app = app(ToolkitType::WinForms);
        let invoker = app.invoker();
        let reply = invoker.invoke_async(|| ()).unwrap();
        drop(app);
        assert_eq!(invoker.invoke(|| ()), Err(Error::Disconnected));
        // the queued callback goes away with the last sender
        drop(invoker);
        assert_eq!(reply.wait(), Err(Error::Disconnected));
    }

    #[test]
    fn timers_repeat_until_they_return_false() {
        let mut app = app(ToolkitType::Gtk);
        let start = Instant::now();
        let runs = Rc::new(Cell::new(0));
        let counter = Rc::clone(&runs);
        app.timeout_invoke_at(start, Duration::from_millis(10), move || {
            counter.set(counter.get() + 1);
            counter.get() < 2
        });

        assert_eq!(app.dispatch_pending_at(start).unwrap(), 0);
        assert_eq!(app.next_timeout(), Some(start + Duration::from_millis(10)));
        let t1 = start + Duration::from_millis(10);
        assert_eq!(app.dispatch_pending_at(t1).unwrap(), 1);
        assert_eq!(app.dispatch_pending_at(t1 + Duration::from_millis(5)).unwrap(), 0);
        assert_eq!(app.dispatch_pending_at(t1 + Duration::from_millis(10)).unwrap(), 1);
        assert_eq!(runs.get(), 2);
        assert_eq!(app.next_timeout(), None);
    }

    #[test]
    fn cancelled_timers_do_not_run_again() {
        let mut app = app(ToolkitType::Gtk);
        let start = Instant::now();
        let runs = Rc::new(Cell::new(0));
        let counter = Rc::clone(&runs);
        let handle = Rc::new(Cell::new(None::<TimerHandle>));
        let own_handle = Rc::clone(&handle);
        let timer = app.timeout_invoke_at(start, Duration::from_millis(1), move || {
            counter.set(counter.get() + 1);
            // cancelling from inside the callback lets the current run finish
            if let Some(handle) = own_handle.take() {
                handle.cancel();
            }
            true
        });
        handle.set(Some(timer.clone()));

        let t = start + Duration::from_millis(1);
        assert_eq!(app.dispatch_pending_at(t).unwrap(), 1);
        assert!(timer.is_cancelled());
        assert_eq!(app.dispatch_pending_at(t + Duration::from_secs(1)).unwrap(), 0);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn dispatch_is_limited_to_the_ui_thread() {
        let mut app = app(ToolkitType::Gtk);
        app.ui_thread = thread::spawn(|| thread::current().id()).join().unwrap();
        assert!(!app.is_ui_thread());
        assert_eq!(app.dispatch_pending(), Err(Error::WrongThread));
    }

    #[test]
    fn text_layouts_use_the_configured_font() {
        let mut config = AppConfig {
            toolkit: Some(ToolkitType::WinForms),
            ellipsis: "...".to_string(),
            ..AppConfig::default()
        };
        config.font.size = 20.;
        let app = Application::new(config, &ToolkitRegistry::headless()).unwrap();
        let layout = app.create_text_layout();
        assert_eq!(layout.font().size, 20.);
        assert_eq!(layout.ellipsis(), "...");
        assert_eq!(app.toolkit().toolkit_type(), ToolkitType::WinForms);
    }
}
