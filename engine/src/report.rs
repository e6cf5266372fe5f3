//! Structured reporting of query statistics and timings.
//!
//! Values are reported within nested contexts, managed through RAII guards,
//! and the whole report is printed as a single JSON object to stdout when the `ReportingGuard` is dropped.
//! Reporting is thread local and disabled by default, so library code may report unconditionally.
//! Without an active reporter on the current thread everything is a no-op.

use crate::built_info;
use serde_json::{Map, Value};
use std::{cell::RefCell, mem::replace};

pub use serde_json::json;

#[derive(Debug)]
enum ContextStackItem {
    Key(String),
    Collection(Vec<Value>),
    Object(Map<String, Value>),
}

#[derive(Debug)]
enum CurrentReportingContext {
    Collection(Vec<Value>),
    Object(Map<String, Value>),
}

#[derive(Debug)]
pub struct Reporter {
    current: CurrentReportingContext,
    context_stack: Vec<ContextStackItem>,
}

impl Default for Reporter {
    fn default() -> Self {
        Reporter {
            current: CurrentReportingContext::Object(Map::new()),
            context_stack: Vec::new(),
        }
    }
}

impl Reporter {
    fn take_current(&mut self, next: CurrentReportingContext) -> CurrentReportingContext {
        replace(&mut self.current, next)
    }

    fn create_object_under_key(&mut self, key: String) {
        self.create_under_key(key, CurrentReportingContext::Object(Map::new()))
    }

    fn create_collection_under_key(&mut self, key: String) {
        self.create_under_key(key, CurrentReportingContext::Collection(Vec::new()))
    }

    fn create_under_key(&mut self, key: String, child: CurrentReportingContext) {
        match self.take_current(child) {
            CurrentReportingContext::Object(object) => {
                self.context_stack.push(ContextStackItem::Object(object));
                self.context_stack.push(ContextStackItem::Key(key));
            }
            CurrentReportingContext::Collection(_) => panic!("Cannot create context at key in collection"),
        }
    }

    fn create_collection_item(&mut self) {
        match self.take_current(CurrentReportingContext::Object(Map::new())) {
            CurrentReportingContext::Collection(collection) => self.context_stack.push(ContextStackItem::Collection(collection)),
            CurrentReportingContext::Object(_) => panic!("Cannot create collection item in object"),
        }
    }

    fn report(&mut self, key: String, val: Value) {
        match &mut self.current {
            CurrentReportingContext::Object(object) => {
                let prev = object.insert(key, val);
                if !cfg!(feature = "report-allow-override") {
                    assert!(prev.is_none());
                }
            }
            CurrentReportingContext::Collection(_) => panic!("Cannot report value on collection"),
        }
    }

    fn pop_context(&mut self) {
        let finished = match self.take_current(CurrentReportingContext::Object(Map::new())) {
            CurrentReportingContext::Object(object) => Value::Object(object),
            CurrentReportingContext::Collection(collection) => Value::Array(collection),
        };

        match self.context_stack.pop().expect("tried to pop from empty context") {
            ContextStackItem::Key(key) => {
                if let Some(ContextStackItem::Object(mut parent)) = self.context_stack.pop() {
                    assert_eq!(parent.insert(key, finished), None);
                    self.current = CurrentReportingContext::Object(parent);
                } else {
                    panic!("Inconsistent context stack");
                }
            }
            ContextStackItem::Collection(mut collection) => {
                assert!(finished.is_object(), "Cannot insert collection into collection");
                collection.push(finished);
                self.current = CurrentReportingContext::Collection(collection);
            }
            ContextStackItem::Object(_) => panic!("Inconsistent context stack"),
        }
    }
}

thread_local! {
    static REPORTER: RefCell<Option<Reporter>> = RefCell::new(None);
}

fn with_reporter(f: impl FnOnce(&mut Reporter)) {
    REPORTER.with(|reporter| {
        if let Some(r) = reporter.borrow_mut().as_mut() {
            f(r)
        }
    });
}

#[must_use]
pub struct ContextGuard(());

impl Drop for ContextGuard {
    fn drop(&mut self) {
        with_reporter(Reporter::pop_context);
    }
}

/// Report everything until the guard is dropped into a nested object under `key`.
pub fn push_context(key: String) -> ContextGuard {
    with_reporter(|r| r.create_object_under_key(key));
    ContextGuard(())
}

#[must_use]
pub struct CollectionContextGuard(());

impl Drop for CollectionContextGuard {
    fn drop(&mut self) {
        with_reporter(Reporter::pop_context);
    }
}

/// Open a JSON array under `key`. Items are added through `push_collection_item`.
pub fn push_collection_context(key: String) -> CollectionContextGuard {
    with_reporter(|r| r.create_collection_under_key(key));
    CollectionContextGuard(())
}

impl CollectionContextGuard {
    pub fn push_collection_item(&mut self) -> CollectionItemContextGuard {
        with_reporter(Reporter::create_collection_item);
        CollectionItemContextGuard(self)
    }
}

#[must_use]
pub struct CollectionItemContextGuard<'a>(&'a CollectionContextGuard);

impl<'a> Drop for CollectionItemContextGuard<'a> {
    fn drop(&mut self) {
        with_reporter(Reporter::pop_context);
    }
}

pub fn report(key: String, val: Value) {
    if cfg!(feature = "report-to-stderr") {
        eprintln!("{}: {}", key, val);
    }
    report_silent(key, val)
}

pub fn report_silent(key: String, val: Value) {
    with_reporter(|r| r.report(key, val));
}

#[must_use]
pub struct ReportingGuard(());

impl Drop for ReportingGuard {
    fn drop(&mut self) {
        REPORTER.with(|reporter| {
            if let Some(mut r) = reporter.borrow_mut().take() {
                assert!(r.context_stack.is_empty());
                match r.take_current(CurrentReportingContext::Object(Map::new())) {
                    CurrentReportingContext::Object(object) => println!("{}", Value::Object(object)),
                    CurrentReportingContext::Collection(_) => panic!("broken root object for reporting"),
                }
            }
        });
    }
}

#[macro_export]
macro_rules! report {
    ($k:expr, $($json:tt)+) => { $crate::report::report($k.to_string(), $crate::report::json!($($json)+)) };
}

#[macro_export]
macro_rules! report_silent {
    ($k:expr, $($json:tt)+) => { $crate::report::report_silent($k.to_string(), $crate::report::json!($($json)+)) };
}

/// Activate reporting on the current thread.
/// The collected report is printed once the returned guard goes out of scope.
pub fn enable_reporting(program: &str) -> ReportingGuard {
    REPORTER.with(|reporter| reporter.replace(Some(Reporter::default())));

    report!("crate_version", built_info::PKG_VERSION);
    report!("build_target", built_info::TARGET);
    report!("build_profile", built_info::PROFILE);
    report!("feature_flags", built_info::FEATURES_STR);
    report!("build_with_rustc", built_info::RUSTC_VERSION);

    if let Ok(hostname) = std::process::Command::new("hostname").output() {
        report!("hostname", String::from_utf8_lossy(&hostname.stdout).trim());
    }

    report!("program", program);
    report!("start_time", format!("{}", time::now_utc().rfc822()));
    report!("args", std::env::args().collect::<Vec<String>>());

    ReportingGuard(())
}

pub mod benchmark;
pub use benchmark::*;
