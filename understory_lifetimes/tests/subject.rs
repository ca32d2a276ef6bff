// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for `Subject` and `Property` delivery when observers change the
//! subscriber list, or send, from inside a callback.

use std::cell::RefCell;
use std::rc::Rc;

use understory_lifetimes::{Notification, Property, Source, Subject, Subscription};

type Log = Rc<RefCell<Vec<(&'static str, u32)>>>;

fn logger(log: &Log, name: &'static str) -> impl FnMut(Notification<u32, ()>) + 'static {
    let log = log.clone();
    move |n: Notification<u32, ()>| {
        if let Notification::Value(v) = n {
            log.borrow_mut().push((name, v));
        }
    }
}

#[test]
fn subscriber_added_mid_dispatch_sees_only_later_values() {
    let subject = Subject::<u32, ()>::new();
    let log: Log = Rc::default();
    let held: Rc<RefCell<Vec<Subscription>>> = Rc::default();

    let inner = subject.clone();
    let inner_log = log.clone();
    let keep = held.clone();
    let mut record = logger(&log, "outer");
    let _outer = subject.subscribe(move |n: Notification<u32, ()>| {
        if n == Notification::Value(1) {
            let late = inner.subscribe(logger(&inner_log, "late"));
            keep.borrow_mut().push(late);
        }
        record(n);
    });

    subject.emit(1).unwrap();
    subject.emit(2).unwrap();

    assert_eq!(
        *log.borrow(),
        [("outer", 1), ("outer", 2), ("late", 2)]
    );
}

#[test]
fn subscriber_removed_mid_dispatch_receives_nothing_more() {
    let subject = Subject::<u32, ()>::new();
    let log: Log = Rc::default();
    let victim: Rc<RefCell<Option<Subscription>>> = Rc::default();

    let target = victim.clone();
    let mut record = logger(&log, "first");
    let _first = subject.subscribe(move |n: Notification<u32, ()>| {
        record(n);
        let subscription = target.borrow_mut().take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }
    });
    *victim.borrow_mut() = Some(subject.subscribe(logger(&log, "second")));

    subject.emit(1).unwrap();
    subject.emit(2).unwrap();

    assert_eq!(*log.borrow(), [("first", 1), ("first", 2)]);
    assert_eq!(subject.subscriber_count(), 1);
}

#[test]
fn set_during_replay_is_delivered_after_it() {
    let property = Property::<u32, ()>::with_value(1);
    let log: Log = Rc::default();

    let echo = property.clone();
    let mut record = logger(&log, "observer");
    let _subscription = property.subscribe(move |n: Notification<u32, ()>| {
        let bump = n == Notification::Value(1);
        record(n);
        if bump {
            echo.set(2).unwrap();
        }
    });

    assert_eq!(*log.borrow(), [("observer", 1), ("observer", 2)]);
    assert_eq!(property.current(), Some(2));
}

#[test]
fn errors_do_not_change_the_current_value() {
    let property = Property::<u32, &str>::with_value(5);
    let seen = Rc::new(RefCell::new(Vec::new()));

    let sink = seen.clone();
    let _subscription =
        property.subscribe(move |n: Notification<u32, &'static str>| sink.borrow_mut().push(n));
    property.error("flaky").unwrap();

    assert_eq!(
        *seen.borrow(),
        [Notification::Value(5), Notification::Error("flaky")]
    );
    assert_eq!(property.current(), Some(5));
}

#[test]
fn handles_share_one_stream() {
    let subject = Subject::<u32, ()>::default();
    let other = subject.clone();
    let log: Log = Rc::default();
    let _subscription = subject.subscribe(logger(&log, "s"));

    other.emit(3).unwrap();
    other.end().unwrap();

    assert!(subject.is_ended());
    assert_eq!(*log.borrow(), [("s", 3)]);
}

#[test]
fn subscriber_added_during_end_still_sees_the_end() {
    let property = Property::<u32, ()>::with_value(4);
    let seen = Rc::new(RefCell::new(Vec::new()));

    let late = property.clone();
    let sink = seen.clone();
    let _first = property.subscribe(move |n: Notification<u32, ()>| {
        if n.is_end() {
            let sink = sink.clone();
            late.subscribe(move |n: Notification<u32, ()>| sink.borrow_mut().push(n))
                .detach();
        }
    });
    property.end().unwrap();

    assert_eq!(
        *seen.borrow(),
        [Notification::Value(4), Notification::End]
    );
    assert_eq!(property.subscriber_count(), 0);
}
