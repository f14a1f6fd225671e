//! A slow consumer never sees more than the pipe capacity buffered.

use std::thread;
use std::time::Duration;

use crate::e2e_tests::helpers::*;
use crate::graph::Term;
use crate::query::Domain;
use crate::query::pipe::pipe;

#[test]
fn test_pipe_buffer_bounded_by_capacity() {
    let capacity = 3;
    let (tx, mut rx) = pipe(capacity);

    let producer = thread::spawn(move || {
        for i in 0..50 {
            tx.put(Domain::from_slots(vec![Some(Term::integer(i))]))
                .expect("Consumer should be alive");
        }
        tx.close();
    });

    let mut received = 0;
    loop {
        thread::sleep(Duration::from_millis(2));
        // The sentinel occupies one slot too.
        assert!(rx.buffered() <= capacity);
        if !rx.has_next().expect("Pipe should not fail") {
            break;
        }
        rx.get().expect("Item should be available");
        received += 1;
    }

    producer.join().expect("Producer should finish");
    assert_eq!(received, 50);
}

#[test]
fn test_slow_consumer_sees_every_result() {
    let engine = engine_with_capacity(1);
    let text = (0..30)
        .map(|i| format!("s{i} p o{i}; o{i} q t{i}"))
        .collect::<Vec<_>>()
        .join("; ");
    let mut results = engine
        .execute_bindings(&query("?s p ?o; ?o q ?t"), graph_with(&text), &[var("s")])
        .expect("Query should start");

    let mut count = 0;
    while results.has_next().expect("Query should not fail") {
        thread::sleep(Duration::from_millis(1));
        assert!(results.next().is_some());
        count += 1;
    }
    assert_eq!(count, 30);
}
