use dmamem_sync::WriteOnce;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn empty_until_set() {
    let cell = WriteOnce::<u64>::new();
    assert!(cell.get().is_none());
    assert!(!cell.is_set());

    assert_eq!(cell.set(0x2000_0000), Ok(&0x2000_0000));
    assert_eq!(cell.get(), Some(&0x2000_0000));
    assert!(cell.is_set());
}

#[test]
fn second_set_hands_value_back() {
    let cell = WriteOnce::new();
    cell.set(1u32).unwrap();
    assert_eq!(cell.set(2), Err(2));
    assert_eq!(cell.get(), Some(&1));
}

#[test]
fn take_resets_and_allows_a_fresh_write() {
    let mut cell = WriteOnce::new();
    cell.set(String::from("first")).unwrap();
    assert_eq!(cell.take().as_deref(), Some("first"));
    assert!(cell.get().is_none());
    assert_eq!(cell.take(), None);

    cell.set(String::from("second")).unwrap();
    assert_eq!(cell.get().map(String::as_str), Some("second"));
}

#[test]
fn drop_releases_the_value() {
    struct Counted(Arc<AtomicUsize>);
    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let drops = Arc::new(AtomicUsize::new(0));
    {
        let cell = WriteOnce::new();
        assert!(cell.set(Counted(Arc::clone(&drops))).is_ok());
    }
    assert_eq!(drops.load(Ordering::SeqCst), 1);

    {
        let _empty: WriteOnce<Counted> = WriteOnce::new();
    }
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn exactly_one_concurrent_writer_wins() {
    let threads = 8;
    let cell = Arc::new(WriteOnce::new());
    let start = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let cell = Arc::clone(&cell);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                cell.set(i).is_ok()
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|won| *won)
        .count();
    assert_eq!(winners, 1);
    assert!(cell.get().is_some());
}
