//! A failed parse must not leave anything allocated behind.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

use rondo_cmd::CmdTable;

/// Tracks bytes live per thread so parallel tests do not interfere
struct CountingAlloc;

thread_local! {
    static LIVE: Cell<isize> = const { Cell::new(0) };
}

fn adjust(delta: isize) {
    // Ignore accesses during thread teardown
    let _ = LIVE.try_with(|live| live.set(live.get() + delta));
}

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            adjust(layout.size() as isize);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        adjust(-(layout.size() as isize));
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new = System.realloc(ptr, layout, new_size);
        if !new.is_null() {
            adjust(new_size as isize - layout.size() as isize);
        }
        new
    }
}

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

fn live() -> isize {
    LIVE.with(|live| live.get())
}

fn argv(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Bytes still live after running `parse` and dropping its result
fn leaked_by(name: &str, args: &[String]) -> (isize, bool) {
    let table = CmdTable::new();
    let entry = table.lookup(name).unwrap();

    let before = live();
    let failed = (entry.parse)(args).is_err();
    (live() - before, failed)
}

#[test]
fn test_failed_parses_leak_nothing() {
    let cases: &[(&str, &[&str])] = &[
        ("swap-window", &["main", "0", "1"]),
        ("swap-window", &["-x", "main", "0"]),
        ("swap-window", &["-i", "bad", "main", "0"]),
        ("swap-window", &["-i", "1", "main", "99999999999"]),
        ("link-window", &["-dk", "-i"]),
        ("new-window", &["-n", "logs", "-i", "-4"]),
        ("new-session", &["-s", "work", "-n", "vim", "extra"]),
        ("rename-window", &["-i", "2", "a", "b"]),
        ("rename-session", &[]),
        ("select-window", &["nope"]),
        ("kill-server", &["now"]),
    ];

    for (name, words) in cases {
        let args = argv(words);
        let (leaked, failed) = leaked_by(name, &args);
        assert!(failed, "{} {:?} should fail", name, words);
        assert_eq!(leaked, 0, "{} {:?} leaked {} bytes", name, words, leaked);
    }
}

#[test]
fn test_successful_parse_is_released_on_drop() {
    let args = argv(&["-d", "-i", "3", "a-rather-long-session-name", "1"]);
    let (leaked, failed) = leaked_by("swap-window", &args);

    assert!(!failed);
    assert_eq!(leaked, 0);
}

