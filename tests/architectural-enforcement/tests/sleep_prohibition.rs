//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code in the interaction crates MUST NOT call sleep.
//! Gesture timers fire from explicit deadlines (`advance`, `sleep_until` on
//! the next deadline) and stream sessions wait on I/O or cancellation.
//! **Exceptions**: test code

use architectural_enforcement::find_violations;

fn is_sleep_call(code: &str) -> bool {
    code.contains("::sleep(") || code.contains(".sleep(")
}

/// Test that production code does not contain sleep() calls
#[test]
fn test_no_sleep_in_production_code() {
    let violations = find_violations(is_sleep_call);

    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: Sleep calls found in production code!\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }

        eprintln!("\n✅ ACCEPTABLE waits:");
        eprintln!("  - tokio::time::sleep_until(next_deadline) in the gesture driver");
        eprintln!("  - Awaiting the response body or the cancel notification");
        eprintln!("\n❌ FORBIDDEN:");
        eprintln!("  - Sleep in polling loops");
        eprintln!("  - Sleep as poor man's synchronization");

        panic!(
            "\nFound {} sleep violation(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}

#[test]
fn test_sleep_detection() {
    assert!(is_sleep_call("std::thread::sleep(Duration::from_millis(5));"));
    assert!(is_sleep_call("tokio::time::sleep(d).await"));
    assert!(!is_sleep_call("tokio::time::sleep_until(deadline).await"));
}
