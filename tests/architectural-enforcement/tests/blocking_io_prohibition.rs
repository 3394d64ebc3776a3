//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Network I/O in the interaction crates MUST be async. The
//! stream transport runs on the tokio runtime; a blocking client there
//! stalls every other session and the Ctrl-C handler.
//! **Required**: `reqwest::Client`, `tokio::net`, not `reqwest::blocking`
//! or `std::net`.

use architectural_enforcement::find_violations;

const FORBIDDEN: &[&str] = &[
    "reqwest::blocking",
    "std::net::TcpStream",
    "std::net::TcpListener",
    "std::net::UdpSocket",
];

fn is_blocking_network_io(code: &str) -> bool {
    FORBIDDEN.iter().any(|pattern| code.contains(pattern))
}

/// Test that production code does not use blocking network I/O
#[test]
fn test_no_blocking_network_io_in_production_code() {
    let violations = find_violations(is_blocking_network_io);

    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: Blocking network I/O found in production code!\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }

        eprintln!("\n❌ FORBIDDEN blocking I/O:");
        for pattern in FORBIDDEN {
            eprintln!("  - {pattern}");
        }
        eprintln!("\n✅ REQUIRED async I/O:");
        eprintln!("  - reqwest::Client with bytes_stream()");
        eprintln!("  - tokio::net::TcpStream::connect().await");

        panic!(
            "\nFound {} blocking I/O violation(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}

#[test]
fn test_blocking_io_detection() {
    assert!(is_blocking_network_io("let c = reqwest::blocking::Client::new();"));
    assert!(is_blocking_network_io("use std::net::TcpStream;"));
    assert!(!is_blocking_network_io("let c = reqwest::Client::new();"));
}
