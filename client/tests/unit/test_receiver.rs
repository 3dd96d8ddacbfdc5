//! Progress relay tests

use deployctl::deploy::receiver::relay_progress;
use deployctl::errors::ClientError;

use crate::mocks::ScriptedSource;

#[tokio::test]
async fn test_relay_writes_each_message_verbatim() {
    let out = tokio_test::io::Builder::new()
        .write(b"Building...\n")
        .write(b"step 1/2")
        .write(b"\x1b[32mdone\x1b[0m\n")
        .build();
    let source = ScriptedSource::new(&["Building...\n", "step 1/2", "\x1b[32mdone\x1b[0m\n"]);

    let relayed = relay_progress(Box::new(source), out).await.unwrap();

    assert_eq!(relayed, 3);
}

#[tokio::test]
async fn test_relay_nothing_when_closed_immediately() {
    let mut out = Vec::new();

    let relayed = relay_progress(Box::new(ScriptedSource::new(&[])), &mut out).await.unwrap();

    assert_eq!(relayed, 0);
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_relay_keeps_output_before_error() {
    let mut out = Vec::new();
    let source = ScriptedSource::new(&["one\n", "two\n"])
        .then_fail(ClientError::Transport("connection reset".to_string()));

    let result = relay_progress(Box::new(source), &mut out).await;

    assert!(matches!(result, Err(ClientError::Transport(_))));
    assert_eq!(out, b"one\ntwo\n");
}

#[tokio::test]
async fn test_relay_output_error() {
    let out = tokio_test::io::Builder::new()
        .write_error(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        .build();

    let result = relay_progress(Box::new(ScriptedSource::new(&["hello"])), out).await;

    assert!(matches!(result, Err(ClientError::IoError(_))));
}
