use staff_chat::{is_system_notice, ChatLine, ChatSession, ConnectionState};

#[test]
fn test_parse_author_and_body() {
    let line = ChatLine::parse("Alice: hi there");

    assert_eq!(line.raw, "Alice: hi there");
    assert_eq!(line.author.as_deref(), Some("Alice"));
    assert_eq!(line.body, "hi there");
    assert!(!line.system);
}

#[test]
fn test_parse_splits_on_first_colon_only() {
    let line = ChatLine::parse("Jon: mahaia 4: bi kafe");

    assert_eq!(line.author.as_deref(), Some("Jon"));
    assert_eq!(line.body, "mahaia 4: bi kafe");
}

#[test]
fn test_parse_without_colon_is_all_body() {
    let line = ChatLine::parse("just some text");

    assert_eq!(line.author, None);
    assert_eq!(line.body, "just some text");
}

#[test]
fn test_parse_leading_colon_has_no_author() {
    let line = ChatLine::parse(": odd");

    assert_eq!(line.author, None);
    assert_eq!(line.body, ": odd");
}

#[test]
fn test_parse_blank_author_and_body() {
    let line = ChatLine::parse("   : hello");
    assert_eq!(line.author, None);
    assert_eq!(line.body, "hello");

    // Empty body falls back to the raw line
    let line = ChatLine::parse("Alice:   ");
    assert_eq!(line.author.as_deref(), Some("Alice"));
    assert_eq!(line.body, "Alice:   ");
}

#[test]
fn test_is_own_is_case_sensitive() {
    let line = ChatLine::parse("Alice: hi");

    assert!(line.is_own("Alice"));
    assert!(!line.is_own("alice"));
    assert!(!ChatLine::parse("no author").is_own("Alice"));
}

#[test]
fn test_system_notice_classification() {
    assert!(is_system_notice("Mikel sartu da"));
    assert!(is_system_notice("Ane atera egin da"));
    assert!(is_system_notice("MIKEL SARTU DA"));
    assert!(is_system_notice("*** bob joined the chat"));
    assert!(is_system_notice("*** alice left the chat"));

    assert!(!is_system_notice("Alice: hi"));
    assert!(!is_system_notice("Jon: I left my keys in the kitchen"));
    assert!(ChatLine::parse("Mikel sartu da").system);
}

#[test]
fn test_session_lines_keep_order() {
    let session = ChatSession {
        messages: vec![
            "Alice: one".to_string(),
            "Bob sartu da".to_string(),
            "Bob: two".to_string(),
        ],
        ..ChatSession::default()
    };

    let lines = session.lines();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0].body, "one");
    assert!(lines[1].system);
    assert_eq!(lines[2].author.as_deref(), Some("Bob"));
}

#[test]
fn test_session_serializes_to_json() {
    let session = ChatSession {
        messages: vec!["Alice: hi".to_string()],
        unread_count: 1,
        user_name: "Alice".to_string(),
        ..ChatSession::default()
    };

    let json: serde_json::Value = serde_json::from_str(&session.to_json().unwrap()).unwrap();
    assert_eq!(json["state"], "Disconnected");
    assert_eq!(json["messages"][0], "Alice: hi");
    assert_eq!(json["unread_count"], 1);
    assert_eq!(json["user_name"], "Alice");
    assert_eq!(json["last_error"], serde_json::Value::Null);
}

#[test]
fn test_session_state_helpers() {
    let mut session = ChatSession::default();
    assert!(!session.is_connecting());
    assert!(!session.is_connected());
    assert_eq!(session.status(), "Disconnected");

    session.state = ConnectionState::Connecting;
    assert!(session.is_connecting());
    assert!(!session.is_connected());
    assert_eq!(session.status(), "Connecting...");

    session.state = ConnectionState::Connected;
    assert!(!session.is_connecting());
    assert!(session.is_connected());
    assert_eq!(session.status(), "Connected");
}
