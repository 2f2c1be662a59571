use super::*;

#[test]
fn parses_simple_commands() {
    assert_eq!(parse_command("scan"), Ok(Some(Command::Scan)));
    assert_eq!(parse_command("  PRINT "), Ok(Some(Command::Print)));
    assert_eq!(parse_command("logout"), Ok(Some(Command::Logout)));
    assert_eq!(parse_command("health"), Ok(Some(Command::Health)));
    assert_eq!(parse_command("?"), Ok(Some(Command::Help)));
    assert_eq!(parse_command("exit"), Ok(Some(Command::Quit)));
}

#[test]
fn tap_uppercases_uid() {
    assert_eq!(
        parse_command("tap a1b2c3d4"),
        Ok(Some(Command::Tap(Uid::from("A1B2C3D4"))))
    );
}

#[test]
fn blank_line_is_not_a_command() {
    assert_eq!(parse_command("   "), Ok(None));
}

#[test]
fn rejects_malformed_input() {
    assert!(parse_command("tap").is_err());
    assert!(parse_command("scan now").is_err());
    assert!(parse_command("withdraw 500").is_err());
}

#[tokio::test]
async fn quit_stops_the_loop_and_logout_keeps_it() {
    let backend = Arc::new(MockBackend::new().expect("mock backend"));
    let mut session = AtmSession::new(backend);

    assert!(run_command(&mut session, Command::Tap(Uid::from("A1B2C3D4"))).await);
    assert!(session.current_account().is_some());
    assert!(run_command(&mut session, Command::Logout).await);
    assert!(session.current_account().is_none());
    assert!(!run_command(&mut session, Command::Quit).await);
}
