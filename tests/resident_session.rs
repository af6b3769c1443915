//! Tests for resident session selection
//!
//! The resident session is the one key that stands for a gateway's agent.

use lobster_room::data::Session;
use lobster_room::status::resident::pick_resident_session;

fn session(key: &str, kind: Option<&str>, updated_at: i64) -> Session {
    Session::new(key, kind, Some(updated_at))
}

mod priority {
    use super::*;

    #[test]
    fn main_key_beats_more_recent_cron() {
        let sessions = vec![
            session("agent:main:main", None, 1),
            session("agent:cron:x", Some("cron"), 999),
        ];
        assert_eq!(pick_resident_session(&sessions), Some("agent:main:main"));
    }

    #[test]
    fn non_cron_beats_more_recent_cron() {
        let sessions = vec![session("a", Some("cron"), 100), session("b", None, 50)];
        assert_eq!(pick_resident_session(&sessions), Some("b"));
    }

    #[test]
    fn cron_only_falls_back_to_cron() {
        let sessions = vec![session("a", Some("cron"), 100)];
        assert_eq!(pick_resident_session(&sessions), Some("a"));
    }

    #[test]
    fn most_recent_non_cron_wins() {
        let sessions = vec![
            session("agent:main:discord", Some("group"), 300),
            session("agent:main:slack", Some("group"), 700),
            session("agent:cron:nightly", Some("cron"), 900),
        ];
        assert_eq!(pick_resident_session(&sessions), Some("agent:main:slack"));
    }

    #[test]
    fn non_cron_without_timestamp_falls_back_to_cron() {
        let sessions = vec![
            Session::new("a", None, None),
            session("b", Some("cron"), 10),
        ];
        assert_eq!(pick_resident_session(&sessions), Some("b"));
    }
}

mod determinism {
    use super::*;

    fn fleet() -> Vec<Session> {
        vec![
            session("agent:main:discord", None, 300),
            session("agent:main:slack", None, 700),
            session("agent:cron:nightly", Some("cron"), 900),
            session("agent:sub:1", None, 650),
        ]
    }

    #[test]
    fn same_input_same_key() {
        let sessions = fleet();
        let first = pick_resident_session(&sessions);
        for _ in 0..10 {
            assert_eq!(pick_resident_session(&sessions), first);
        }
    }

    #[test]
    fn input_order_does_not_matter() {
        let mut sessions = fleet();
        let expected = pick_resident_session(&sessions).map(String::from);

        for rotation in 0..sessions.len() {
            sessions.rotate_left(1);
            assert_eq!(
                pick_resident_session(&sessions).map(String::from),
                expected,
                "rotation {rotation}"
            );
        }
        sessions.reverse();
        assert_eq!(pick_resident_session(&sessions).map(String::from), expected);
    }
}
