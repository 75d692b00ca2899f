//! Integration tests for room actors and the session registry.

use std::time::Duration;

use nightfall_game::{GameConfig, Phase, Role, ServerEvent, SessionState};
use nightfall_protocol::{PlayerId, RoomCode};
use nightfall_room::{RoomConfig, RoomError, RoomIntent, SessionRegistry};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

type Inbox = mpsc::UnboundedReceiver<ServerEvent>;

fn pid(id: u64) -> PlayerId {
    PlayerId(id)
}

fn code(s: &str) -> RoomCode {
    RoomCode::new(s)
}

fn registry() -> SessionRegistry {
    SessionRegistry::new(RoomConfig::default()).with_seed(42)
}

async fn join(reg: &mut SessionRegistry, room: &str, id: u64, name: &str) -> Inbox {
    let (tx, rx) = mpsc::unbounded_channel();
    reg.join(code(room), pid(id), name, tx)
        .await
        .expect("join should succeed");
    rx
}

/// Seats `n` players named p1..pn in `room`.
async fn table(reg: &mut SessionRegistry, room: &str, n: u64) -> Vec<Inbox> {
    let mut inboxes = Vec::new();
    for i in 1..=n {
        inboxes.push(join(reg, room, i, &format!("p{i}")).await);
    }
    inboxes
}

/// Waits until the room has processed everything sent so far.
async fn settle(reg: &SessionRegistry, room: &str) {
    reg.room_info(&code(room)).await.expect("room should answer");
}

fn drain(inbox: &mut Inbox) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = inbox.try_recv() {
        events.push(event);
    }
    events
}

fn role_of(events: &[ServerEvent]) -> Option<Role> {
    events.iter().find_map(|e| match e {
        ServerEvent::RoleAssigned { role, .. } => Some(*role),
        _ => None,
    })
}

async fn start(reg: &SessionRegistry, room: &str) {
    reg.route(pid(1), &code(room), RoomIntent::Start(GameConfig::default()))
        .await
        .unwrap();
    settle(reg, room).await;
}

// =========================================================================
// Registry
// =========================================================================

#[tokio::test]
async fn test_first_join_creates_room() {
    let mut reg = registry();
    assert_eq!(reg.room_count(), 0);

    let mut inbox = join(&mut reg, "ABCD", 1, "Alice").await;
    assert_eq!(reg.room_count(), 1);
    assert_eq!(reg.player_room(pid(1)), Some(&code("ABCD")));

    let events = drain(&mut inbox);
    assert!(matches!(events[0], ServerEvent::PlayerJoined { ref players } if players.len() == 1));
    match &events[1] {
        ServerEvent::PlayerList { room_code, you, players } => {
            assert_eq!(room_code, &code("ABCD"));
            assert_eq!(*you, pid(1));
            assert!(players[0].is_host);
        }
        other => panic!("expected player_list, got {other:?}"),
    }
}

#[tokio::test]
async fn test_one_room_per_player() {
    let mut reg = registry();
    let _a = join(&mut reg, "A", 1, "Alice").await;

    let (tx, _rx) = mpsc::unbounded_channel();
    let result = reg.join(code("B"), pid(1), "Alice", tx).await;
    assert!(matches!(result, Err(RoomError::AlreadyInRoom(_, ref room)) if *room == code("A")));
    assert_eq!(reg.room_count(), 1, "failed join must not leave a room behind");
}

#[tokio::test]
async fn test_rejoin_by_name_rebinds_identity() {
    let mut reg = registry();
    let mut inboxes = table(&mut reg, "R", 3).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let seat = reg.join(code("R"), pid(10), "P2", tx).await.unwrap();
    assert_eq!(seat.rebound_from, Some(pid(2)));
    assert_eq!(seat.player.name, "p2");

    assert_eq!(reg.player_room(pid(2)), None);
    assert_eq!(reg.player_room(pid(10)), Some(&code("R")));
    let info = reg.room_info(&code("R")).await.unwrap();
    assert_eq!(info.player_count, 3);

    // The old connection no longer receives room traffic.
    drain(&mut inboxes[1]);
    reg.route(pid(10), &code("R"), RoomIntent::GetState).await.unwrap();
    settle(&reg, "R").await;
    assert!(!drain(&mut rx).is_empty());
    reg.route(pid(1), &code("R"), RoomIntent::GetState).await.unwrap();
    settle(&reg, "R").await;
    assert!(drain(&mut inboxes[1]).is_empty());
}

#[tokio::test]
async fn test_last_leave_destroys_room() {
    let mut reg = registry();
    let _inboxes = table(&mut reg, "GONE", 2).await;

    reg.leave(pid(1)).await.unwrap();
    assert_eq!(reg.room_count(), 1);
    reg.leave(pid(2)).await.unwrap();
    assert_eq!(reg.room_count(), 0);
    assert!(matches!(
        reg.room_info(&code("GONE")).await,
        Err(RoomError::NotFound(_))
    ));
    assert!(matches!(reg.leave(pid(2)).await, Err(RoomError::NotSeated(_))));
}

#[tokio::test]
async fn test_leave_passes_host() {
    let mut reg = registry();
    let mut inboxes = table(&mut reg, "H", 3).await;
    drain(&mut inboxes[1]);

    reg.leave(pid(1)).await.unwrap();
    let events = drain(&mut inboxes[1]);
    match &events[0] {
        ServerEvent::PlayerLeft { player_id, players } => {
            assert_eq!(*player_id, pid(1));
            assert_eq!(players.len(), 2);
            assert!(players[0].is_host);
            assert_eq!(players[0].id, pid(2));
        }
        other => panic!("expected player_left, got {other:?}"),
    }
}

#[tokio::test]
async fn test_route_rejects_other_room() {
    let mut reg = registry();
    let _a = join(&mut reg, "A", 1, "Alice").await;
    let _b = join(&mut reg, "B", 2, "Bob").await;

    let result = reg.route(pid(1), &code("B"), RoomIntent::GetState).await;
    assert!(matches!(result, Err(RoomError::NotInRoom(..))));
    assert_eq!(result.unwrap_err().code(), 404);
}

#[tokio::test]
async fn test_blank_name_rejected_and_room_cleaned_up() {
    let mut reg = registry();
    let (tx, _rx) = mpsc::unbounded_channel();
    let result = reg.join(code("EMPTY"), pid(1), "  ", tx).await;
    assert!(matches!(result, Err(RoomError::Game(_))));
    assert_eq!(reg.room_count(), 0);
    assert_eq!(reg.player_room(pid(1)), None);
}

// =========================================================================
// Game flow through the actor
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_start_deals_private_roles() {
    let mut reg = registry();
    let mut inboxes = table(&mut reg, "G", 4).await;
    inboxes.iter_mut().for_each(|i| {
        drain(i);
    });

    start(&reg, "G").await;

    let mut mafia = 0;
    for inbox in &mut inboxes {
        let events = drain(inbox);
        assert!(matches!(events[0], ServerEvent::GameStarted));
        let roles: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, ServerEvent::RoleAssigned { .. }))
            .collect();
        assert_eq!(roles.len(), 1, "each player sees only their own role");
        if role_of(&events) == Some(Role::Mafia) {
            mafia += 1;
        }
        assert!(matches!(
            events.last(),
            Some(ServerEvent::PhaseChanged { phase: Phase::Night, round: 1, time_left: 60, .. })
        ));
    }
    assert_eq!(mafia, 1);

    let info = reg.room_info(&code("G")).await.unwrap();
    assert_eq!(info.state, SessionState::Playing);
    assert_eq!(info.time_left, Some(Duration::from_secs(60)));
}

#[tokio::test]
async fn test_rejected_intent_answers_only_the_sender() {
    let mut reg = registry();
    let mut inboxes = table(&mut reg, "E", 4).await;
    inboxes.iter_mut().for_each(|i| {
        drain(i);
    });

    reg.route(pid(2), &code("E"), RoomIntent::Start(GameConfig::default()))
        .await
        .unwrap();
    settle(&reg, "E").await;

    let events = drain(&mut inboxes[1]);
    assert!(matches!(
        events.as_slice(),
        [ServerEvent::Error { code: 403, .. }]
    ));
    assert!(drain(&mut inboxes[0]).is_empty());
    let info = reg.room_info(&code("E")).await.unwrap();
    assert_eq!(info.state, SessionState::Waiting);
}

#[tokio::test(start_paused = true)]
async fn test_night_deadline_advances_phase() {
    let mut reg = registry();
    let mut inboxes = table(&mut reg, "T", 4).await;
    start(&reg, "T").await;
    inboxes.iter_mut().for_each(|i| {
        drain(i);
    });

    tokio::time::sleep(Duration::from_secs(61)).await;
    settle(&reg, "T").await;

    let events = drain(&mut inboxes[0]);
    assert!(matches!(events[0], ServerEvent::NightResults { .. }));
    assert!(matches!(
        events[1],
        ServerEvent::PhaseChanged { phase: Phase::Day, round: 1, time_left: 120, .. }
    ));

    let info = reg.room_info(&code("T")).await.unwrap();
    assert_eq!(info.phase, Phase::Day);
    assert_eq!(info.time_left, Some(Duration::from_secs(119)));
}

#[tokio::test(start_paused = true)]
async fn test_game_state_reports_live_deadline() {
    let mut reg = registry();
    let mut inboxes = table(&mut reg, "S", 4).await;
    start(&reg, "S").await;
    tokio::time::sleep(Duration::from_secs(20)).await;
    drain(&mut inboxes[2]);

    reg.route(pid(3), &code("S"), RoomIntent::GetState).await.unwrap();
    settle(&reg, "S").await;

    let events = drain(&mut inboxes[2]);
    match &events[0] {
        ServerEvent::GameState { time_left, phase, round, .. } => {
            assert_eq!(*time_left, Some(40));
            assert_eq!(*phase, Phase::Night);
            assert_eq!(*round, 1);
        }
        other => panic!("expected game_state, got {other:?}"),
    }
    assert!(role_of(&events).is_some());

    // Asking again did not push the deadline back.
    let info = reg.room_info(&code("S")).await.unwrap();
    assert_eq!(info.time_left, Some(Duration::from_secs(40)));
}

#[tokio::test(start_paused = true)]
async fn test_host_end_phase_rearms_deadline() {
    let mut reg = registry();
    let mut inboxes = table(&mut reg, "X", 4).await;
    start(&reg, "X").await;
    tokio::time::sleep(Duration::from_secs(30)).await;

    let end_night = RoomIntent::EndPhase {
        phase: Some(Phase::Night),
        round: Some(1),
    };
    reg.route(pid(1), &code("X"), end_night.clone()).await.unwrap();
    reg.route(pid(1), &code("X"), end_night).await.unwrap();
    settle(&reg, "X").await;

    let night_results = drain(&mut inboxes[3])
        .into_iter()
        .filter(|e| matches!(e, ServerEvent::NightResults { .. }))
        .count();
    assert_eq!(night_results, 1, "the same night resolves once");

    let info = reg.room_info(&code("X")).await.unwrap();
    assert_eq!(info.phase, Phase::Day);
    assert_eq!(info.time_left, Some(Duration::from_secs(120)));

    // The old night deadline must not resolve the day early.
    tokio::time::sleep(Duration::from_secs(60)).await;
    let info = reg.room_info(&code("X")).await.unwrap();
    assert_eq!(info.phase, Phase::Day);
    assert_eq!(info.round, 1);
}

#[tokio::test(start_paused = true)]
async fn test_full_vote_ends_day_once_and_old_deadline_stays_quiet() {
    let mut reg = registry();
    let mut inboxes = table(&mut reg, "V", 4).await;
    start(&reg, "V").await;

    let roles: Vec<Option<Role>> = inboxes.iter_mut().map(|inbox| role_of(&drain(inbox))).collect();
    let citizen = roles
        .iter()
        .position(|r| *r == Some(Role::Citizen))
        .map(|i| pid(i as u64 + 1))
        .expect("a citizen is dealt");

    let end_night = RoomIntent::EndPhase {
        phase: None,
        round: None,
    };
    reg.route(pid(1), &code("V"), end_night).await.unwrap();
    settle(&reg, "V").await;
    let info = reg.room_info(&code("V")).await.unwrap();
    assert_eq!((info.phase, info.round), (Phase::Day, 1));

    // Vote late in the day so the original day deadline lies ahead.
    tokio::time::sleep(Duration::from_secs(100)).await;
    for id in 1..=4 {
        reg.route(pid(id), &code("V"), RoomIntent::Vote { target: citizen })
            .await
            .unwrap();
    }
    settle(&reg, "V").await;

    let info = reg.room_info(&code("V")).await.unwrap();
    assert_eq!((info.phase, info.round), (Phase::Night, 2));
    assert_eq!(info.time_left, Some(Duration::from_secs(60)));

    // Past where the day deadline was armed; the night deadline is still pending.
    tokio::time::sleep(Duration::from_secs(30)).await;
    let info = reg.room_info(&code("V")).await.unwrap();
    assert_eq!((info.phase, info.round), (Phase::Night, 2));
    assert_eq!(info.time_left, Some(Duration::from_secs(30)));

    let events = drain(&mut inboxes[0]);
    let vote_results = events
        .iter()
        .filter(|e| matches!(e, ServerEvent::VoteResults { .. }))
        .count();
    assert_eq!(vote_results, 1, "the day resolves once");
    let nights_entered = events
        .iter()
        .filter(|e| matches!(e, ServerEvent::PhaseChanged { phase: Phase::Night, .. }))
        .count();
    assert_eq!(nights_entered, 1);
}

#[tokio::test]
async fn test_destroying_room_mid_game() {
    let mut reg = registry();
    let _inboxes = table(&mut reg, "Q", 4).await;
    start(&reg, "Q").await;

    for id in 1..=4 {
        reg.leave(pid(id)).await.unwrap();
    }
    assert_eq!(reg.room_count(), 0);

    // The code is free for a brand new room.
    let _again = join(&mut reg, "Q", 9, "Zed").await;
    let info = reg.room_info(&code("Q")).await.unwrap();
    assert_eq!(info.state, SessionState::Waiting);
    assert_eq!(info.player_count, 1);
}
